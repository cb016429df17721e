//! Error type shared by every launcher component.
//!
//! Variants follow the boot failure taxonomy: a missing executable is not an
//! error at all, everything else ends up here and is logged by the sequencer.

use thiserror::Error;

/// Result alias used throughout uinit.
pub type UinitResult<T> = Result<T, UinitError>;

#[derive(Debug, Error)]
pub enum UinitError {
    /// Configuration could not be read or parsed.
    #[error("config: {0}")]
    Config(String),

    /// Boot plan violates a structural rule.
    #[error("invalid boot plan: {0}")]
    InvalidPlan(String),

    /// Directory or file setup failed.
    #[error("storage: {0}")]
    Storage(String),

    /// Mount syscall failed.
    #[error("mount: {0}")]
    Mount(String),

    /// Executable exists but could not be started.
    #[error("spawn: {0}")]
    Spawn(String),

    /// Process image replacement returned.
    #[error("exec: {0}")]
    Replace(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = UinitError::Spawn("/bbin/dhclient: permission denied".into());
        assert_eq!(err.to_string(), "spawn: /bbin/dhclient: permission denied");

        let err = UinitError::InvalidPlan("exec step 1 is not last".into());
        assert!(err.to_string().starts_with("invalid boot plan"));
    }
}
