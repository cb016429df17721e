//! Process image replacement.

use std::convert::Infallible;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;

use nix::unistd::execve;
use uinit_shared::errors::{UinitError, UinitResult};
use uinit_shared::plan::BootStep;

use super::Environment;

/// Replace this process with `step`. Only returns on failure.
///
/// Everything not explicitly preserved is discarded by the kernel, including
/// still-running background monitors. Files opened by uinit are close-on-exec.
pub(super) fn exec_replace(step: &BootStep, env: &Environment) -> UinitError {
    match try_exec(step, env) {
        Ok(never) => match never {},
        Err(e) => e,
    }
}

fn try_exec(step: &BootStep, env: &Environment) -> UinitResult<Infallible> {
    let path = CString::new(step.path().as_os_str().as_bytes()).map_err(|e| {
        UinitError::Replace(format!("invalid path {}: {}", step.path().display(), e))
    })?;
    let argv = step
        .args()
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            UinitError::Replace(format!("invalid argument for {}: {}", step.path().display(), e))
        })?;
    let envp = env.to_cstrings()?;

    execve(&path, &argv, &envp).map_err(|e| {
        UinitError::Replace(format!("Failed to exec '{}': {}", step.path().display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_fails() {
        let step = BootStep::exec_replace("/nonexistent-uinit/init", ["init"]);
        let err = exec_replace(&step, &Environment::default());
        assert!(matches!(err, UinitError::Replace(ref m) if m.contains("/nonexistent-uinit/init")));
    }

    #[test]
    fn test_nul_in_argument_fails_before_exec() {
        let step = BootStep::exec_replace("/bin/true", ["true", "bad\0arg"]);
        let err = exec_replace(&step, &Environment::default());
        assert!(matches!(err, UinitError::Replace(ref m) if m.contains("invalid argument")));
    }
}
