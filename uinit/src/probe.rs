//! Availability prober.
//!
//! Boot images differ by build, so a step whose executable is missing is
//! skipped rather than treated as a failure.

use std::io::ErrorKind;
use std::path::Path;

/// Result of probing a step executable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    /// Attempt the step.
    Present,
    /// Executable does not exist; skip the step.
    Absent,
}

/// Probe `path`.
///
/// Only a definite "not found" skips the step. Other stat errors (e.g.
/// permission denied on a parent directory) still attempt it so the real
/// cause surfaces as a spawn failure.
pub fn probe(path: &Path) -> Availability {
    match std::fs::metadata(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Availability::Absent,
        _ => Availability::Present,
    }
}
