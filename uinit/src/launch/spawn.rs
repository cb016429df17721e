//! Foreground and background spawning.

use std::io::IsTerminal;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use uinit_shared::errors::{UinitError, UinitResult};
use uinit_shared::plan::BootStep;

use super::Environment;
use crate::capture::IoCapture;

/// Command with argv, environment and working directory set.
fn base_command(step: &BootStep, env: &Environment, workdir: &Path) -> Command {
    let mut cmd = Command::new(step.path());
    cmd.arg0(step.argv0())
        .args(step.trailing_args())
        .env_clear()
        .envs(env.vars().iter().map(|(k, v)| (k, v)))
        .current_dir(workdir);
    cmd
}

/// Run a step with inherited stdio as a session leader and wait for it.
pub(super) async fn run_foreground(
    step: &BootStep,
    env: &Environment,
    workdir: &Path,
) -> UinitResult<ExitStatus> {
    let mut cmd = base_command(step, env, workdir);
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let claim_tty = std::io::stdin().is_terminal();

    // Set up session and controlling terminal in child
    unsafe {
        cmd.pre_exec(move || {
            nix::unistd::setsid().map_err(std::io::Error::other)?;

            // Best effort: fails when the terminal is already another
            // session's controlling terminal.
            if claim_tty {
                nix::libc::ioctl(0, nix::libc::TIOCSCTTY, 0);
            }

            Ok(())
        });
    }

    let mut child = cmd.spawn().map_err(|e| {
        UinitError::Spawn(format!("Failed to spawn '{}': {}", step.path().display(), e))
    })?;

    child.wait().await.map_err(|e| {
        UinitError::Spawn(format!("Failed to wait for '{}': {}", step.path().display(), e))
    })
}

/// Spawn a step with stdio wired to its capture record. Does not wait.
///
/// The command owning the capture handles is dropped before returning, so
/// the only open copies are the child's.
pub(super) fn spawn_background(
    step: &BootStep,
    env: &Environment,
    workdir: &Path,
    capture: IoCapture,
) -> UinitResult<Child> {
    let IoCapture {
        stdin,
        stdout,
        stderr,
        ..
    } = capture;

    let mut cmd = base_command(step, env, workdir);
    cmd.stdin(stdin.map(Stdio::from).unwrap_or_else(Stdio::null))
        .stdout(stdout.map(Stdio::from).unwrap_or_else(Stdio::null))
        .stderr(stderr.map(Stdio::from).unwrap_or_else(Stdio::null))
        .kill_on_drop(false);

    let child = cmd.spawn().map_err(|e| {
        UinitError::Spawn(format!("Failed to spawn '{}': {}", step.path().display(), e))
    });
    drop(cmd);
    child
}
