//! Process launcher.
//!
//! Starts a boot step in one of three modes:
//!
//! - **Foreground** (spawn.rs): inherited stdio, new session, blocks until exit
//! - **Background** (spawn.rs + monitor.rs): captured stdio, detached, a
//!   monitor task waits for exit and reports it
//! - **ExecReplace** (replace.rs): `execve` over this process, never returns
//!   on success
//!
//! Background children are tracked in the registry (registry.rs) so their
//! state can be queried without blocking the sequencer.

mod monitor;
pub mod registry;
mod replace;
mod spawn;

use std::ffi::{CString, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::process::ExitStatus;

use async_trait::async_trait;
use uinit_shared::errors::{UinitError, UinitResult};
use uinit_shared::plan::{BootStep, StepMode};

use crate::capture::IoCaptureManager;
use crate::events::{BootEvent, SharedSink};
use registry::{BackgroundRegistry, BackgroundTask};

pub use registry::BackgroundStatus;

/// Environment snapshot forwarded unmodified to every step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Environment {
    vars: Vec<(OsString, OsString)>,
}

impl Environment {
    /// Snapshot the current process environment.
    pub fn capture() -> Self {
        Self::from_vars(std::env::vars_os())
    }

    pub fn from_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        Self {
            vars: vars.into_iter().collect(),
        }
    }

    pub fn vars(&self) -> &[(OsString, OsString)] {
        &self.vars
    }

    /// `KEY=VALUE` strings for `execve`.
    pub fn to_cstrings(&self) -> UinitResult<Vec<CString>> {
        self.vars
            .iter()
            .map(|(k, v)| {
                let mut entry = Vec::with_capacity(k.len() + v.len() + 1);
                entry.extend_from_slice(k.as_bytes());
                entry.push(b'=');
                entry.extend_from_slice(v.as_bytes());
                CString::new(entry).map_err(|e| {
                    UinitError::Replace(format!(
                        "environment variable {} contains NUL: {}",
                        k.to_string_lossy(),
                        e
                    ))
                })
            })
            .collect()
    }
}

/// What happened to a launched step (when control came back at all).
#[derive(Debug)]
pub enum LaunchOutcome {
    /// Foreground step ran to completion.
    Exited(ExitStatus),
    /// Step could not be started or waited on.
    SpawnFailed(UinitError),
    /// Background step is running under a monitor task.
    Detached { pid: u32, capture_dir: PathBuf },
    /// `execve` returned.
    ReplaceFailed(UinitError),
}

/// Launches boot steps.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// One-time setup before the first step.
    async fn prepare(&self) -> UinitResult<()> {
        Ok(())
    }

    /// Launch `step` (plan position `index`) with environment `env`.
    async fn launch(&self, index: usize, step: &BootStep, env: &Environment) -> LaunchOutcome;

    /// Wait for every background step launched so far. Returns how many
    /// were waited on.
    async fn wait_background(&self) -> usize {
        0
    }
}

/// Launches steps as real processes.
pub struct ProcessLauncher {
    workdir: PathBuf,
    capture: IoCaptureManager,
    registry: BackgroundRegistry,
    sink: SharedSink,
}

impl ProcessLauncher {
    pub fn new(workdir: impl Into<PathBuf>, capture: IoCaptureManager, sink: SharedSink) -> Self {
        Self {
            workdir: workdir.into(),
            capture,
            registry: BackgroundRegistry::new(),
            sink,
        }
    }

    /// Background children launched so far.
    pub fn registry(&self) -> &BackgroundRegistry {
        &self.registry
    }

    async fn launch_background(
        &self,
        index: usize,
        step: &BootStep,
        env: &Environment,
    ) -> LaunchOutcome {
        let (capture, errors) = self.capture.create(index, step.path());
        for error in errors {
            self.sink.emit(BootEvent::CaptureFailed {
                index,
                error: error.to_string(),
            });
        }

        let capture_dir = capture.dir.clone();
        let child = match spawn::spawn_background(step, env, &self.workdir, capture) {
            Ok(child) => child,
            Err(e) => return LaunchOutcome::SpawnFailed(e),
        };

        let pid = child.id().unwrap_or_default();
        let (handle, status) = monitor::start_monitor(
            child,
            index,
            step.path().to_path_buf(),
            pid,
            self.sink.clone(),
        );
        self.registry
            .register(index, BackgroundTask::new(pid, handle, status))
            .await;

        LaunchOutcome::Detached { pid, capture_dir }
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn prepare(&self) -> UinitResult<()> {
        self.capture.prepare()
    }

    async fn launch(&self, index: usize, step: &BootStep, env: &Environment) -> LaunchOutcome {
        match step.mode() {
            StepMode::Foreground => {
                match spawn::run_foreground(step, env, &self.workdir).await {
                    Ok(status) => LaunchOutcome::Exited(status),
                    Err(e) => LaunchOutcome::SpawnFailed(e),
                }
            }
            StepMode::Background => self.launch_background(index, step, env).await,
            StepMode::ExecReplace => LaunchOutcome::ReplaceFailed(replace::exec_replace(step, env)),
        }
    }

    async fn wait_background(&self) -> usize {
        self.registry.wait_all().await
    }
}
