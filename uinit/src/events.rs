//! Boot progress events and the sinks that report them.
//!
//! Boot progress from the sequencer, launcher and background monitors is
//! emitted as [`BootEvent`]s into an injected [`EventSink`]. Production boots use
//! [`TracingSink`], tests capture events with [`MemorySink`].

use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Something that happened during boot. Step indices are zero-based.
#[derive(Clone, Debug, PartialEq)]
pub enum BootEvent {
    /// Launcher started with a plan of `steps` steps.
    Started { steps: usize },
    /// Scratch filesystem mounted.
    Mounted { target: PathBuf },
    /// Mount point creation or mount failed.
    MountFailed { target: PathBuf, error: String },
    /// Launcher setup (e.g. IO capture base directory) failed.
    SetupFailed { error: String },
    /// Step executable exists, launch is about to happen.
    Attempt {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    /// Step executable does not exist.
    Skipped { index: usize, path: PathBuf },
    /// Part of the IO capture record could not be set up.
    CaptureFailed { index: usize, error: String },
    /// Executable exists but did not start.
    SpawnFailed {
        index: usize,
        path: PathBuf,
        error: String,
    },
    /// Foreground step finished.
    Exited {
        index: usize,
        path: PathBuf,
        status: ExitStatus,
    },
    /// Background step spawned and handed to its monitor.
    Detached {
        index: usize,
        path: PathBuf,
        pid: u32,
        capture_dir: PathBuf,
    },
    /// Background step finished.
    BackgroundExited {
        index: usize,
        path: PathBuf,
        status: ExitStatus,
    },
    /// Waiting on a background step failed.
    BackgroundWaitFailed {
        index: usize,
        path: PathBuf,
        error: String,
    },
    /// Background steps waited on before replacing the process image.
    Reaped { count: usize },
    /// Process image replacement is about to happen.
    Replacing { index: usize, path: PathBuf },
    /// Process image replacement returned.
    ReplaceFailed {
        index: usize,
        path: PathBuf,
        error: String,
    },
    /// Plan ran to the end without a successful image replacement.
    Finished,
}

/// Receives boot events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BootEvent);
}

/// Sink shared between the sequencer and detached monitor tasks.
pub type SharedSink = Arc<dyn EventSink>;

/// Renders events through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: BootEvent) {
        match event {
            BootEvent::Started { steps } => info!(steps, "starting uinit"),
            BootEvent::Mounted { target } => {
                info!(mount_point = %target.display(), "mounted scratch filesystem")
            }
            BootEvent::MountFailed { target, error } => {
                error!(mount_point = %target.display(), error = %error, "mount failed")
            }
            BootEvent::SetupFailed { error } => error!(error = %error, "launcher setup failed"),
            BootEvent::Attempt { index, total, path } => {
                info!("step {}/{}: {}", index + 1, total, path.display())
            }
            BootEvent::Skipped { index, path } => {
                info!(step = index + 1, path = %path.display(), "skipping step: no such file")
            }
            BootEvent::CaptureFailed { index, error } => {
                warn!(step = index + 1, error = %error, "io capture setup failed")
            }
            BootEvent::SpawnFailed { index, path, error } => {
                error!(step = index + 1, "command {} failed: {}", path.display(), error)
            }
            BootEvent::Exited {
                index,
                path,
                status,
            } => {
                if status.success() {
                    debug!(step = index + 1, path = %path.display(), "command finished");
                } else {
                    warn!(step = index + 1, "command {} failed: {}", path.display(), status);
                }
            }
            BootEvent::Detached {
                index,
                path,
                pid,
                capture_dir,
            } => info!(
                step = index + 1,
                pid,
                io = %capture_dir.display(),
                "{} running in background",
                path.display()
            ),
            BootEvent::BackgroundExited {
                index,
                path,
                status,
            } => {
                if status.success() {
                    info!(step = index + 1, path = %path.display(), "background command finished");
                } else {
                    warn!(step = index + 1, "command {} failed: {}", path.display(), status);
                }
            }
            BootEvent::BackgroundWaitFailed { index, path, error } => {
                error!(step = index + 1, "command {} failed: {}", path.display(), error)
            }
            BootEvent::Reaped { count } => {
                info!(count, "background commands finished before exec")
            }
            BootEvent::Replacing { index, path } => {
                info!(step = index + 1, path = %path.display(), "replacing process image")
            }
            BootEvent::ReplaceFailed { index, path, error } => {
                error!(step = index + 1, "command {} failed: {}", path.display(), error)
            }
            BootEvent::Finished => info!("uinit exit"),
        }
    }
}

/// Records events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<BootEvent>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<BootEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Indices of attempted steps, in emission order.
    pub fn attempts(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BootEvent::Attempt { index, .. } => Some(index),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: BootEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}
