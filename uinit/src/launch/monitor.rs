//! Background exit monitor.
//!
//! One detached task per background step: wait for the child, report the
//! result, publish it on a watch channel. No cancellation, no timeout.

use std::path::PathBuf;

use tokio::process::Child;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::registry::BackgroundStatus;
use crate::events::{BootEvent, SharedSink};

/// Start the monitor for `child`.
pub(super) fn start_monitor(
    mut child: Child,
    index: usize,
    path: PathBuf,
    pid: u32,
    sink: SharedSink,
) -> (JoinHandle<()>, watch::Receiver<BackgroundStatus>) {
    let (tx, rx) = watch::channel(BackgroundStatus::Running { pid });

    let handle = tokio::spawn(async move {
        let status = match child.wait().await {
            Ok(status) => {
                sink.emit(BootEvent::BackgroundExited {
                    index,
                    path,
                    status,
                });
                BackgroundStatus::Exited(status)
            }
            Err(e) => {
                sink.emit(BootEvent::BackgroundWaitFailed {
                    index,
                    path,
                    error: e.to_string(),
                });
                BackgroundStatus::WaitFailed(e.to_string())
            }
        };
        let _ = tx.send(status);
    });

    (handle, rx)
}
