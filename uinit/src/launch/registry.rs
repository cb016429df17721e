//! Background step registry.
//!
//! Maps step index to the monitor task of a background child so operators
//! can query its state later without the sequencer ever blocking on it.

use std::collections::BTreeMap;
use std::process::ExitStatus;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Last known state of a background child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackgroundStatus {
    Running { pid: u32 },
    Exited(ExitStatus),
    WaitFailed(String),
}

/// Monitor task of one background child.
pub(crate) struct BackgroundTask {
    pid: u32,
    handle: Option<JoinHandle<()>>,
    status: watch::Receiver<BackgroundStatus>,
}

impl BackgroundTask {
    pub(super) fn new(
        pid: u32,
        handle: JoinHandle<()>,
        status: watch::Receiver<BackgroundStatus>,
    ) -> Self {
        Self {
            pid,
            handle: Some(handle),
            status,
        }
    }
}

/// Registry of background children, keyed by step index.
#[derive(Clone, Default)]
pub struct BackgroundRegistry {
    tasks: Arc<Mutex<BTreeMap<usize, BackgroundTask>>>,
}

impl BackgroundRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn register(&self, index: usize, task: BackgroundTask) {
        self.tasks.lock().await.insert(index, task);
    }

    /// Current state of the child launched by step `index`.
    pub async fn status(&self, index: usize) -> Option<BackgroundStatus> {
        self.tasks
            .lock()
            .await
            .get(&index)
            .map(|task| task.status.borrow().clone())
    }

    /// PID of the child launched by step `index`.
    pub async fn pid(&self, index: usize) -> Option<u32> {
        self.tasks.lock().await.get(&index).map(|task| task.pid)
    }

    /// Indices of registered steps, ascending.
    pub async fn indices(&self) -> Vec<usize> {
        self.tasks.lock().await.keys().copied().collect()
    }

    /// Await every monitor task not yet awaited. Returns how many were.
    pub async fn wait_all(&self) -> usize {
        let handles: Vec<JoinHandle<()>> = {
            let mut tasks = self.tasks.lock().await;
            tasks.values_mut().filter_map(|t| t.handle.take()).collect()
        };

        let count = handles.len();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "background monitor task failed");
            }
        }
        count
    }
}
