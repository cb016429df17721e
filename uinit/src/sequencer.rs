//! Boot sequencer.
//!
//! Drives the boot plan strictly in order. Every failure is reported and
//! the next step is attempted; the only early end is a successful
//! exec-replace step, after which this process no longer exists.

use uinit_shared::plan::{BootPlan, StepMode};

use crate::events::{BootEvent, SharedSink};
use crate::launch::{Environment, LaunchOutcome, Launcher};
use crate::mount::{MountSpec, ScratchMount};
use crate::probe::{probe, Availability};

/// Sequencer behaviour outside the plan itself.
#[derive(Clone, Debug, Default)]
pub struct SequencerOptions {
    /// Mounted once, in order, before the first step.
    pub mounts: Vec<MountSpec>,
    /// Wait for background children before an exec-replace step.
    pub reap_background_before_exec: bool,
}

pub struct Sequencer<L: Launcher> {
    plan: BootPlan,
    launcher: L,
    env: Environment,
    sink: SharedSink,
    options: SequencerOptions,
}

impl<L: Launcher> Sequencer<L> {
    pub fn new(
        plan: BootPlan,
        launcher: L,
        env: Environment,
        sink: SharedSink,
        options: SequencerOptions,
    ) -> Self {
        Self {
            plan,
            launcher,
            env,
            sink,
            options,
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Run the whole plan. Returns only if no exec-replace step succeeded.
    pub async fn run(&self) {
        let total = self.plan.len();
        self.sink.emit(BootEvent::Started { steps: total });

        self.bootstrap_mounts();

        if let Err(e) = self.launcher.prepare().await {
            self.sink.emit(BootEvent::SetupFailed {
                error: e.to_string(),
            });
        }

        for (index, step) in self.plan.iter().enumerate() {
            let path = step.path().to_path_buf();

            if probe(&path) == Availability::Absent {
                self.sink.emit(BootEvent::Skipped { index, path });
                continue;
            }

            self.sink.emit(BootEvent::Attempt {
                index,
                total,
                path: path.clone(),
            });

            if step.mode() == StepMode::ExecReplace {
                if self.options.reap_background_before_exec {
                    let count = self.launcher.wait_background().await;
                    self.sink.emit(BootEvent::Reaped { count });
                }
                self.sink.emit(BootEvent::Replacing {
                    index,
                    path: path.clone(),
                });
            }

            let event = match self.launcher.launch(index, step, &self.env).await {
                LaunchOutcome::Exited(status) => BootEvent::Exited {
                    index,
                    path,
                    status,
                },
                LaunchOutcome::SpawnFailed(e) => BootEvent::SpawnFailed {
                    index,
                    path,
                    error: e.to_string(),
                },
                LaunchOutcome::Detached { pid, capture_dir } => BootEvent::Detached {
                    index,
                    path,
                    pid,
                    capture_dir,
                },
                LaunchOutcome::ReplaceFailed(e) => BootEvent::ReplaceFailed {
                    index,
                    path,
                    error: e.to_string(),
                },
            };
            self.sink.emit(event);
        }

        self.sink.emit(BootEvent::Finished);
    }

    fn bootstrap_mounts(&self) {
        for spec in &self.options.mounts {
            let event = match ScratchMount::mount(spec) {
                Ok(()) => BootEvent::Mounted {
                    target: spec.target.clone(),
                },
                Err(e) => BootEvent::MountFailed {
                    target: spec.target.clone(),
                    error: e.to_string(),
                },
            };
            self.sink.emit(event);
        }
    }
}
