//! uinit - minimal PID 1 launcher for diskless netboot images.
//!
//! Runs a fixed, ordered boot plan (module loading, network setup, storage
//! attach) and hands over to the real init by replacing its own process
//! image. Every failure is reported and boot continues: there is nothing
//! above PID 1 to recover.

#[cfg(not(target_os = "linux"))]
compile_error!("uinit is Linux-only; build with a Linux target");

pub mod capture;
pub mod cmdline;
pub mod config;
pub mod events;
pub mod launch;
pub mod mount;
pub mod probe;
pub mod sequencer;

pub use config::InitConfig;
pub use events::{BootEvent, EventSink, MemorySink, SharedSink, TracingSink};
pub use launch::{Environment, LaunchOutcome, Launcher, ProcessLauncher};
pub use sequencer::{Sequencer, SequencerOptions};
