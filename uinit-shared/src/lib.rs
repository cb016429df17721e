//! uinit shared - types used by the launcher and by tooling that produces
//! boot plans for it.
//!
//! This crate contains the error type, the boot plan data model and the
//! on-disk layout of the IO capture directory.

pub mod constants;
pub mod errors;
pub mod layout;
pub mod plan;

pub use errors::{UinitError, UinitResult};
pub use layout::IoCaptureLayout;
pub use plan::{BootPlan, BootStep, StepMode, StepSpec};
