//! Boot plan data model.
//!
//! A [`BootPlan`] is an ordered list of [`BootStep`]s fixed for one boot.
//! List order is the only dependency between steps.

use crate::errors::{UinitError, UinitResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a step is launched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepMode {
    /// Inherit stdio, become session leader, block until exit.
    Foreground,
    /// Stdio captured to files, detached, monitored by a task.
    Background,
    /// Replace this process image. Never returns on success.
    ExecReplace,
}

/// One boot action. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootStep {
    path: PathBuf,
    args: Vec<String>,
    mode: StepMode,
}

impl BootStep {
    /// Create a step. `args` is the full argv including argv[0]; when empty
    /// the executable path is used as argv[0].
    pub fn new(path: impl Into<PathBuf>, args: Vec<String>, mode: StepMode) -> Self {
        let path = path.into();
        let args = if args.is_empty() {
            vec![path.to_string_lossy().into_owned()]
        } else {
            args
        };
        Self { path, args, mode }
    }

    pub fn foreground<S: Into<String>>(
        path: impl Into<PathBuf>,
        args: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(path, args.into_iter().map(Into::into).collect(), StepMode::Foreground)
    }

    pub fn background<S: Into<String>>(
        path: impl Into<PathBuf>,
        args: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(path, args.into_iter().map(Into::into).collect(), StepMode::Background)
    }

    pub fn exec_replace<S: Into<String>>(
        path: impl Into<PathBuf>,
        args: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(path, args.into_iter().map(Into::into).collect(), StepMode::ExecReplace)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full argv, argv[0] first.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn argv0(&self) -> &str {
        &self.args[0]
    }

    /// Arguments after argv[0].
    pub fn trailing_args(&self) -> &[String] {
        &self.args[1..]
    }

    pub fn mode(&self) -> StepMode {
        self.mode
    }
}

/// Serialized form of a step: the `background`/`exec` flag pair.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSpec {
    pub path: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub background: bool,

    #[serde(default)]
    pub exec: bool,
}

impl TryFrom<StepSpec> for BootStep {
    type Error = UinitError;

    fn try_from(spec: StepSpec) -> UinitResult<Self> {
        let mode = match (spec.background, spec.exec) {
            (false, false) => StepMode::Foreground,
            (true, false) => StepMode::Background,
            (false, true) => StepMode::ExecReplace,
            (true, true) => {
                return Err(UinitError::InvalidPlan(format!(
                    "step {} cannot be both background and exec",
                    spec.path
                )));
            }
        };
        Ok(BootStep::new(spec.path, spec.args, mode))
    }
}

impl From<&BootStep> for StepSpec {
    fn from(step: &BootStep) -> Self {
        Self {
            path: step.path.to_string_lossy().into_owned(),
            args: step.args.clone(),
            background: step.mode == StepMode::Background,
            exec: step.mode == StepMode::ExecReplace,
        }
    }
}

/// Ordered, validated sequence of boot steps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootPlan {
    steps: Vec<BootStep>,
}

impl BootPlan {
    /// Validate and build a plan.
    ///
    /// Rejects empty paths and any exec-replace step that is not the final
    /// step, since everything after it would be silently discarded.
    pub fn new(steps: Vec<BootStep>) -> UinitResult<Self> {
        let last = steps.len().saturating_sub(1);
        for (i, step) in steps.iter().enumerate() {
            if step.path.as_os_str().is_empty() {
                return Err(UinitError::InvalidPlan(format!("step {} has an empty path", i + 1)));
            }
            if step.mode == StepMode::ExecReplace && i != last {
                return Err(UinitError::InvalidPlan(format!(
                    "exec step {} ({}) must be the last of {} steps",
                    i + 1,
                    step.path.display(),
                    steps.len()
                )));
            }
        }
        Ok(Self { steps })
    }

    /// Build a plan from serialized step specs.
    pub fn from_specs(specs: Vec<StepSpec>) -> UinitResult<Self> {
        let steps = specs
            .into_iter()
            .map(BootStep::try_from)
            .collect::<UinitResult<Vec<_>>>()?;
        Self::new(steps)
    }

    pub fn steps(&self) -> &[BootStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BootStep> {
        self.steps.iter()
    }
}
