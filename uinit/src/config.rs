//! Launcher configuration.
//!
//! The boot plan is injected at startup rather than compiled into the
//! sequencer. A JSON file looks like:
//!
//! ```json
//! {
//!   "io_dir": "/tmp/io",
//!   "mounts": [{"source": "tmpfs", "target": "/run", "fstype": "tmpfs",
//!               "options": ["rw", "nosuid", "nodev", "mode=755"]}],
//!   "steps": [
//!     {"path": "/bbin/dhclient", "args": ["/bbin/dhclient", "eth0"]},
//!     {"path": "/bbin/rbd", "args": ["/bbin/rbd", "boot"], "exec": true}
//!   ]
//! }
//! ```
//!
//! Without a file the compiled netboot plan is used.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uinit_shared::constants::{capture, process};
use uinit_shared::errors::{UinitError, UinitResult};
use uinit_shared::plan::{BootPlan, StepSpec};

use crate::cmdline::KernelCmdline;
use crate::mount::MountSpec;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitConfig {
    /// Base directory for background step IO capture.
    #[serde(default = "default_io_dir")]
    pub io_dir: PathBuf,

    /// Working directory of every spawned step.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,

    /// Mounted before the first step.
    #[serde(default = "default_mounts")]
    pub mounts: Vec<MountSpec>,

    /// Wait for background steps before an exec step replaces uinit.
    #[serde(default)]
    pub reap_background_before_exec: bool,

    pub steps: Vec<StepSpec>,
}

fn default_io_dir() -> PathBuf {
    PathBuf::from(capture::DEFAULT_DIR)
}

fn default_workdir() -> PathBuf {
    PathBuf::from(process::WORKDIR)
}

fn default_mounts() -> Vec<MountSpec> {
    vec![MountSpec::default()]
}

fn step(path: &str, args: &[&str], exec: bool) -> StepSpec {
    StepSpec {
        path: path.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        background: false,
        exec,
    }
}

/// Netboot plan: settle, load modules, bring up the network, then hand over
/// to the storage attach tool which switches root into the real init.
fn default_steps() -> Vec<StepSpec> {
    vec![
        // give devices a moment to settle
        step("/bbin/sleep", &["/bbin/sleep", "2"], false),
        step("/bbin/modscan", &["modscan", "load"], false),
        step(
            "/bbin/modprobe",
            &["modprobe", "-a", "rbd", "squashfs", "overlay", "af_packet"],
            false,
        ),
        step("/bbin/dhclient", &["/bbin/dhclient", "-ipv6=false", "eth0"], false),
        step(
            "/bbin/rbd",
            &[
                "/bbin/rbd",
                "--verbose",
                "boot",
                "--mkdir",
                "--switch-root=/sbin/init",
            ],
            true,
        ),
    ]
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            io_dir: default_io_dir(),
            workdir: default_workdir(),
            mounts: default_mounts(),
            reap_background_before_exec: false,
            steps: default_steps(),
        }
    }
}

impl InitConfig {
    /// Load from a JSON file. The plan is validated as part of loading.
    pub fn load(path: &Path) -> UinitResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            UinitError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: InitConfig = serde_json::from_str(&content).map_err(|e| {
            UinitError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.plan()?;
        Ok(config)
    }

    /// Validated boot plan.
    pub fn plan(&self) -> UinitResult<BootPlan> {
        BootPlan::from_specs(self.steps.clone())
    }

    /// Pick the configuration for this boot.
    ///
    /// `--plan` wins over `uinit.plan=` on the kernel command line; with
    /// neither, the compiled plan is used. A file that fails to load is
    /// reported in the second return value and the compiled plan is used.
    pub fn resolve(
        cli_plan: Option<&Path>,
        cmdline: &KernelCmdline,
    ) -> (Self, Option<UinitError>) {
        let path = cli_plan
            .map(Path::to_path_buf)
            .or_else(|| cmdline.plan_path().map(PathBuf::from));

        match path {
            None => (Self::default(), None),
            Some(path) => match Self::load(&path) {
                Ok(config) => (config, None),
                Err(e) => (Self::default(), Some(e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uinit_shared::plan::StepMode;

    #[test]
    fn test_default_plan_is_valid() {
        let config = InitConfig::default();
        let plan = config.plan().unwrap();
        assert_eq!(plan.len(), 5);
        assert_eq!(plan.steps()[4].mode(), StepMode::ExecReplace);
        assert_eq!(plan.steps()[1].argv0(), "modscan");
        assert_eq!(config.mounts, vec![MountSpec::default()]);
        assert_eq!(config.io_dir, PathBuf::from("/tmp/io"));
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plan.json");
        std::fs::write(&path, r#"{"steps": [{"path": "/bin/true"}]}"#).unwrap();

        let config = InitConfig::load(&path).unwrap();
        assert_eq!(config.workdir, PathBuf::from("/"));
        assert_eq!(config.mounts.len(), 1);
        assert!(!config.reap_background_before_exec);
        assert_eq!(config.plan().unwrap().steps()[0].args(), &["/bin/true".to_string()]);
    }

    #[test]
    fn test_invalid_plan_is_rejected_on_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plan.json");
        std::fs::write(
            &path,
            r#"{"steps": [{"path": "/sbin/init", "exec": true}, {"path": "/bin/true"}]}"#,
        )
        .unwrap();

        assert!(matches!(
            InitConfig::load(&path),
            Err(UinitError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_resolve_precedence() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = tmp.path().join("cli.json");
        let kernel = tmp.path().join("kernel.json");
        std::fs::write(&cli, r#"{"mounts": [], "steps": [{"path": "/bin/cli"}]}"#).unwrap();
        std::fs::write(&kernel, r#"{"mounts": [], "steps": [{"path": "/bin/kernel"}]}"#).unwrap();
        let cmdline = KernelCmdline::parse(&format!("uinit.plan={}", kernel.display()));

        let (config, err) = InitConfig::resolve(Some(&cli), &cmdline);
        assert!(err.is_none());
        assert_eq!(config.steps[0].path, "/bin/cli");

        let (config, err) = InitConfig::resolve(None, &cmdline);
        assert!(err.is_none());
        assert_eq!(config.steps[0].path, "/bin/kernel");

        let (config, err) = InitConfig::resolve(None, &KernelCmdline::default());
        assert!(err.is_none());
        assert_eq!(config, InitConfig::default());
    }

    #[test]
    fn test_resolve_falls_back_on_bad_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let (config, err) = InitConfig::resolve(Some(&path), &KernelCmdline::default());
        assert!(matches!(err, Some(UinitError::Config(_))));
        assert_eq!(config, InitConfig::default());
    }
}
