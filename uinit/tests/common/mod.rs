#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Scratch directory holding a plan file and the IO capture dir.
pub struct TestContext {
    pub dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn io_dir(&self) -> PathBuf {
        self.dir.path().join("io")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a plan file with no mounts and the given steps.
    pub fn write_plan(&self, steps: serde_json::Value) -> PathBuf {
        let plan = serde_json::json!({
            "mounts": [],
            "steps": steps,
        });
        let path = self.path("plan.json");
        std::fs::write(&path, serde_json::to_vec_pretty(&plan).unwrap())
            .expect("Failed to write plan");
        path
    }

    /// uinit command pointed at `plan` with capture under this context.
    pub fn uinit(&self, plan: &Path) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_uinit"));
        cmd.timeout(Duration::from_secs(30));
        cmd.env("RUST_LOG", "info");
        cmd.arg("--plan").arg(plan);
        cmd.arg("--io-dir").arg(self.io_dir());
        cmd.arg("--skip-mounts");
        cmd
    }
}

/// Position of `needle` in `haystack`, panicking with context if absent.
pub fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{:?} not found in:\n{}", needle, haystack))
}
