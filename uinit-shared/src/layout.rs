//! Filesystem layout of the IO capture directory.
//!
//! Every background step gets its own directory keyed by step index:
//! ```text
//! {root}/                    # /tmp/io
//! ├── 0/
//! │   ├── cmd                # literal executable path
//! │   ├── stdin
//! │   ├── stdout
//! │   └── stderr
//! └── 3/
//!     └── ...
//! ```

use std::path::{Path, PathBuf};

/// File names inside a step capture directory.
pub mod files {
    /// Literal command path, for introspection
    pub const CMD: &str = "cmd";

    /// Child standard input
    pub const STDIN: &str = "stdin";

    /// Child standard output
    pub const STDOUT: &str = "stdout";

    /// Child standard error
    pub const STDERR: &str = "stderr";
}

/// Layout rooted at the IO capture base directory.
#[derive(Clone, Debug)]
pub struct IoCaptureLayout {
    root: PathBuf,
}

impl IoCaptureLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Base directory: {root}
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Step directory: {root}/{index}
    pub fn step_dir(&self, index: usize) -> PathBuf {
        self.root.join(index.to_string())
    }

    /// Command record: {root}/{index}/cmd
    pub fn cmd_file(&self, index: usize) -> PathBuf {
        self.step_dir(index).join(files::CMD)
    }

    pub fn stdin_file(&self, index: usize) -> PathBuf {
        self.step_dir(index).join(files::STDIN)
    }

    pub fn stdout_file(&self, index: usize) -> PathBuf {
        self.step_dir(index).join(files::STDOUT)
    }

    pub fn stderr_file(&self, index: usize) -> PathBuf {
        self.step_dir(index).join(files::STDERR)
    }
}

impl Default for IoCaptureLayout {
    fn default() -> Self {
        Self::new(crate::constants::capture::DEFAULT_DIR)
    }
}
