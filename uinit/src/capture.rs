//! IO capture directories for background steps.
//!
//! Each background step gets `{io_dir}/{index}/` holding the literal command
//! path in `cmd` plus the files wired to the child's stdin, stdout and stderr.
//! Setup is best effort: every failure is reported back to the caller and
//! whatever handles did open are still used.

use std::fs::{DirBuilder, File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use uinit_shared::constants::capture::MODE;
use uinit_shared::errors::{UinitError, UinitResult};
use uinit_shared::layout::IoCaptureLayout;

/// Open stream files for one background step.
///
/// Handles are moved into the child's stdio at spawn time; a `None` handle
/// means that stream could not be opened.
#[derive(Debug)]
pub struct IoCapture {
    pub dir: PathBuf,
    pub stdin: Option<File>,
    pub stdout: Option<File>,
    pub stderr: Option<File>,
}

/// Creates per-step capture directories under a base directory.
#[derive(Clone, Debug)]
pub struct IoCaptureManager {
    layout: IoCaptureLayout,
}

impl IoCaptureManager {
    pub fn new(layout: IoCaptureLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &IoCaptureLayout {
        &self.layout
    }

    /// Create the base directory (idempotent).
    pub fn prepare(&self) -> UinitResult<()> {
        DirBuilder::new()
            .recursive(true)
            .mode(MODE)
            .create(self.layout.root())
            .map_err(|e| {
                UinitError::Storage(format!(
                    "Failed to create io dir {}: {}",
                    self.layout.root().display(),
                    e
                ))
            })
    }

    /// Create the capture record for step `index` running `command`.
    ///
    /// Returns the record together with every sub-operation that failed.
    pub fn create(&self, index: usize, command: &Path) -> (IoCapture, Vec<UinitError>) {
        let mut errors = Vec::new();
        let dir = self.layout.step_dir(index);

        if let Err(e) = DirBuilder::new().mode(MODE).create(&dir) {
            errors.push(UinitError::Storage(format!(
                "Failed to create {}: {}",
                dir.display(),
                e
            )));
        }

        if let Err(e) = write_command(&self.layout.cmd_file(index), command) {
            errors.push(e);
        }

        let stdin = collect(open_input(&self.layout.stdin_file(index)), &mut errors);
        let stdout = collect(open_output(&self.layout.stdout_file(index)), &mut errors);
        let stderr = collect(open_output(&self.layout.stderr_file(index)), &mut errors);

        (
            IoCapture {
                dir,
                stdin,
                stdout,
                stderr,
            },
            errors,
        )
    }
}

fn collect<T>(result: UinitResult<T>, errors: &mut Vec<UinitError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn write_command(path: &Path, command: &Path) -> UinitResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(MODE)
        .open(path)
        .map_err(|e| storage_error(path, e))?;
    file.write_all(command.as_os_str().as_encoded_bytes())
        .map_err(|e| storage_error(path, e))
}

/// Read-only, created if missing.
fn open_input(path: &Path) -> UinitResult<File> {
    OpenOptions::new()
        .read(true)
        .custom_flags(nix::libc::O_CREAT)
        .mode(MODE)
        .open(path)
        .map_err(|e| storage_error(path, e))
}

/// Write-only, created if missing.
fn open_output(path: &Path) -> UinitResult<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .mode(MODE)
        .open(path)
        .map_err(|e| storage_error(path, e))
}

fn storage_error(path: &Path, e: std::io::Error) -> UinitError {
    UinitError::Storage(format!("Failed to open {}: {}", path.display(), e))
}
