//! Kernel command line parsing.
//!
//! `/proc/cmdline` is a single line of whitespace separated parameters,
//! either bare flags or `key=value`. Double quotes group text containing
//! spaces and are stripped.

use std::path::Path;

use uinit_shared::constants::cmdline as cmdline_const;
use uinit_shared::errors::{UinitError, UinitResult};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KernelCmdline {
    params: Vec<(String, Option<String>)>,
}

impl KernelCmdline {
    /// Read and parse `/proc/cmdline`.
    pub fn read() -> UinitResult<Self> {
        Self::read_from(Path::new(cmdline_const::PATH))
    }

    pub fn read_from(path: &Path) -> UinitResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            UinitError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self::parse(&content))
    }

    pub fn parse(line: &str) -> Self {
        let params = split_params(line)
            .into_iter()
            .map(|token| match token.split_once('=') {
                Some((key, value)) => (key.to_string(), Some(value.to_string())),
                None => (token, None),
            })
            .collect();
        Self { params }
    }

    /// Value of the last `key=value` for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Whether `key` appears at all, with or without a value.
    pub fn has(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k == key)
    }

    /// Boot plan file requested via `uinit.plan=`.
    pub fn plan_path(&self) -> Option<&str> {
        self.get(cmdline_const::PLAN_KEY).filter(|v| !v.is_empty())
    }

    /// Tracing filter requested via `uinit.log=`.
    pub fn log_filter(&self) -> Option<&str> {
        self.get(cmdline_const::LOG_KEY).filter(|v| !v.is_empty())
    }
}

fn split_params(line: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    params.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        params.push(current);
    }
    params
}
