//! Typed paths into the run output directory.
//!
//! Centralizing path construction keeps artifact access consistent across
//! commands.
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Append-only log stream shared by every command.
pub const LOG_FILE: &str = "foundry_deployment.log";
/// Serialized deployment report written at the end of `provision`.
pub const SUMMARY_FILE: &str = "foundry_deployment_summary.json";
/// Serialized validation summary written by `provision` and `validate`.
pub const VALIDATION_FILE: &str = "foundry_validation_report.json";
/// One JSON line per command run.
pub const HISTORY_FILE: &str = "foundry_history.jsonl";

/// Convenience wrapper for locating run artifacts.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    root: PathBuf,
}

impl OutputPaths {
    /// Create a new path helper rooted at the output directory.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the output directory when it does not exist yet.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("create output dir {}", self.root.display()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `foundry_deployment.log` path.
    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    /// Return the `foundry_deployment_summary.json` path.
    pub fn summary_path(&self) -> PathBuf {
        self.root.join(SUMMARY_FILE)
    }

    /// Return the `foundry_validation_report.json` path.
    pub fn validation_path(&self) -> PathBuf {
        self.root.join(VALIDATION_FILE)
    }

    /// Return the `foundry_history.jsonl` path.
    pub fn history_path(&self) -> PathBuf {
        self.root.join(HISTORY_FILE)
    }
}
