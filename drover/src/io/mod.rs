//! Side-effecting operations: filesystem, process execution, terminal input.
//!
//! Everything here is reachable through narrow seams (`AgentInvoker`,
//! `StopPrompt`, `ChecklistStore`) so the loop controller can be driven by
//! scripted collaborators in tests.

use std::path::{Path, PathBuf};

pub mod checklist_store;
pub mod config;
pub mod interrupt;
pub mod invoker;
pub mod process;
pub mod prompt;
pub mod session_log;
pub mod spec_seed;

/// Canonical drover-owned paths within a project directory.
#[derive(Debug, Clone)]
pub struct DroverPaths {
    pub project_dir: PathBuf,
    pub drover_dir: PathBuf,
    pub sessions_dir: PathBuf,
    pub config_path: PathBuf,
}

impl DroverPaths {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let drover_dir = project_dir.join(".drover");
        Self {
            project_dir,
            sessions_dir: drover_dir.join("sessions"),
            config_path: drover_dir.join("config.toml"),
            drover_dir,
        }
    }
}

/// Write `contents` to `path` unless the file already exists.
///
/// Returns true when the file was created. Used for spec seeding, which must
/// never clobber an artifact from an earlier run.
pub(crate) fn write_if_missing(path: &Path, contents: &str) -> anyhow::Result<bool> {
    use anyhow::Context;

    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(true)
}
