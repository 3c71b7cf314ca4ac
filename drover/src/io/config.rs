//! Drover configuration stored under `.drover/config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Drover configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values; the file itself is
/// optional. Loaded once at process start and passed by reference — there is
/// no global config state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DroverConfig {
    pub session: SessionConfig,
    pub tools: ToolsConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Wall-clock budget per agent session in seconds.
    pub timeout_secs: u64,

    /// Maximum agent turns per session, forwarded to the agent CLI.
    pub max_turns: u32,

    /// Budget for the short project-name suggestion call in seconds.
    pub spec_timeout_secs: u64,

    /// Interruptible-wait window between sessions in seconds.
    pub pause_secs: u64,

    /// Truncate captured agent stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolsConfig {
    /// Tools the agent CLI is allowed to use.
    pub allowed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    /// Maximum pending features listed in a progress summary.
    pub pending_display_limit: usize,

    /// Truncate feature names beyond this many characters when rendering.
    pub feature_name_max_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30 * 60,
            max_turns: 100,
            spec_timeout_secs: 60,
            pause_secs: 10,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            allowed: ["Read", "Write", "Edit", "Glob", "Grep", "Bash"]
                .iter()
                .map(|tool| tool.to_string())
                .collect(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            pending_display_limit: 10,
            feature_name_max_length: 500,
        }
    }
}

impl Default for DroverConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            tools: ToolsConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl DroverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.session.timeout_secs == 0 {
            return Err(anyhow!("session.timeout_secs must be > 0"));
        }
        if self.session.max_turns == 0 {
            return Err(anyhow!("session.max_turns must be > 0"));
        }
        if self.session.output_limit_bytes == 0 {
            return Err(anyhow!("session.output_limit_bytes must be > 0"));
        }
        if self.tools.allowed.is_empty()
            || self.tools.allowed.iter().any(|tool| tool.trim().is_empty())
        {
            return Err(anyhow!("tools.allowed must be a non-empty array of tool names"));
        }
        if self.ui.feature_name_max_length == 0 {
            return Err(anyhow!("ui.feature_name_max_length must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DroverConfig::default()`.
pub fn load_config(path: &Path) -> Result<DroverConfig> {
    if !path.exists() {
        let cfg = DroverConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DroverConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &DroverConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, DroverConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let mut cfg = DroverConfig::default();
        cfg.session.pause_secs = 3;
        cfg.ui.pending_display_limit = 5;
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[session]\ntimeout_secs = 600\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.session.timeout_secs, 600);
        assert_eq!(cfg.session.max_turns, SessionConfig::default().max_turns);
        assert_eq!(cfg.tools, ToolsConfig::default());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut cfg = DroverConfig::default();
        cfg.session.timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn blank_tool_names_are_rejected() {
        let mut cfg = DroverConfig::default();
        cfg.tools.allowed = vec!["Read".to_string(), "  ".to_string()];
        assert!(cfg.validate().is_err());
    }
}
