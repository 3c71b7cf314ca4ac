//! Idempotent seeding of specification artifacts into the project directory.
//!
//! A spec seed is written exactly once, before the first initializing
//! session, and left untouched on every later run — the agent may have
//! annotated it.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::io::write_if_missing;

/// Application spec read by the (plain) initializer session.
pub const APP_SPEC_FILE: &str = "app_spec.md";

/// Enhancement spec read by the enhancement-initializer session.
pub const ENHANCEMENT_SPEC_FILE: &str = "enhancement_spec.md";

/// Seed the application spec. Returns the path when a file was created.
pub fn seed_app_spec(project_dir: &Path, contents: &str) -> Result<Option<PathBuf>> {
    seed(project_dir.join(APP_SPEC_FILE), contents)
}

/// Seed the enhancement spec. Returns the path when a file was created.
pub fn seed_enhancement_spec(project_dir: &Path, contents: &str) -> Result<Option<PathBuf>> {
    seed(project_dir.join(ENHANCEMENT_SPEC_FILE), contents)
}

fn seed(path: PathBuf, contents: &str) -> Result<Option<PathBuf>> {
    if write_if_missing(&path, contents)? {
        debug!(path = %path.display(), "seeded spec artifact");
        return Ok(Some(path));
    }
    debug!(path = %path.display(), "spec artifact already present, leaving untouched");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn seeds_once_and_never_overwrites() {
        let temp = tempfile::tempdir().expect("tempdir");
        let created = seed_app_spec(temp.path(), "original spec").expect("seed");
        assert!(created.is_some());

        let again = seed_app_spec(temp.path(), "different spec").expect("seed again");
        assert!(again.is_none());

        let contents = fs::read_to_string(temp.path().join(APP_SPEC_FILE)).expect("read");
        assert_eq!(contents, "original spec");
    }

    #[test]
    fn app_and_enhancement_seeds_are_distinct_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        seed_app_spec(temp.path(), "app").expect("seed app");
        seed_enhancement_spec(temp.path(), "more").expect("seed enhancement");
        assert!(temp.path().join(APP_SPEC_FILE).exists());
        assert!(temp.path().join(ENHANCEMENT_SPEC_FILE).exists());
    }
}
