//! Checklist load/restore over `feature_list.json`.
//!
//! The file is owned by the external agent: it creates the checklist during
//! an initializer session and mutates it during coding sessions. The store
//! only classifies what it finds and, when asked, puts a known-good snapshot
//! back. Snapshots keep the raw file bytes so a restore is byte-for-byte.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use jsonschema::{Validator, validator_for};
use serde_json::Value;
use tracing::debug;

use crate::core::checklist::{Checklist, Feature, invariant_violations};

/// File name the agent is instructed to maintain, relative to the project dir.
pub const FEATURE_LIST_FILE: &str = "feature_list.json";

const FEATURE_LIST_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/feature_list.schema.json"
));

static SCHEMA_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    let schema: Value =
        serde_json::from_str(FEATURE_LIST_SCHEMA).expect("embedded schema should be valid JSON");
    validator_for(&schema).expect("embedded schema should compile")
});

/// A checklist read taken at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistSnapshot {
    pub checklist: Checklist,
    /// Exact file contents at snapshot time; `None` when the file was absent.
    pub raw: Option<String>,
}

/// Read/write primitives over the durable checklist file.
#[derive(Debug, Clone)]
pub struct ChecklistStore {
    path: PathBuf,
}

impl ChecklistStore {
    pub fn new(project_dir: &Path) -> Self {
        Self {
            path: project_dir.join(FEATURE_LIST_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and classify the checklist.
    ///
    /// A missing file is `Absent` (a meaningful state, not an error). Content
    /// that fails to parse, fails the schema, or violates checklist
    /// invariants is `Corrupt`. Only genuine I/O failures return `Err`.
    pub fn load(&self) -> Result<ChecklistSnapshot> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(ChecklistSnapshot {
                    checklist: Checklist::Absent,
                    raw: None,
                });
            }
            Err(err) => {
                return Err(err).with_context(|| format!("read {}", self.path.display()));
            }
        };

        let checklist = classify(&self.path, &raw);
        Ok(ChecklistSnapshot {
            checklist,
            raw: Some(raw),
        })
    }

    /// Overwrite the store with a known-good snapshot (temp file + rename).
    pub fn restore(&self, snapshot: &ChecklistSnapshot) -> Result<()> {
        let raw = snapshot
            .raw
            .as_deref()
            .ok_or_else(|| anyhow!("cannot restore from an absent snapshot"))?;
        let parent = self
            .path
            .parent()
            .with_context(|| format!("checklist path missing parent {}", self.path.display()))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, raw)
            .with_context(|| format!("write temp checklist {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("replace checklist {}", self.path.display()))?;
        Ok(())
    }
}

fn classify(path: &Path, raw: &str) -> Checklist {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            debug!(path = %path.display(), err = %err, "checklist is not valid JSON");
            return Checklist::Corrupt;
        }
    };

    let schema_errors: Vec<String> = SCHEMA_VALIDATOR
        .iter_errors(&value)
        .map(|err| err.to_string())
        .collect();
    if !schema_errors.is_empty() {
        debug!(
            path = %path.display(),
            errors = %schema_errors.join("; "),
            "checklist failed schema validation"
        );
        return Checklist::Corrupt;
    }

    let features: Vec<Feature> = match serde_json::from_value(value) {
        Ok(features) => features,
        Err(err) => {
            debug!(path = %path.display(), err = %err, "checklist failed to deserialize");
            return Checklist::Corrupt;
        }
    };

    let violations = invariant_violations(&features);
    if !violations.is_empty() {
        debug!(
            path = %path.display(),
            errors = %violations.join("; "),
            "checklist failed invariants"
        );
        return Checklist::Corrupt;
    }

    Checklist::Present(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{checklist_json, feature};

    #[test]
    fn missing_file_loads_as_absent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ChecklistStore::new(temp.path());
        let snapshot = store.load().expect("load");
        assert_eq!(snapshot.checklist, Checklist::Absent);
        assert_eq!(snapshot.raw, None);
    }

    #[test]
    fn well_formed_file_loads_as_present() {
        let temp = tempfile::tempdir().expect("tempdir");
        let features = vec![feature("a", false), feature("b", true)];
        fs::write(temp.path().join(FEATURE_LIST_FILE), checklist_json(&features))
            .expect("write");

        let store = ChecklistStore::new(temp.path());
        let snapshot = store.load().expect("load");
        assert_eq!(snapshot.checklist, Checklist::Present(features));
        assert!(snapshot.raw.is_some());
    }

    #[test]
    fn unparsable_content_loads_as_corrupt() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join(FEATURE_LIST_FILE), "not json {").expect("write");

        let store = ChecklistStore::new(temp.path());
        let snapshot = store.load().expect("load");
        assert_eq!(snapshot.checklist, Checklist::Corrupt);
        assert_eq!(snapshot.raw.as_deref(), Some("not json {"));
    }

    #[test]
    fn schema_violations_load_as_corrupt() {
        let temp = tempfile::tempdir().expect("tempdir");
        // Missing the required `passes` flag.
        fs::write(
            temp.path().join(FEATURE_LIST_FILE),
            r#"[{"name": "a", "description": "does a"}]"#,
        )
        .expect("write");

        let store = ChecklistStore::new(temp.path());
        let snapshot = store.load().expect("load");
        assert_eq!(snapshot.checklist, Checklist::Corrupt);
    }

    #[test]
    fn duplicate_names_load_as_corrupt() {
        let temp = tempfile::tempdir().expect("tempdir");
        let features = vec![feature("a", false), feature("a", true)];
        fs::write(temp.path().join(FEATURE_LIST_FILE), checklist_json(&features))
            .expect("write");

        let store = ChecklistStore::new(temp.path());
        let snapshot = store.load().expect("load");
        assert_eq!(snapshot.checklist, Checklist::Corrupt);
    }

    #[test]
    fn restore_puts_back_the_exact_bytes() {
        let temp = tempfile::tempdir().expect("tempdir");
        // Idiosyncratic formatting the agent happened to write: restore must
        // preserve it exactly, not re-serialize.
        let original = "[\n  {\"name\":\"a\",   \"description\":\"does a\", \"passes\":false}\n]\n";
        let path = temp.path().join(FEATURE_LIST_FILE);
        fs::write(&path, original).expect("write");

        let store = ChecklistStore::new(temp.path());
        let snapshot = store.load().expect("load");

        fs::write(&path, "[]").expect("clobber");
        store.restore(&snapshot).expect("restore");

        let restored = fs::read_to_string(&path).expect("read back");
        assert_eq!(restored, original);
    }

    #[test]
    fn restore_refuses_absent_snapshots() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ChecklistStore::new(temp.path());
        let absent = store.load().expect("load");
        let err = store.restore(&absent).expect_err("restore should fail");
        assert!(err.to_string().contains("absent snapshot"));
    }
}
