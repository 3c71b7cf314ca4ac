//! Feature checklist model and completeness rules.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One named, described, pass/fail-tracked unit of required functionality.
///
/// `name` and `description` are fixed at creation; only `passes` may change
/// between sessions. Those rules are enforced by [`crate::core::integrity`],
/// not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub description: String,
    pub passes: bool,
}

/// Classification of the on-disk checklist at snapshot time.
///
/// `Corrupt` is treated like `Absent` for completion checks: an unreadable
/// checklist must never count as "done", and must never serve as a baseline
/// that blocks the agent from rewriting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checklist {
    /// The store has never been written.
    Absent,
    /// The store exists but does not parse as a feature checklist.
    Corrupt,
    /// The store holds an ordered list of feature records.
    Present(Vec<Feature>),
}

impl Checklist {
    pub fn features(&self) -> Option<&[Feature]> {
        match self {
            Checklist::Present(features) => Some(features),
            Checklist::Absent | Checklist::Corrupt => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Checklist::Present(_))
    }

    /// True iff the checklist is present, has at least one record, and every
    /// record passes.
    ///
    /// An empty-but-present checklist is deliberately not complete: a
    /// degenerate initializer that wrote `[]` would otherwise end the run as
    /// a vacuous success.
    pub fn is_complete(&self) -> bool {
        match self {
            Checklist::Present(features) => {
                !features.is_empty() && features.iter().all(|f| f.passes)
            }
            Checklist::Absent | Checklist::Corrupt => false,
        }
    }
}

/// Validate structural invariants of a parsed checklist.
///
/// Returns a list of stable error messages (ordered by first occurrence).
/// A checklist that fails these checks is classified as corrupt by the store.
pub fn invariant_violations(features: &[Feature]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for feature in features {
        if feature.name.trim().is_empty() {
            errors.push("feature with empty name".to_string());
            continue;
        }
        if !seen.insert(feature.name.as_str()) {
            errors.push(format!("duplicate feature name '{}'", feature.name));
        }
    }
    errors
}
