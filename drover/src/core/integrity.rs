//! Checklist snapshot diff rules.
//!
//! The external agent has write access to the checklist file as part of its
//! normal work, so the before/after diff is the only defense against it
//! deleting inconvenient requirements or rewording them to appear satisfied.
//! Additions of new records and any change to `passes` are always allowed.

use std::collections::HashMap;
use std::fmt;

use crate::core::checklist::{Checklist, Feature};

/// A disallowed mutation detected between two checklist snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// A previously present checklist is now absent or unreadable.
    ChecklistLost,
    /// A feature that existed before is missing from the new snapshot.
    FeatureRemoved { name: String },
    /// A surviving feature's description text changed.
    DescriptionChanged { name: String },
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityViolation::ChecklistLost => write!(f, "checklist deleted or corrupted"),
            IntegrityViolation::FeatureRemoved { name } => write!(f, "feature removed: {name}"),
            IntegrityViolation::DescriptionChanged { name } => {
                write!(f, "description modified: {name}")
            }
        }
    }
}

/// Classify a pair of checklist snapshots.
///
/// Returns the list of violations, empty when the mutation is valid. Results
/// are ordered: removals first, then description changes, each sorted by
/// feature name so reports stay stable across runs.
pub fn diff(before: &Checklist, after: &Checklist) -> Vec<IntegrityViolation> {
    let prev = match before.features() {
        // First creation: absent (or corrupt, treated as absent) may become anything.
        None => return Vec::new(),
        Some(features) => features,
    };

    let next = match after.features() {
        None => return vec![IntegrityViolation::ChecklistLost],
        Some(features) => features,
    };

    let next_index: HashMap<&str, &Feature> =
        next.iter().map(|f| (f.name.as_str(), f)).collect();

    let mut removed = Vec::new();
    let mut reworded = Vec::new();
    for feature in prev {
        match next_index.get(feature.name.as_str()) {
            None => removed.push(feature.name.clone()),
            Some(survivor) => {
                if survivor.description != feature.description {
                    reworded.push(feature.name.clone());
                }
            }
        }
    }
    removed.sort();
    reworded.sort();

    let mut violations = Vec::new();
    violations.extend(
        removed
            .into_iter()
            .map(|name| IntegrityViolation::FeatureRemoved { name }),
    );
    violations.extend(
        reworded
            .into_iter()
            .map(|name| IntegrityViolation::DescriptionChanged { name }),
    );
    violations
}
