//! Completion statistics derived from checklist snapshots.
//!
//! Pure: the reporter holds no state and writes nothing. The presentation
//! layer decides how (and whether) to render the result.

use std::collections::HashSet;

use crate::core::checklist::Checklist;

/// Snapshot-derived progress summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub passing: usize,
    pub total: usize,
    /// `None` when no features exist yet ("no checklist yet"), never a NaN.
    pub percent: Option<f64>,
    /// Names passing now that were not passing in the previous snapshot,
    /// sorted for stable output.
    pub newly_passed: Vec<String>,
    /// Names still failing, in checklist order.
    pub pending: Vec<String>,
}

/// Derive a progress report from the current snapshot and the one before it.
pub fn report(after: &Checklist, before: &Checklist) -> ProgressReport {
    let features = after.features().unwrap_or(&[]);
    let previously_passing: HashSet<&str> = before
        .features()
        .unwrap_or(&[])
        .iter()
        .filter(|f| f.passes)
        .map(|f| f.name.as_str())
        .collect();

    let total = features.len();
    let passing = features.iter().filter(|f| f.passes).count();
    let percent = (total > 0).then(|| (passing as f64 / total as f64) * 100.0);

    let mut newly_passed: Vec<String> = features
        .iter()
        .filter(|f| f.passes && !previously_passing.contains(f.name.as_str()))
        .map(|f| f.name.clone())
        .collect();
    newly_passed.sort();

    let pending = features
        .iter()
        .filter(|f| !f.passes)
        .map(|f| f.name.clone())
        .collect();

    ProgressReport {
        passing,
        total,
        percent,
        newly_passed,
        pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::feature;

    #[test]
    fn empty_snapshot_reports_no_percentage() {
        let report = report(&Checklist::Absent, &Checklist::Absent);
        assert_eq!(report.total, 0);
        assert_eq!(report.passing, 0);
        assert_eq!(report.percent, None);
        assert!(report.newly_passed.is_empty());
        assert!(report.pending.is_empty());
    }

    #[test]
    fn two_of_three_passing_reports_expected_numbers() {
        let after = Checklist::Present(vec![
            feature("a", true),
            feature("b", true),
            feature("c", false),
        ]);
        let report = report(&after, &Checklist::Absent);
        assert_eq!(report.passing, 2);
        assert_eq!(report.total, 3);
        let percent = report.percent.expect("percent");
        assert!((percent - 66.666).abs() < 0.01, "got {percent}");
        assert_eq!(report.pending, vec!["c".to_string()]);
    }

    #[test]
    fn newly_passed_is_the_difference_of_passing_sets() {
        let before = Checklist::Present(vec![
            feature("a", true),
            feature("b", false),
            feature("c", false),
        ]);
        let after = Checklist::Present(vec![
            feature("a", true),
            feature("b", true),
            feature("c", false),
            // Added this session, already passing: counts as newly passed.
            feature("d", true),
        ]);
        let report = report(&after, &before);
        assert_eq!(report.newly_passed, vec!["b".to_string(), "d".to_string()]);
    }

    #[test]
    fn regressions_do_not_show_as_newly_passed() {
        let before = Checklist::Present(vec![feature("a", true), feature("b", true)]);
        let after = Checklist::Present(vec![feature("a", true), feature("b", false)]);
        let report = report(&after, &before);
        assert!(report.newly_passed.is_empty());
        assert_eq!(report.pending, vec!["b".to_string()]);
    }
}
