//! Aggregate statistics over comparison results.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::comparator::{ComparisonResult, ComparisonStatus};
use crate::schema_object::ObjectType;

/// Status counts and average scores of a group of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTally {
    pub total: usize,
    pub matching: usize,
    pub different: usize,
    pub missing: usize,
    pub extra: usize,
    pub average_completeness: f64,
    pub average_accuracy: f64,
}

impl StatusTally {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ComparisonResult>) -> Self {
        let mut tally = StatusTally::default();
        let mut completeness = 0.0;
        let mut accuracy = 0.0;

        for result in results {
            tally.total += 1;
            match result.status {
                ComparisonStatus::Match => tally.matching += 1,
                ComparisonStatus::Different => tally.different += 1,
                ComparisonStatus::Missing => tally.missing += 1,
                ComparisonStatus::Extra => tally.extra += 1,
            }
            completeness += result.completeness_pct;
            accuracy += result.accuracy_pct;
        }

        if tally.total > 0 {
            tally.average_completeness = completeness / tally.total as f64;
            tally.average_accuracy = accuracy / tally.total as f64;
        }
        tally
    }

    /// Reference objects that exist in the candidate, whether or not they match.
    pub fn found(&self) -> usize {
        self.matching + self.different
    }

    /// Share of reference objects found in the candidate, 0 to 100. With no reference objects
    /// there is nothing to miss, so coverage is 100.
    pub fn coverage_pct(&self) -> f64 {
        let expected = self.found() + self.missing;
        if expected == 0 {
            100.0
        } else {
            self.found() as f64 / expected as f64 * 100.0
        }
    }
}

/// Overall and per-kind statistics of one comparison run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub overall: StatusTally,
    /// Per object kind, in order of first appearance.
    pub by_kind: IndexMap<ObjectType, StatusTally>,
}

impl ComparisonSummary {
    pub fn from_results(results: &[ComparisonResult]) -> Self {
        let mut groups: IndexMap<ObjectType, Vec<&ComparisonResult>> = IndexMap::new();
        for result in results {
            groups.entry(result.kind).or_default().push(result);
        }

        ComparisonSummary {
            overall: StatusTally::from_results(results),
            by_kind: groups
                .into_iter()
                .map(|(kind, group)| (kind, StatusTally::from_results(group)))
                .collect(),
        }
    }

    /// True when every compared object matched.
    pub fn is_clean(&self) -> bool {
        self.overall.matching == self.overall.total
    }
}

/// Results that need attention first: every missing object, and different objects whose
/// completeness is below `threshold`.
pub fn critical_issues(results: &[ComparisonResult], threshold: f64) -> Vec<&ComparisonResult> {
    results
        .iter()
        .filter(|result| match result.status {
            ComparisonStatus::Missing => true,
            ComparisonStatus::Different => result.completeness_pct < threshold,
            ComparisonStatus::Match | ComparisonStatus::Extra => false,
        })
        .collect()
}
