//! Aggregated validation results.

use serde::{Deserialize, Serialize};

use crate::issue::{IssueKind, Severity, ValidationIssue};

/// All issues of one validation run, partitioned by severity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Blocking issues.
    pub errors: Vec<ValidationIssue>,
    /// Advisory issues.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when there are no errors. Warnings never affect validity.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add one issue to the matching bucket.
    pub fn push(&mut self, issue: ValidationIssue) {
        match issue.severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }

    /// Number of issues of `kind`, across both buckets.
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues().filter(|i| i.kind == kind).count()
    }

    /// Errors followed by warnings.
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(&self.warnings)
    }

    /// Sort both buckets by path, line, then kind for stable output.
    pub fn sort(&mut self) {
        let key = |i: &ValidationIssue| (i.source_path.clone(), i.line, i.kind);
        self.errors.sort_by_key(key);
        self.warnings.sort_by_key(key);
    }
}

impl Extend<ValidationIssue> for ValidationReport {
    fn extend<T: IntoIterator<Item = ValidationIssue>>(&mut self, iter: T) {
        for issue in iter {
            self.push(issue);
        }
    }
}
