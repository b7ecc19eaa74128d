//! # rulesmith-validate
//!
//! Static analysis over a parsed rule set.
//!
//! Five independent checks run over the whole set and every rule body:
//!
//! | Check | Kind | Severity |
//! |---|---|---|
//! | [`checks::check_duplicate_ids`] | `duplicate-id` | error |
//! | [`checks::check_links`] | `dead-link`, `path-traversal` | error |
//! | [`checks::check_ghost_rules`] | `ghost-rule` (and `path-traversal`) | warning |
//! | [`checks::check_circular_references`] | `circular-reference` | error |
//! | [`checks::check_token_limits`] | `token-limit` | warning |
//!
//! All errors are collected; nothing fails fast. The checks never touch
//! the filesystem: links and globs are resolved against the
//! [`rulesmith_core::ProjectTree`] carried by [`ValidationContext`].

#![deny(unsafe_code)]

pub mod checks;
pub mod context;
pub mod issue;
pub mod report;

pub use context::{TargetBudget, ValidationContext};
pub use issue::{IssueKind, Severity, ValidationIssue};
pub use report::ValidationReport;

use rulesmith_core::{LoadedRuleSet, Rule};
use tracing::debug;

/// Run every check and aggregate the results.
pub fn validate(rules: &[Rule], ctx: &ValidationContext) -> ValidationReport {
    let mut report = ValidationReport::new();
    report.extend(checks::check_duplicate_ids(rules));
    report.extend(checks::check_links(rules, ctx));
    report.extend(checks::check_ghost_rules(rules, ctx));
    report.extend(checks::check_circular_references(rules));
    report.extend(checks::check_token_limits(rules, ctx));
    report.sort();
    debug!(
        rules = rules.len(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated rule set"
    );
    report
}

/// Validate a loaded rule set; parse failures become schema errors.
pub fn validate_rule_set(set: &LoadedRuleSet, ctx: &ValidationContext) -> ValidationReport {
    let mut report = validate(&set.rules, ctx);
    report.extend(set.errors.iter().cloned().map(ValidationIssue::from));
    report.sort();
    report
}
