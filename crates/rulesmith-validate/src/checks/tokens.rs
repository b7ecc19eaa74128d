//! Token-limit pressure.

use rulesmith_core::Rule;
use rulesmith_core::constants::CONFIG_FILENAME;
use rulesmith_tokens::estimate_tokens;

use crate::context::ValidationContext;
use crate::issue::{IssueKind, ValidationIssue};

/// Metadata rendered alongside a rule body, as counted for token pressure.
pub fn metadata_text(rule: &Rule) -> String {
    let mut text = format!("id: {}\npriority: {}\n", rule.id, rule.priority);
    if let Some(description) = &rule.description {
        text.push_str(&format!("description: {description}\n"));
    }
    if let Some(domain) = &rule.domain {
        text.push_str(&format!("domain: {domain}\n"));
    }
    if !rule.tags.is_empty() {
        let tags: Vec<&str> = rule.tags.iter().map(String::as_str).collect();
        text.push_str(&format!("tags: {}\n", tags.join(", ")));
    }
    text
}

/// Estimated tokens for a rule body plus its metadata.
pub fn rule_cost_with_metadata(rule: &Rule) -> u64 {
    estimate_tokens(&rule.body) + estimate_tokens(&metadata_text(rule))
}

/// Warn for every target whose budget the full rule set would push past
/// `warning_ratio`. Non-positive budgets are skipped.
pub fn check_token_limits(rules: &[Rule], ctx: &ValidationContext) -> Vec<ValidationIssue> {
    let total: u64 = rules.iter().map(rule_cost_with_metadata).sum();
    let mut issues = Vec::new();
    for budget in ctx.budgets.iter().filter(|b| b.budget > 0) {
        #[allow(clippy::cast_precision_loss)]
        let threshold = ctx.warning_ratio * budget.budget as f64;
        #[allow(clippy::cast_precision_loss)]
        let over = total as f64 > threshold;
        if over {
            issues.push(ValidationIssue::new(
                IssueKind::TokenLimit,
                CONFIG_FILENAME,
                format!(
                    "target '{}': estimated {total} tokens exceeds {:.0}% of budget {}",
                    budget.target,
                    ctx.warning_ratio * 100.0,
                    budget.budget
                ),
            ));
        }
    }
    issues
}
