//! The single ordering step every strategy funnels into.

use std::cmp::Ordering;

use rulesmith_core::Rule;

/// Priority descending, then id ascending.
pub fn compare_rules(a: &Rule, b: &Rule) -> Ordering {
    b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id))
}

/// Sort in selection order. Stable, so equal keys keep input order.
pub fn sort_rules(rules: &mut [&Rule]) {
    rules.sort_by(|a, b| compare_rules(a, b));
}
