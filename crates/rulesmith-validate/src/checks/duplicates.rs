//! Duplicate id detection.

use std::collections::BTreeMap;

use rulesmith_core::Rule;

use crate::issue::{IssueKind, ValidationIssue};

/// One error per member of every id group larger than one.
pub fn check_duplicate_ids(rules: &[Rule]) -> Vec<ValidationIssue> {
    let mut groups: BTreeMap<&str, Vec<&Rule>> = BTreeMap::new();
    for rule in rules {
        groups.entry(rule.id.as_str()).or_default().push(rule);
    }

    let mut issues = Vec::new();
    for (id, members) in groups.into_iter().filter(|(_, m)| m.len() > 1) {
        for rule in &members {
            let siblings: Vec<&str> = members
                .iter()
                .filter(|other| !std::ptr::eq(**other, *rule))
                .map(|other| other.source_path.as_str())
                .collect();
            issues.push(ValidationIssue::new(
                IssueKind::DuplicateId,
                &rule.source_path,
                format!("duplicate id '{id}', also defined in {}", siblings.join(", ")),
            ));
        }
    }
    issues
}
