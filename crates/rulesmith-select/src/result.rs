//! Selection output.

use std::fmt::Write as _;

use rulesmith_core::Rule;
use serde::Serialize;

/// Why a rule was left out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExclusionReason {
    /// The strategy filter rejected it.
    Filter,
    /// It did not fit in the remaining budget.
    Budget,
}

/// One excluded rule with its reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exclusion {
    /// Rule id.
    pub id: String,
    /// Reason.
    pub reason: ExclusionReason,
    /// Estimated cost of the rule.
    pub tokens: u64,
}

/// Selector output for one target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionResult<'a> {
    /// Included rules, in output order.
    pub included: Vec<&'a Rule>,
    /// Rules the strategy filter rejected, sorted.
    pub excluded_by_filter: Vec<&'a Rule>,
    /// Candidates that did not fit the budget, sorted.
    pub excluded_by_budget: Vec<&'a Rule>,
    /// Estimated tokens of the included rules.
    pub total_tokens: u64,
    /// Budget after the margin, if one applied.
    pub effective_budget: Option<u64>,
}

impl SelectionResult<'_> {
    /// Ids of the included rules, in order.
    pub fn included_ids(&self) -> Vec<&str> {
        self.included.iter().map(|r| r.id.as_str()).collect()
    }

    /// Every exclusion, filter first, each group in selection order.
    pub fn exclusions(&self) -> Vec<Exclusion> {
        let tag = |rules: &[&Rule], reason| {
            rules
                .iter()
                .map(|r| Exclusion {
                    id: r.id.clone(),
                    reason,
                    tokens: crate::select::rule_cost(r),
                })
                .collect::<Vec<_>>()
        };
        let mut out = tag(&self.excluded_by_filter[..], ExclusionReason::Filter);
        out.extend(tag(&self.excluded_by_budget[..], ExclusionReason::Budget));
        out
    }

    /// Human-readable account of what was left out and why.
    pub fn explain(&self) -> String {
        let mut out = format!(
            "included {} rule(s), {} tokens",
            self.included.len(),
            self.total_tokens
        );
        if let Some(budget) = self.effective_budget {
            let _ = write!(out, " of {budget} budget");
        }
        for ex in self.exclusions() {
            let why = match ex.reason {
                ExclusionReason::Filter => "filtered by strategy".to_string(),
                ExclusionReason::Budget => format!("over budget ({} tokens)", ex.tokens),
            };
            let _ = write!(out, "\n  - {}: {why}", ex.id);
        }
        out
    }
}
