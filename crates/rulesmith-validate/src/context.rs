//! Inputs the checks read besides the rules themselves.

use rulesmith_core::ProjectTree;
use rulesmith_core::constants::DEFAULT_RULES_DIR;

/// Share of a budget above which token pressure is reported.
pub const DEFAULT_WARNING_RATIO: f64 = 0.9;

/// A named target budget for the token-limit check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetBudget {
    /// Target name.
    pub target: String,
    /// Nominal budget in tokens.
    pub budget: i64,
}

/// Everything the validator reads, captured up front so checks stay pure.
#[derive(Clone, Debug)]
pub struct ValidationContext {
    /// Rules dir relative to the project root.
    pub rules_dir: String,
    /// Snapshot of project files.
    pub tree: ProjectTree,
    /// Budgets to check token pressure against.
    pub budgets: Vec<TargetBudget>,
    /// Warning threshold as a share of each budget.
    pub warning_ratio: f64,
}

impl ValidationContext {
    /// Context over `tree` with the rules at `rules_dir`.
    pub fn new(rules_dir: impl Into<String>, tree: ProjectTree) -> Self {
        Self {
            rules_dir: rules_dir.into().trim_end_matches('/').to_owned(),
            tree,
            budgets: Vec::new(),
            warning_ratio: DEFAULT_WARNING_RATIO,
        }
    }

    /// Add a target budget.
    #[must_use]
    pub fn with_budget(mut self, target: impl Into<String>, budget: i64) -> Self {
        self.budgets.push(TargetBudget {
            target: target.into(),
            budget,
        });
        self
    }

    /// Override the warning ratio.
    #[must_use]
    pub fn with_warning_ratio(mut self, ratio: f64) -> Self {
        self.warning_ratio = ratio;
        self
    }

    /// Project-relative directory a rule lives in.
    pub(crate) fn rule_dir(&self, source_dir: &str) -> String {
        match (self.rules_dir.is_empty(), source_dir.is_empty()) {
            (true, _) => source_dir.to_owned(),
            (false, true) => self.rules_dir.clone(),
            (false, false) => format!("{}/{source_dir}", self.rules_dir),
        }
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new(DEFAULT_RULES_DIR, ProjectTree::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_dir_joins() {
        let ctx = ValidationContext::new(".rules/", ProjectTree::default());
        assert_eq!(ctx.rules_dir, ".rules");
        assert_eq!(ctx.rule_dir(""), ".rules");
        assert_eq!(ctx.rule_dir("api"), ".rules/api");

        let flat = ValidationContext::new("", ProjectTree::default());
        assert_eq!(flat.rule_dir("api"), "api");
    }

    #[test]
    fn builder() {
        let ctx = ValidationContext::default()
            .with_budget("claude", 8000)
            .with_warning_ratio(0.8);
        assert_eq!(ctx.budgets.len(), 1);
        assert!((ctx.warning_ratio - 0.8).abs() < f64::EPSILON);
    }
}
