//! Selection inputs.

use rulesmith_core::Strategy;
use rulesmith_tokens::BudgetMargin;

/// Per-target selection policy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Filtering strategy.
    pub strategy: Strategy,
    /// Dirs for [`Strategy::Directory`], relative to the rules dir.
    pub include_dirs: Vec<String>,
    /// Tags for [`Strategy::Tag`].
    pub include_tags: Vec<String>,
    /// Nominal budget. `None` admits every candidate.
    pub token_budget: Option<i64>,
    /// Ids admitted first and exempt from the filter.
    pub always_include: Vec<String>,
    /// Headroom withheld from the budget.
    pub margin: BudgetMargin,
}

impl SelectOptions {
    /// Options for `strategy` with no budget.
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Set the nominal budget.
    #[must_use]
    pub fn with_budget(mut self, budget: i64) -> Self {
        self.token_budget = Some(budget);
        self
    }

    /// Set include dirs.
    #[must_use]
    pub fn with_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Set include tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the always-include list.
    #[must_use]
    pub fn with_always_include<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.always_include = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set the budget margin.
    #[must_use]
    pub fn with_margin(mut self, margin: BudgetMargin) -> Self {
        self.margin = margin;
        self
    }

    /// Budget after the margin, if any.
    pub fn effective_budget(&self) -> Option<u64> {
        self.token_budget.map(|b| self.margin.apply(b))
    }
}

/// Runtime inputs that are not policy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionContext {
    /// Project-relative files the glob strategy matches against.
    pub context_files: Vec<String>,
}

impl SelectionContext {
    /// Context with the given files.
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            context_files: files.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_budget_applies_margin() {
        let opts = SelectOptions::new(Strategy::Priority).with_budget(1000);
        assert_eq!(opts.effective_budget(), Some(950));
        assert_eq!(SelectOptions::default().effective_budget(), None);
        let opts = opts.with_margin(BudgetMargin::new(0));
        assert_eq!(opts.effective_budget(), Some(1000));
    }
}
