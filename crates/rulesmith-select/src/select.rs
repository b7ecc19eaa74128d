//! Partition, filter, order, and budget.

use rulesmith_core::Rule;
use rulesmith_tokens::estimate_tokens;
use tracing::debug;

use crate::filter::passes;
use crate::options::{SelectOptions, SelectionContext};
use crate::order::sort_rules;
use crate::result::SelectionResult;

/// Estimated token cost of one rule.
pub fn rule_cost(rule: &Rule) -> u64 {
    estimate_tokens(&rule.body)
}

/// Select rules for one target.
///
/// Precedence: `alwaysApply` rules come first and are never filtered or
/// budget-excluded, though their cost is charged before anything else is
/// admitted. Always-include ids come next, bypassing the filter but not
/// the budget. The remaining candidates follow in sorted order. With a
/// budget of zero or less, every candidate is budget-excluded.
pub fn select<'a>(
    rules: &'a [Rule],
    options: &SelectOptions,
    context: &SelectionContext,
) -> SelectionResult<'a> {
    let mut always: Vec<&Rule> = Vec::new();
    let mut pinned: Vec<&Rule> = Vec::new();
    let mut candidates: Vec<&Rule> = Vec::new();
    let mut filtered: Vec<&Rule> = Vec::new();

    for rule in rules {
        if rule.always_apply {
            always.push(rule);
        } else if options.always_include.iter().any(|id| *id == rule.id) {
            pinned.push(rule);
        } else if passes(rule, options, context) {
            candidates.push(rule);
        } else {
            filtered.push(rule);
        }
    }
    sort_rules(&mut always);
    sort_rules(&mut pinned);
    sort_rules(&mut candidates);
    sort_rules(&mut filtered);

    let mut total: u64 = always.iter().map(|r| rule_cost(r)).sum();
    let mut included = always;
    let mut over_budget: Vec<&Rule> = Vec::new();
    let effective_budget = options.effective_budget();

    let queue = pinned.into_iter().chain(candidates);
    match (options.token_budget, effective_budget) {
        (Some(nominal), _) if nominal <= 0 => over_budget.extend(queue),
        (_, Some(budget)) => {
            let mut exhausted = false;
            for rule in queue {
                let cost = rule_cost(rule);
                if !exhausted && total + cost <= budget {
                    total += cost;
                    included.push(rule);
                } else {
                    exhausted = true;
                    over_budget.push(rule);
                }
            }
        }
        _ => {
            for rule in queue {
                total += rule_cost(rule);
                included.push(rule);
            }
        }
    }

    debug!(
        strategy = %options.strategy,
        included = included.len(),
        filtered = filtered.len(),
        over_budget = over_budget.len(),
        tokens = total,
        "selected rules"
    );

    SelectionResult {
        included,
        excluded_by_filter: filtered,
        excluded_by_budget: over_budget,
        total_tokens: total,
        effective_budget,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ExclusionReason;
    use rulesmith_core::Strategy;
    use rulesmith_tokens::BudgetMargin;

    /// A body costing exactly `tokens` (mixed text, 3 chars per token).
    fn body(tokens: usize) -> String {
        "x".repeat(tokens * 3)
    }

    fn rule(id: &str, priority: u8, tokens: usize) -> Rule {
        Rule::new(id, format!("{id}.md"), body(tokens)).with_priority(priority)
    }

    #[test]
    fn tie_break_and_budget_exclusion() {
        let rules = vec![rule("c", 40, 100), rule("b", 80, 100), rule("a", 80, 100)];
        let opts = SelectOptions::new(Strategy::Priority).with_budget(220);
        let result = select(&rules, &opts, &SelectionContext::default());
        assert_eq!(result.included_ids(), vec!["a", "b"]);
        assert_eq!(result.excluded_by_budget.len(), 1);
        assert_eq!(result.excluded_by_budget[0].id, "c");
        assert!(result.excluded_by_filter.is_empty());
        assert_eq!(result.total_tokens, 200);
        assert_eq!(result.effective_budget, Some(209));
    }

    #[test]
    fn greedy_stops_at_first_overflow() {
        // b does not fit; c would, but admission has stopped
        let rules = vec![rule("a", 90, 50), rule("b", 80, 100), rule("c", 70, 10)];
        let opts = SelectOptions::new(Strategy::Priority)
            .with_budget(100)
            .with_margin(BudgetMargin::new(0));
        let result = select(&rules, &opts, &SelectionContext::default());
        assert_eq!(result.included_ids(), vec!["a"]);
        let over: Vec<_> = result.excluded_by_budget.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(over, vec!["b", "c"]);
    }

    #[test]
    fn non_positive_budget_excludes_candidates() {
        let rules = vec![rule("a", 50, 1), rule("b", 50, 1)];
        for budget in [0, -5] {
            let opts = SelectOptions::new(Strategy::All).with_budget(budget);
            let result = select(&rules, &opts, &SelectionContext::default());
            assert!(result.included.is_empty());
            assert_eq!(result.excluded_by_budget.len(), 2);
            assert_eq!(result.total_tokens, 0);
        }
    }

    #[test]
    fn always_apply_is_first_and_unfiltered() {
        let rules = vec![
            Rule::new("base", "base.md", body(10)).with_priority(1).always(),
            Rule::new("api", "src/api/x.md", body(10)),
            Rule::new("web", "web/x.md", body(10)),
        ];
        let opts = SelectOptions::new(Strategy::Directory).with_dirs(["src"]);
        let result = select(&rules, &opts, &SelectionContext::default());
        assert_eq!(result.included_ids(), vec!["base", "api"]);
        assert_eq!(result.excluded_by_filter[0].id, "web");
    }

    #[test]
    fn always_apply_survives_zero_budget() {
        let rules = vec![rule("a", 50, 10).always(), rule("b", 50, 10)];
        let opts = SelectOptions::new(Strategy::Priority).with_budget(0);
        let result = select(&rules, &opts, &SelectionContext::default());
        assert_eq!(result.included_ids(), vec!["a"]);
        assert_eq!(result.excluded_by_budget[0].id, "b");
    }

    #[test]
    fn always_apply_cost_is_charged_first() {
        let rules = vec![rule("base", 10, 60).always(), rule("x", 90, 50)];
        let opts = SelectOptions::new(Strategy::Priority)
            .with_budget(100)
            .with_margin(BudgetMargin::new(0));
        let result = select(&rules, &opts, &SelectionContext::default());
        assert_eq!(result.included_ids(), vec!["base"]);
        assert_eq!(result.excluded_by_budget[0].id, "x");
    }

    #[test]
    fn always_include_bypasses_filter_and_goes_first() {
        let rules = vec![
            Rule::new("sec", "security/x.md", body(10)).with_priority(10),
            Rule::new("api", "src/api/x.md", body(10)).with_priority(90),
        ];
        let opts = SelectOptions::new(Strategy::Directory)
            .with_dirs(["src"])
            .with_always_include(["sec"]);
        let result = select(&rules, &opts, &SelectionContext::default());
        assert_eq!(result.included_ids(), vec!["sec", "api"]);
    }

    #[test]
    fn always_include_is_still_budgeted() {
        let rules = vec![rule("big", 10, 500), rule("small", 90, 10)];
        let opts = SelectOptions::new(Strategy::Priority)
            .with_budget(100)
            .with_always_include(["big"]);
        let result = select(&rules, &opts, &SelectionContext::default());
        assert!(result.included.is_empty());
        assert_eq!(result.excluded_by_budget.len(), 2);
    }

    #[test]
    fn no_budget_admits_everything() {
        let rules = vec![rule("a", 10, 10_000), rule("b", 20, 10_000)];
        let result = select(&rules, &SelectOptions::new(Strategy::All), &SelectionContext::default());
        assert_eq!(result.included_ids(), vec!["b", "a"]);
        assert_eq!(result.total_tokens, 20_000);
        assert!(result.effective_budget.is_none());
    }

    #[test]
    fn explain_lists_reasons() {
        let rules = vec![
            Rule::new("keep", "src/x.md", body(10)).with_priority(90),
            Rule::new("drop", "web/x.md", body(10)),
            Rule::new("big", "src/y.md", body(1000)),
        ];
        let opts = SelectOptions::new(Strategy::Directory)
            .with_dirs(["src"])
            .with_budget(100);
        let result = select(&rules, &opts, &SelectionContext::default());
        let exclusions = result.exclusions();
        assert_eq!(exclusions.len(), 2);
        assert_eq!(exclusions[0].reason, ExclusionReason::Filter);
        assert_eq!(exclusions[1].reason, ExclusionReason::Budget);
        let text = result.explain();
        assert!(text.contains("drop: filtered by strategy"));
        assert!(text.contains("big: over budget (1000 tokens)"));
        assert!(text.starts_with("included 1 rule(s), 10 tokens of 95 budget"));
    }
}
