//! Budget margins.
//!
//! A nominal token budget is never compared against estimates directly;
//! the margin reserves headroom for headers and separators added at
//! compile time.

/// Default margin, in percent.
pub const DEFAULT_MARGIN_PERCENT: u8 = 5;

/// Largest accepted margin, in percent.
pub const MAX_MARGIN_PERCENT: u8 = 50;

/// A percentage reduction applied to nominal budgets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetMargin {
    percent: u8,
}

impl Default for BudgetMargin {
    fn default() -> Self {
        Self {
            percent: DEFAULT_MARGIN_PERCENT,
        }
    }
}

impl BudgetMargin {
    /// Build a margin; values above [`MAX_MARGIN_PERCENT`] are clamped.
    pub fn new(percent: u8) -> Self {
        Self {
            percent: percent.min(MAX_MARGIN_PERCENT),
        }
    }

    /// Margin in percent.
    pub fn percent(self) -> u8 {
        self.percent
    }

    /// Apply the margin: `floor(budget * (100 - pct) / 100)`.
    ///
    /// Non-positive budgets come back as zero.
    pub fn apply(self, budget: i64) -> u64 {
        effective_budget(budget, self.percent)
    }
}

/// `floor(budget * (100 - percent) / 100)`, zero for non-positive budgets.
pub fn effective_budget(budget: i64, percent: u8) -> u64 {
    if budget <= 0 {
        return 0;
    }
    let keep = i128::from(100 - percent.min(100));
    let reduced = i128::from(budget) * keep / 100;
    u64::try_from(reduced).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_margin_is_five_percent() {
        assert_eq!(BudgetMargin::default().percent(), 5);
        assert_eq!(BudgetMargin::default().apply(8000), 7600);
        assert_eq!(BudgetMargin::default().apply(150), 142);
    }

    #[test]
    fn non_positive_budget_is_zero() {
        assert_eq!(effective_budget(0, 5), 0);
        assert_eq!(effective_budget(-10, 5), 0);
    }

    #[test]
    fn zero_margin_is_identity() {
        assert_eq!(effective_budget(123, 0), 123);
    }

    #[test]
    fn margin_is_clamped() {
        assert_eq!(BudgetMargin::new(90).percent(), MAX_MARGIN_PERCENT);
    }

    #[test]
    fn large_budget_does_not_overflow() {
        assert!(effective_budget(i64::MAX, 5) > 0);
    }

    proptest! {
        #[test]
        fn never_exceeds_nominal(b in 1i64..10_000_000, p in 0u8..=50) {
            let e = effective_budget(b, p);
            prop_assert!(e <= b.unsigned_abs());
            prop_assert_eq!(e, b.unsigned_abs() * u64::from(100 - p) / 100);
        }
    }
}
