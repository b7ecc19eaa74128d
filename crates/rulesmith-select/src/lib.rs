//! # rulesmith-select
//!
//! Chooses which rules a target compiles, in which order.
//!
//! 1. **Partition**: `alwaysApply` rules are set aside and always included.
//! 2. **Filter**: the target's [`Strategy`] keeps the candidates it wants;
//!    ids in the always-include list bypass the filter.
//! 3. **Order**: priority descending, then id ascending.
//! 4. **Budget**: candidates are admitted greedily; the first that does not
//!    fit, and everything after it, is budget-excluded.
//!
//! Selection is pure and never fails.

#![deny(unsafe_code)]

pub mod filter;
pub mod options;
pub mod order;
pub mod result;
pub mod select;

pub use options::{SelectOptions, SelectionContext};
pub use order::{compare_rules, sort_rules};
pub use result::{Exclusion, ExclusionReason, SelectionResult};
pub use rulesmith_core::Strategy;
pub use select::{rule_cost, select};
