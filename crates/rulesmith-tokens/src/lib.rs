//! # rulesmith-tokens
//!
//! Deterministic, content-aware token estimation.
//!
//! Counts are not tokenizer-exact; they only need to be reproducible and
//! close enough to enforce output budgets:
//!
//! 1. **Classification**: text is classified as prose, code, mixed, or CJK
//!    using the pattern tables in [`patterns`].
//! 2. **Estimation**: `tokens = ceil(chars / ratio)` with a per-class ratio.
//! 3. **Budget margin**: a nominal budget is reduced by a percentage before
//!    comparison, reserving headroom for formatting overhead.
//!
//! Everything here is pure and side-effect free.

#![deny(unsafe_code)]

pub mod budget;
pub mod estimator;
pub mod patterns;

pub use budget::{BudgetMargin, DEFAULT_MARGIN_PERCENT, effective_budget};
pub use estimator::{ContentType, TokenEstimate, classify, estimate, estimate_tokens};
