//! The individual checks. Each is a pure function from rules (and context)
//! to a list of issues; none of them fail.

pub mod cycles;
pub mod duplicates;
pub mod ghosts;
pub mod links;
pub mod tokens;

pub use cycles::check_circular_references;
pub use duplicates::check_duplicate_ids;
pub use ghosts::check_ghost_rules;
pub use links::check_links;
pub use tokens::check_token_limits;

use rulesmith_core::Rule;

/// 1-based document line of a 0-based body line.
pub(crate) fn document_line(rule: &Rule, line_index: usize) -> usize {
    rule.body_line + line_index
}
