//! Strategy filters.

use rulesmith_core::paths::is_within;
use rulesmith_core::{GlobMatcher, Rule, Strategy};
use tracing::warn;

use crate::options::{SelectOptions, SelectionContext};

/// Whether `rule` passes the strategy filter.
pub fn passes(rule: &Rule, options: &SelectOptions, context: &SelectionContext) -> bool {
    match options.strategy {
        Strategy::Directory => in_dirs(rule, &options.include_dirs),
        Strategy::Glob => matches_context(rule, &context.context_files),
        Strategy::Tag => rule.has_any_tag(&options.include_tags),
        Strategy::Priority | Strategy::All => true,
    }
}

/// Source dir equals or is nested under one of `dirs`.
fn in_dirs(rule: &Rule, dirs: &[String]) -> bool {
    let source_dir = rule.source_dir();
    dirs.iter().any(|d| is_within(source_dir, d))
}

/// Effective globs match at least one context file.
fn matches_context(rule: &Rule, files: &[String]) -> bool {
    match GlobMatcher::new(&rule.effective_globs()) {
        Ok(matcher) => matcher.matches_any(files.iter().map(String::as_str)),
        Err(err) => {
            warn!(rule = %rule.id, error = %err, "invalid glob, rule not selected");
            false
        }
    }
}
