//! Dead links, unknown references, and link traversal.
//!
//! Link targets resolve against the directory of the rule document inside
//! the project. A leading `/` resolves from the project root. Anything that
//! climbs above the project root is a traversal error rather than a dead
//! link.

use std::collections::HashSet;

use rulesmith_core::Rule;
use rulesmith_core::markdown::extract_links;
use rulesmith_core::paths::join_relative;
use rulesmith_core::refs::extract_references;

use crate::checks::document_line;
use crate::context::ValidationContext;
use crate::issue::{IssueKind, ValidationIssue};

/// Outcome of resolving one link target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkResolution {
    /// Not a project file link (external URL, mail, anchor, query-only).
    Skipped,
    /// Project-relative path of an existing file or directory.
    Found(String),
    /// Project-relative path that does not exist.
    Missing(String),
    /// Target escapes the project root.
    Escapes,
}

/// Resolve one raw link target written in a document at `doc_dir`.
pub fn resolve_link(target: &str, doc_dir: &str, ctx: &ValidationContext) -> LinkResolution {
    let link = rulesmith_core::markdown::MarkdownLink {
        target: target.to_owned(),
        line_index: 0,
    };
    if link.is_external_or_anchor() {
        return LinkResolution::Skipped;
    }
    let path = link.path_part().replace("%20", " ");
    if path.is_empty() {
        return LinkResolution::Skipped;
    }
    let resolved = match path.strip_prefix('/') {
        Some(from_root) => join_relative("", from_root),
        None => join_relative(doc_dir, &path),
    };
    match resolved {
        None => LinkResolution::Escapes,
        Some(p) if ctx.tree.contains(&p) => LinkResolution::Found(p),
        Some(p) => LinkResolution::Missing(p),
    }
}

/// Check every link and reference marker in every rule body.
pub fn check_links(rules: &[Rule], ctx: &ValidationContext) -> Vec<ValidationIssue> {
    let known: HashSet<&str> = rules.iter().map(|r| r.id.as_str()).collect();
    let mut issues = Vec::new();

    for rule in rules {
        let doc_dir = ctx.rule_dir(rule.source_dir());

        for link in extract_links(&rule.body) {
            let line = document_line(rule, link.line_index);
            match resolve_link(&link.target, &doc_dir, ctx) {
                LinkResolution::Skipped | LinkResolution::Found(_) => {}
                LinkResolution::Missing(path) => issues.push(
                    ValidationIssue::new(
                        IssueKind::DeadLink,
                        &rule.source_path,
                        format!("link target not found: {} (resolved to {path})", link.target),
                    )
                    .at_line(line),
                ),
                LinkResolution::Escapes => issues.push(
                    ValidationIssue::new(
                        IssueKind::PathTraversal,
                        &rule.source_path,
                        format!("link target escapes the project root: {}", link.target),
                    )
                    .at_line(line),
                ),
            }
        }

        for reference in extract_references(&rule.body) {
            if !known.contains(reference.id.as_str()) {
                issues.push(
                    ValidationIssue::new(
                        IssueKind::DeadLink,
                        &rule.source_path,
                        format!("reference to unknown rule '{}'", reference.id),
                    )
                    .at_line(document_line(rule, reference.line_index)),
                );
            }
        }
    }
    issues
}
