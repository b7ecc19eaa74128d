//! Ghost rules and glob traversal.

use rulesmith_core::paths::normalize_relative;
use rulesmith_core::{GlobMatcher, Rule};

use crate::context::ValidationContext;
use crate::issue::{IssueKind, ValidationIssue};

/// Warn for conditional rules whose effective globs match no project file;
/// error for explicit globs that climb out of the project root.
pub fn check_ghost_rules(rules: &[Rule], ctx: &ValidationContext) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for rule in rules {
        let escaping: Vec<&String> = rule.globs.iter().filter(|g| escapes_root(g)).collect();
        for glob in &escaping {
            issues.push(ValidationIssue::new(
                IssueKind::PathTraversal,
                &rule.source_path,
                format!("glob escapes the project root: {glob}"),
            ));
        }
        if rule.always_apply || !escaping.is_empty() {
            continue;
        }

        let globs = rule.effective_globs();
        let matcher = match GlobMatcher::new(&globs) {
            Ok(m) => m,
            Err(err) => {
                issues.push(ValidationIssue::new(
                    IssueKind::Schema,
                    &rule.source_path,
                    err.to_string(),
                ));
                continue;
            }
        };
        if matcher.count_matches(ctx.tree.files()) == 0 {
            issues.push(ValidationIssue::new(
                IssueKind::GhostRule,
                &rule.source_path,
                format!("globs match no project files: {}", globs.join(", ")),
            ));
        }
    }
    issues
}

fn escapes_root(glob: &str) -> bool {
    normalize_relative(glob).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulesmith_core::ProjectTree;

    fn ctx() -> ValidationContext {
        ValidationContext::new(
            ".rules",
            ProjectTree::from_files(["src/api/users.rs", "web/app.tsx", "README.md"]),
        )
    }

    #[test]
    fn inferred_globs_match() {
        let rules = vec![
            Rule::new("style", "style.md", ""),
            Rule::new("api", "src/api/errors.md", ""),
        ];
        assert!(check_ghost_rules(&rules, &ctx()).is_empty());
    }

    #[test]
    fn ghost_is_warning() {
        let rules = vec![Rule::new("mobile", "mobile/ui.md", "")];
        let issues = check_ghost_rules(&rules, &ctx());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::GhostRule);
        assert!(!issues[0].is_error());
        assert!(issues[0].message.contains("mobile/**"));
    }

    #[test]
    fn always_apply_is_never_ghost() {
        let rules = vec![Rule::new("mobile", "mobile/ui.md", "").always()];
        assert!(check_ghost_rules(&rules, &ctx()).is_empty());
    }

    #[test]
    fn explicit_globs_win() {
        let rules = vec![Rule::new("ts", "mobile/ts.md", "").with_globs(["**/*.tsx"])];
        assert!(check_ghost_rules(&rules, &ctx()).is_empty());
    }

    #[test]
    fn escaping_glob_is_traversal() {
        let rules = vec![Rule::new("x", "x.md", "").with_globs(["../other/**"])];
        let issues = check_ghost_rules(&rules, &ctx());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::PathTraversal);
    }

    #[test]
    fn invalid_glob_is_schema_error() {
        let rules = vec![Rule::new("x", "x.md", "").with_globs(["src/[oops"])];
        let issues = check_ghost_rules(&rules, &ctx());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Schema);
    }
}
