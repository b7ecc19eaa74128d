//! The rule data model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PRIORITY;
use crate::paths::parent_dir;

/// Glob inferred for rules placed directly in the rules dir.
const ROOT_INFERRED_GLOB: &str = "**/*";

/// One atomic unit of guidance, parsed from a rule document.
///
/// Immutable for the duration of a build and re-created from source on every
/// build. `id` is unique across the rule set; the validator enforces that.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Globally unique identifier.
    pub id: String,
    /// One-line summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form domain label (e.g. `frontend`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// 0–100, higher wins during selection.
    pub priority: u8,
    /// Tag set used by the tag strategy.
    pub tags: BTreeSet<String>,
    /// Always included, ahead of any filtering or budgeting.
    pub always_apply: bool,
    /// Explicit glob patterns. Empty means "infer from directory".
    pub globs: Vec<String>,
    /// Markdown body (frontmatter stripped).
    pub body: String,
    /// Location relative to the rules dir, forward-slash separated.
    pub source_path: String,
    /// 1-based line in the source document where `body` starts.
    pub body_line: usize,
}

impl Rule {
    /// Create a rule with defaults for every optional attribute.
    pub fn new(id: impl Into<String>, source_path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            domain: None,
            priority: DEFAULT_PRIORITY,
            tags: BTreeSet::new(),
            always_apply: false,
            globs: Vec::new(),
            body: body.into(),
            source_path: source_path.into(),
            body_line: 1,
        }
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Add tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Set explicit globs.
    #[must_use]
    pub fn with_globs<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.globs = globs.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the rule as always-apply.
    #[must_use]
    pub fn always(mut self) -> Self {
        self.always_apply = true;
        self
    }

    /// Directory of the source document relative to the rules dir (`""` at the top).
    pub fn source_dir(&self) -> &str {
        parent_dir(&self.source_path)
    }

    /// Source path relative to the project root.
    pub fn project_path(&self, rules_dir: &str) -> String {
        let rules_dir = rules_dir.trim_end_matches('/');
        if rules_dir.is_empty() {
            self.source_path.clone()
        } else {
            format!("{rules_dir}/{}", self.source_path)
        }
    }

    /// Patterns finally used for matching.
    ///
    /// Explicit globs win. Otherwise the rule's directory inside the rules dir
    /// mirrors the project directory it governs:
    ///
    /// ```text
    /// style.md           → ["**/*"]
    /// src/api/errors.md  → ["src/api/**"]
    /// ```
    pub fn effective_globs(&self) -> Vec<String> {
        if !self.globs.is_empty() {
            return self.globs.clone();
        }
        let dir = self.source_dir();
        if dir.is_empty() {
            vec![ROOT_INFERRED_GLOB.to_owned()]
        } else {
            vec![format!("{dir}/**")]
        }
    }

    /// Whether the rule carries at least one of the given tags.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.tags.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let rule = Rule::new("style", "style.md", "Use tabs.");
        assert_eq!(rule.priority, 50);
        assert!(rule.tags.is_empty());
        assert!(!rule.always_apply);
        assert!(rule.globs.is_empty());
    }

    #[test]
    fn effective_globs_prefer_explicit() {
        let rule = Rule::new("ts", "frontend/ts.md", "").with_globs(["**/*.ts"]);
        assert_eq!(rule.effective_globs(), vec!["**/*.ts"]);
    }

    #[test]
    fn effective_globs_inferred_from_directory() {
        let rule = Rule::new("api", "src/api/errors.md", "");
        assert_eq!(rule.effective_globs(), vec!["src/api/**"]);
    }

    #[test]
    fn effective_globs_at_root() {
        let rule = Rule::new("style", "style.md", "");
        assert_eq!(rule.effective_globs(), vec!["**/*"]);
    }

    #[test]
    fn project_path_joins_rules_dir() {
        let rule = Rule::new("api", "src/api.md", "");
        assert_eq!(rule.project_path(".rules"), ".rules/src/api.md");
        assert_eq!(rule.project_path(".rules/"), ".rules/src/api.md");
        assert_eq!(rule.project_path(""), "src/api.md");
    }

    #[test]
    fn tag_membership() {
        let rule = Rule::new("a", "a.md", "").with_tags(["rust", "style"]);
        assert!(rule.has_any_tag(&["go".into(), "rust".into()]));
        assert!(!rule.has_any_tag(&["go".into()]));
        assert!(!rule.has_any_tag(&[]));
    }
}
