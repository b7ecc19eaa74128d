//! Rule set discovery.
//!
//! Walks the rules dir and classifies every file:
//!
//! - `<rules>/_global/**/*.md` → global context documents
//! - any other `<rules>/**/*.md` → a rule document
//!
//! The configuration document is tracked at its fixed location,
//! [`CONFIG_PATH`], whatever the rules dir is.
//!
//! Parse failures are collected, not raised, so every schema error in the
//! rule set is reported together.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::constants::{CONFIG_FILENAME, CONFIG_PATH, GLOBAL_CONTEXT_DIR, MAX_RULE_FILE_SIZE, RULE_EXTENSION};
use crate::errors::{CoreError, ParseError, Result};
use crate::frontmatter::parse_rule;
use crate::paths::{is_within, relative_to, to_forward_slash};
use crate::rule::Rule;

/// How a tracked source participates in the build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// A rule document.
    Rule,
    /// A global context document; every rule depends on it.
    GlobalContext,
    /// The configuration document; every target depends on it.
    Config,
}

/// A file whose state the build tracks across invocations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedSource {
    /// Path relative to the project root, forward-slash separated.
    pub path: String,
    /// Absolute path on disk.
    pub abs_path: PathBuf,
    /// Role in the build.
    pub kind: SourceKind,
}

/// A global context document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextDocument {
    /// Path relative to the project root.
    pub path: String,
    /// Raw markdown.
    pub content: String,
}

/// Everything discovered under the rules dir.
#[derive(Clone, Debug, Default)]
pub struct LoadedRuleSet {
    /// Successfully parsed rules, sorted by source path.
    pub rules: Vec<Rule>,
    /// Documents that failed to parse.
    pub errors: Vec<ParseError>,
    /// Global context documents, sorted by path.
    pub context_documents: Vec<ContextDocument>,
    /// Every tracked source (rules, context documents, config), sorted by path.
    pub sources: Vec<TrackedSource>,
    /// Rules dir relative to the project root.
    pub rules_dir: String,
}

impl LoadedRuleSet {
    /// Project-relative path of the config document, if present.
    pub fn config_path(&self) -> Option<&str> {
        self.sources
            .iter()
            .find(|s| s.kind == SourceKind::Config)
            .map(|s| s.path.as_str())
    }

    /// Find a rule by its project-relative source path.
    pub fn rule_at(&self, project_path: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|r| r.project_path(&self.rules_dir) == project_path)
    }
}

/// Classify a path relative to the rules dir.
pub fn classify(rel_to_rules: &str) -> Option<SourceKind> {
    if rel_to_rules == CONFIG_FILENAME {
        return Some(SourceKind::Config);
    }
    let is_markdown = Path::new(rel_to_rules)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(RULE_EXTENSION));
    if !is_markdown {
        return None;
    }
    if is_within(rel_to_rules, GLOBAL_CONTEXT_DIR) {
        Some(SourceKind::GlobalContext)
    } else {
        Some(SourceKind::Rule)
    }
}

/// Load every rule, context document, and the config document.
///
/// A missing rules dir yields an empty set. Unreadable files are I/O errors;
/// unparsable rule documents become entries in [`LoadedRuleSet::errors`].
pub fn load_rule_set(project_root: &Path, rules_dir: &str) -> Result<LoadedRuleSet> {
    let rules_root = project_root.join(rules_dir);
    let rules_dir = to_forward_slash(Path::new(rules_dir));
    let mut set = LoadedRuleSet {
        rules_dir: rules_dir.clone(),
        ..Default::default()
    };

    let config = project_root.join(CONFIG_PATH);
    if config.is_file() {
        set.sources.push(TrackedSource {
            path: CONFIG_PATH.to_owned(),
            abs_path: config,
            kind: SourceKind::Config,
        });
    }

    if !rules_root.is_dir() {
        debug!(path = %rules_root.display(), "rules dir not found, empty rule set");
        return Ok(set);
    }

    for entry in WalkDir::new(&rules_root).sort_by_file_name() {
        let entry = entry.map_err(|source| CoreError::Walk {
            path: rules_root.clone(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = relative_to(entry.path(), &rules_root);
        let Some(kind) = classify(&rel).filter(|k| *k != SourceKind::Config) else {
            continue;
        };
        let project_rel = if rules_dir.is_empty() {
            rel.clone()
        } else {
            format!("{rules_dir}/{rel}")
        };

        set.sources.push(TrackedSource {
            path: project_rel.clone(),
            abs_path: entry.path().to_path_buf(),
            kind,
        });

        match kind {
            SourceKind::Config => {}
            SourceKind::GlobalContext => {
                let content = read_source(entry.path())?;
                set.context_documents.push(ContextDocument {
                    path: project_rel,
                    content,
                });
            }
            SourceKind::Rule => {
                let size = entry
                    .metadata()
                    .map_err(|e| CoreError::Walk {
                        path: entry.path().to_path_buf(),
                        source: e,
                    })?
                    .len();
                if size > MAX_RULE_FILE_SIZE {
                    warn!(path = %rel, size, "rule document too large");
                    set.errors.push(ParseError::new(
                        rel,
                        format!("file too large: {size} bytes (max {MAX_RULE_FILE_SIZE} bytes)"),
                    ));
                    continue;
                }
                let raw = read_source(entry.path())?;
                match parse_rule(&rel, &raw) {
                    Ok(rule) => set.rules.push(rule),
                    Err(err) => {
                        debug!(error = %err, "rule document failed to parse");
                        set.errors.push(err);
                    }
                }
            }
        }
    }

    set.rules.sort_by(|a, b| a.source_path.cmp(&b.source_path));
    set.sources.sort_by(|a, b| a.path.cmp(&b.path));
    set.context_documents.sort_by(|a, b| a.path.cmp(&b.path));

    debug!(
        rules = set.rules.len(),
        errors = set.errors.len(),
        context = set.context_documents.len(),
        "loaded rule set"
    );
    Ok(set)
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(root: &Path, rel: &str, content: &str) {
        let full = root.join(rel);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    #[test]
    fn classify_paths() {
        assert_eq!(classify("config.json"), Some(SourceKind::Config));
        assert_eq!(classify("_global/project.md"), Some(SourceKind::GlobalContext));
        assert_eq!(classify("api/errors.md"), Some(SourceKind::Rule));
        assert_eq!(classify("api/errors.MD"), Some(SourceKind::Rule));
        assert_eq!(classify("notes.txt"), None);
        assert_eq!(classify("api/config.json"), None);
        assert_eq!(classify("_globalish/x.md"), Some(SourceKind::Rule));
    }

    #[test]
    fn missing_rules_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let set = load_rule_set(tmp.path(), ".rules").unwrap();
        assert!(set.rules.is_empty());
        assert!(set.sources.is_empty());
    }

    #[test]
    fn loads_rules_context_and_config() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), ".rules/config.json", "{}");
        write_file(tmp.path(), ".rules/_global/project.md", "# Project");
        write_file(tmp.path(), ".rules/style.md", "---\nid: style\n---\nTabs.");
        write_file(tmp.path(), ".rules/api/errors.md", "---\nid: api-errors\n---\nUse ?.");

        let set = load_rule_set(tmp.path(), ".rules").unwrap();
        let ids: Vec<_> = set.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["api-errors", "style"]);
        assert_eq!(set.rules[0].source_path, "api/errors.md");
        assert_eq!(set.context_documents.len(), 1);
        assert_eq!(set.context_documents[0].path, ".rules/_global/project.md");
        assert_eq!(set.config_path(), Some(".rules/config.json"));
        assert_eq!(set.sources.len(), 4);
        assert!(set.rule_at(".rules/api/errors.md").is_some());
    }

    #[test]
    fn config_is_tracked_at_fixed_path_with_custom_rules_dir() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), ".rules/config.json", r#"{"rulesDir": "docs/rules"}"#);
        write_file(tmp.path(), "docs/rules/config.json", "{}");
        write_file(tmp.path(), "docs/rules/style.md", "---\nid: style\n---\nTabs.");

        let set = load_rule_set(tmp.path(), "docs/rules").unwrap();
        assert_eq!(set.config_path(), Some(CONFIG_PATH));
        let paths: Vec<_> = set.sources.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec![".rules/config.json", "docs/rules/style.md"]);
    }

    #[test]
    fn parse_errors_are_collected() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), ".rules/bad.md", "---\npriority: 3\n---\n");
        write_file(tmp.path(), ".rules/good.md", "---\nid: good\n---\n");

        let set = load_rule_set(tmp.path(), ".rules").unwrap();
        assert_eq!(set.rules.len(), 1);
        assert_eq!(set.errors.len(), 1);
        assert_eq!(set.errors[0].source_path, "bad.md");
        // Unparsable documents are still tracked sources.
        assert_eq!(set.sources.len(), 2);
    }
}
