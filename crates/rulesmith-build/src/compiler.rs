//! The per-target compiler seam.
//!
//! A [`TargetCompiler`] turns the loaded rule set into one or more output
//! files for a single target. Compilers call the selector and estimator
//! themselves; the orchestrator only knows about [`OutputFile`]s.

use std::collections::BTreeMap;
use std::sync::Arc;

use rulesmith_core::paths::normalize_relative;
use rulesmith_core::{ContextDocument, Rule};
use rulesmith_select::{SelectOptions, SelectionContext, SelectionResult, select};
use rulesmith_settings::TargetSettings;
use rulesmith_tokens::BudgetMargin;
use thiserror::Error;
use tracing::debug;

/// Errors raised by a single target's compiler.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler could not render its output.
    #[error("{target}: {message}")]
    Render {
        /// Target name.
        target: String,
        /// What went wrong.
        message: String,
    },

    /// An output path is absolute or leaves the project root.
    #[error("{target}: output path escapes the project: {path}")]
    InvalidOutput {
        /// Target name.
        target: String,
        /// Offending path.
        path: String,
    },

    /// No compiler is registered for the target.
    #[error("no compiler registered for target {0}")]
    NoCompiler(String),
}

/// One rendered output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFile {
    /// Destination relative to the project root.
    pub path: String,
    /// Rendered content.
    pub content: String,
    /// Project-relative sources that contributed to this file.
    pub sources: Vec<String>,
}

impl OutputFile {
    /// Output at `path` with `content` and no recorded sources yet.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            sources: Vec::new(),
        }
    }

    /// Record the contributing sources.
    #[must_use]
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }
}

/// Everything a compiler may read.
pub struct CompileInput<'a> {
    /// Target name.
    pub target: &'a str,
    /// The target's settings.
    pub settings: &'a TargetSettings,
    /// Every parsed rule.
    pub rules: &'a [Rule],
    /// Global context documents, sorted by path.
    pub context_documents: &'a [ContextDocument],
    /// Rules dir relative to the project root.
    pub rules_dir: &'a str,
    /// Budget headroom.
    pub margin: BudgetMargin,
    /// Files the glob strategy matches against.
    pub context_files: &'a [String],
}

impl<'a> CompileInput<'a> {
    /// Selector options derived from the target settings.
    pub fn select_options(&self) -> SelectOptions {
        let mut options = SelectOptions::new(self.settings.strategy)
            .with_dirs(self.settings.include_dirs.iter().cloned())
            .with_tags(self.settings.include_tags.iter().cloned())
            .with_always_include(self.settings.always_include.iter().cloned())
            .with_margin(self.margin);
        if let Some(budget) = self.settings.token_budget {
            options = options.with_budget(budget);
        }
        options
    }

    /// Run the selector for this target.
    pub fn select(&self) -> SelectionResult<'a> {
        let context = SelectionContext::with_files(self.context_files.iter().cloned());
        let result = select(self.rules, &self.select_options(), &context);
        debug!(
            target = self.target,
            included = result.included.len(),
            excluded_by_filter = result.excluded_by_filter.len(),
            excluded_by_budget = result.excluded_by_budget.len(),
            tokens = result.total_tokens,
            "selected rules"
        );
        result
    }

    /// Project-relative source path of `rule`.
    pub fn source_of(&self, rule: &Rule) -> String {
        rule.project_path(self.rules_dir)
    }

    /// Project-relative paths of the global context documents.
    pub fn context_sources(&self) -> impl Iterator<Item = String> + '_ {
        self.context_documents.iter().map(|d| d.path.clone())
    }

    /// The output path: the settings override or `default`.
    pub fn output_path(&self, default: &str) -> String {
        self.settings
            .output
            .clone()
            .unwrap_or_else(|| default.to_owned())
    }
}

/// Compiles one target.
pub trait TargetCompiler: Send + Sync {
    /// Target name, as used in the config document.
    fn name(&self) -> &str;

    /// Render every output file of the target.
    fn compile(&self, input: &CompileInput<'_>) -> Result<Vec<OutputFile>, CompileError>;
}

/// Reject absolute or escaping output paths and normalise the rest.
pub fn checked_output_path(target: &str, path: &str) -> Result<String, CompileError> {
    if path.starts_with('/') || path.contains('\\') {
        return Err(CompileError::InvalidOutput {
            target: target.to_owned(),
            path: path.to_owned(),
        });
    }
    match normalize_relative(path) {
        Some(normal) if !normal.is_empty() => Ok(normal),
        _ => Err(CompileError::InvalidOutput {
            target: target.to_owned(),
            path: path.to_owned(),
        }),
    }
}

/// Target name to compiler.
#[derive(Default)]
pub struct CompilerRegistry {
    compilers: BTreeMap<String, Arc<dyn TargetCompiler>>,
}

impl CompilerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compiler, replacing any with the same name.
    pub fn register(&mut self, compiler: Arc<dyn TargetCompiler>) {
        debug!(target = compiler.name(), "compiler registered");
        let _ = self.compilers.insert(compiler.name().to_owned(), compiler);
    }

    /// Look up a compiler.
    pub fn get(&self, name: &str) -> Option<Arc<dyn TargetCompiler>> {
        self.compilers.get(name).cloned()
    }

    /// Whether `name` has a compiler.
    pub fn contains(&self, name: &str) -> bool {
        self.compilers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.compilers.keys().map(String::as_str).collect()
    }

    /// Number of compilers.
    pub fn len(&self) -> usize {
        self.compilers.len()
    }

    /// Whether no compiler is registered.
    pub fn is_empty(&self) -> bool {
        self.compilers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulesmith_core::Strategy;

    struct Echo;

    impl TargetCompiler for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn compile(&self, input: &CompileInput<'_>) -> Result<Vec<OutputFile>, CompileError> {
            let selection = input.select();
            let content = selection.included_ids().join("\n");
            Ok(vec![
                OutputFile::new(input.output_path("ECHO.md"), content)
                    .with_sources(selection.included.iter().map(|r| input.source_of(r))),
            ])
        }
    }

    fn input<'a>(settings: &'a TargetSettings, rules: &'a [Rule]) -> CompileInput<'a> {
        CompileInput {
            target: "echo",
            settings,
            rules,
            context_documents: &[],
            rules_dir: ".rules",
            margin: BudgetMargin::default(),
            context_files: &[],
        }
    }

    #[test]
    fn registry_lookup() {
        let mut registry = CompilerRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(Echo));
        assert!(registry.contains("echo"));
        assert_eq!(registry.names(), vec!["echo"]);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn compiler_sees_target_selection() {
        let settings = TargetSettings {
            strategy: Strategy::Tag,
            include_tags: vec!["api".into()],
            ..Default::default()
        };
        let rules = vec![
            Rule::new("a", "a.md", "A").with_tags(["api"]),
            Rule::new("b", "b.md", "B"),
        ];
        let out = Echo.compile(&input(&settings, &rules)).unwrap();
        assert_eq!(out[0].path, "ECHO.md");
        assert_eq!(out[0].content, "a");
        assert_eq!(out[0].sources, vec![".rules/a.md"]);
    }

    #[test]
    fn output_override() {
        let settings = TargetSettings {
            output: Some("docs/RULES.md".into()),
            ..Default::default()
        };
        assert_eq!(input(&settings, &[]).output_path("ECHO.md"), "docs/RULES.md");
    }

    #[test]
    fn output_paths_stay_inside_project() {
        assert_eq!(checked_output_path("t", "./a/../CLAUDE.md").unwrap(), "CLAUDE.md");
        assert!(checked_output_path("t", "../outside.md").is_err());
        assert!(checked_output_path("t", "/etc/passwd").is_err());
        assert!(checked_output_path("t", "").is_err());
    }
}
