//! Validation issue types.

use std::fmt;

use rulesmith_core::ParseError;
use serde::{Deserialize, Serialize};

/// Whether an issue blocks compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks compilation.
    Error,
    /// Reported, never blocking.
    Warning,
}

/// What an issue is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// Two or more rules share an id.
    DuplicateId,
    /// A link or reference points at nothing.
    DeadLink,
    /// Rules reference each other in a loop.
    CircularReference,
    /// A link or glob escapes the project root.
    PathTraversal,
    /// The rule document failed to parse.
    Schema,
    /// A rule's globs match no project file.
    GhostRule,
    /// Estimated usage is close to a target budget.
    TokenLimit,
}

impl IssueKind {
    /// Kebab-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateId => "duplicate-id",
            Self::DeadLink => "dead-link",
            Self::CircularReference => "circular-reference",
            Self::PathTraversal => "path-traversal",
            Self::Schema => "schema",
            Self::GhostRule => "ghost-rule",
            Self::TokenLimit => "token-limit",
        }
    }

    /// Severity every issue of this kind carries.
    pub const fn severity(self) -> Severity {
        match self {
            Self::GhostRule | Self::TokenLimit => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding of the validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// Error or warning.
    pub severity: Severity,
    /// Issue category.
    pub kind: IssueKind,
    /// Human-readable description.
    pub message: String,
    /// Document the issue belongs to, relative to the rules dir.
    pub source_path: String,
    /// 1-based line, where derivable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ValidationIssue {
    /// Create an issue; severity follows from the kind.
    pub fn new(kind: IssueKind, source_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            message: message.into(),
            source_path: source_path.into(),
            line: None,
        }
    }

    /// Attach a line number.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Whether this issue blocks compilation.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{label}[{}] {}", self.kind, self.source_path)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl From<ParseError> for ValidationIssue {
    fn from(err: ParseError) -> Self {
        let issue = Self::new(IssueKind::Schema, err.source_path, err.message);
        match err.line {
            Some(line) => issue.at_line(line),
            None => issue,
        }
    }
}
