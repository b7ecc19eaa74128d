//! Error types for rule loading and parsing.

use std::path::PathBuf;

use thiserror::Error;

/// A rule document that could not be turned into a [`Rule`](crate::rule::Rule).
///
/// Parse errors are produced before validation and are reported alongside
/// validation issues as schema errors; the validator never re-derives them.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{source_path}{}: {message}", .line.map(|l| format!(":{l}")).unwrap_or_default())]
pub struct ParseError {
    /// Source path relative to the rules dir.
    pub source_path: String,
    /// 1-based line in the source document, when known.
    pub line: Option<usize>,
    /// Human-readable description.
    pub message: String,
}

impl ParseError {
    /// Create a parse error without a line number.
    pub fn new(source_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            line: None,
            message: message.into(),
        }
    }

    /// Attach a 1-based line number.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// Errors raised by the core crate's I/O and glob helpers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Filesystem failure, with the offending path.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being read or scanned.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Directory walk failure.
    #[error("failed to scan {}: {source}", path.display())]
    Walk {
        /// Root of the walk.
        path: PathBuf,
        /// Underlying walkdir error.
        #[source]
        source: walkdir::Error,
    },

    /// A glob pattern could not be compiled.
    #[error("invalid glob pattern '{pattern}': {source}")]
    Glob {
        /// The offending pattern.
        pattern: String,
        /// Underlying globset error.
        #[source]
        source: globset::Error,
    },

    /// A rule document failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl CoreError {
    /// Wrap an I/O error with its path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
