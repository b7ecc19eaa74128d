//! Build error types.

use std::path::{Path, PathBuf};

use rulesmith_core::CoreError;
use rulesmith_settings::SettingsError;
use rulesmith_validate::ValidationReport;
use thiserror::Error;

use crate::lock::LockRecord;

/// Process exit code for success.
pub const EXIT_SUCCESS: u8 = 0;
/// Process exit code for a blocking validation or build failure.
pub const EXIT_FAILURE: u8 = 1;
/// Process exit code for an unexpected runtime error.
pub const EXIT_RUNTIME: u8 = 2;

/// Broad error category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Defects in the rule set; fixed by editing rules.
    Structural,
    /// Environment problems; the next run may succeed unchanged.
    Operational,
}

/// Errors that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Filesystem failure at a specific path.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// Another live build holds the lock.
    #[error("build lock held by pid {} on {} since {} ({})", .holder.pid, .holder.host, .holder.acquired_at, .path.display())]
    LockConflict {
        /// Lock file location.
        path: PathBuf,
        /// Current holder.
        holder: LockRecord,
    },

    /// The rule set has blocking errors.
    #[error("validation failed with {} error(s)", .0.errors.len())]
    Validation(Box<ValidationReport>),

    /// A requested target is not configured.
    #[error("unknown target: {0}")]
    UnknownTarget(String),

    /// The configuration document is invalid.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Rule discovery failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A persisted document could not be encoded.
    #[error("failed to encode {what}: {source}")]
    Encode {
        /// Document kind.
        what: &'static str,
        /// Underlying error.
        source: serde_json::Error,
    },
}

impl BuildError {
    /// I/O error at `path`.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Which part of the taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::UnknownTarget(_) | Self::Settings(_) => {
                ErrorCategory::Structural
            }
            Self::Io { .. } | Self::LockConflict { .. } | Self::Core(_) | Self::Encode { .. } => {
                ErrorCategory::Operational
            }
        }
    }

    /// Exit code the CLI should use.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_)
            | Self::LockConflict { .. }
            | Self::UnknownTarget(_)
            | Self::Settings(_) => EXIT_FAILURE,
            Self::Io { .. } | Self::Core(_) | Self::Encode { .. } => EXIT_RUNTIME,
        }
    }
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
