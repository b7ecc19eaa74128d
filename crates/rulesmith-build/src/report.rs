//! Build outcome reporting.

use std::fmt;

use rulesmith_validate::ValidationIssue;
use serde::Serialize;

use crate::errors::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::plan::FullRebuild;

/// Steps of one build invocation, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Take the cross-process lock.
    AcquireLock,
    /// Read the previous manifest.
    LoadManifest,
    /// Diff sources against the manifest.
    DetectChanges,
    /// Run the compilers of dirty targets.
    Compile,
    /// Stage and commit outputs.
    WriteTransaction,
    /// Save the new manifest.
    PersistManifest,
    /// Drop the lock.
    ReleaseLock,
}

impl Phase {
    /// Kebab-case name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AcquireLock => "acquire-lock",
            Self::LoadManifest => "load-manifest",
            Self::DetectChanges => "detect-changes",
            Self::Compile => "compile",
            Self::WriteTransaction => "write-transaction",
            Self::PersistManifest => "persist-manifest",
            Self::ReleaseLock => "release-lock",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of a build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildState {
    /// Outputs and manifest were written (or nothing needed writing).
    #[default]
    Committed,
    /// A step failed before commit; nothing was mutated.
    RolledBack,
}

/// A target whose compiler failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
    /// Target name.
    pub target: String,
    /// Rendered error.
    pub error: String,
}

/// What a build did.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    /// Terminal state.
    pub state: BuildState,
    /// Set when every target was rebuilt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_rebuild: Option<FullRebuild>,
    /// Sources new since the last build.
    pub added: Vec<String>,
    /// Sources whose content changed.
    pub changed: Vec<String>,
    /// Sources that disappeared.
    pub deleted: Vec<String>,
    /// Sources touched without edits.
    pub mtime_only: Vec<String>,
    /// Sources invalidated through dependencies.
    pub invalidated: Vec<String>,
    /// Targets that compiled.
    pub compiled: Vec<String>,
    /// Targets that needed no work.
    pub skipped: Vec<String>,
    /// Targets whose compiler failed.
    pub failed: Vec<TargetFailure>,
    /// Outputs written.
    pub written: Vec<String>,
    /// Outputs rendered identically to what is on disk.
    pub unchanged: Vec<String>,
    /// Outputs removed because nothing produces them any more.
    pub removed: Vec<String>,
    /// Temp files of an interrupted run that were cleaned up.
    pub cleaned_temps: Vec<String>,
    /// Whether a stale lock was reclaimed.
    pub reclaimed_lock: bool,
    /// Whether the manifest was saved.
    pub manifest_saved: bool,
    /// Non-blocking validation issues.
    pub warnings: Vec<ValidationIssue>,
}

impl BuildReport {
    /// Committed with every target compiled.
    pub fn is_success(&self) -> bool {
        self.state == BuildState::Committed && self.failed.is_empty()
    }

    /// Exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }

    /// Whether the build wrote or removed any output.
    pub fn touched_outputs(&self) -> bool {
        !(self.written.is_empty() && self.removed.is_empty())
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(reason) = &self.full_rebuild {
            writeln!(f, "full rebuild: {reason}")?;
        }
        writeln!(
            f,
            "sources: {} added, {} changed, {} deleted, {} touched",
            self.added.len(),
            self.changed.len(),
            self.deleted.len(),
            self.mtime_only.len()
        )?;
        if !self.compiled.is_empty() {
            writeln!(f, "compiled: {}", self.compiled.join(", "))?;
        }
        for path in &self.written {
            writeln!(f, "  wrote {path}")?;
        }
        for path in &self.removed {
            writeln!(f, "  removed {path}")?;
        }
        for failure in &self.failed {
            writeln!(f, "  failed {}: {}", failure.target, failure.error)?;
        }
        for warning in &self.warnings {
            writeln!(f, "{warning}")?;
        }
        if self.compiled.is_empty() && self.failed.is_empty() {
            writeln!(f, "up to date")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_sets_exit_code() {
        let mut report = BuildReport::default();
        assert_eq!(report.exit_code(), EXIT_SUCCESS);
        report.failed.push(TargetFailure {
            target: "cursor".into(),
            error: "boom".into(),
        });
        assert!(!report.is_success());
        assert_eq!(report.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn display_summarises() {
        let report = BuildReport {
            full_rebuild: Some(FullRebuild::NoManifest),
            added: vec![".rules/a.md".into()],
            compiled: vec!["claude".into()],
            written: vec!["CLAUDE.md".into()],
            ..Default::default()
        };
        let text = report.to_string();
        assert!(text.contains("full rebuild: no manifest"));
        assert!(text.contains("1 added"));
        assert!(text.contains("wrote CLAUDE.md"));
        assert!(!text.contains("up to date"));
    }

    #[test]
    fn phases_are_kebab_case() {
        assert_eq!(Phase::WriteTransaction.to_string(), "write-transaction");
        assert_eq!(Phase::AcquireLock.as_str(), "acquire-lock");
    }
}
