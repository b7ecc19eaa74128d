//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`
//! so a config document only needs the fields it changes.

mod target;

pub use target::*;

use std::collections::BTreeMap;

use rulesmith_core::constants::{DEFAULT_EXCLUDE_DIRS, DEFAULT_RULES_DIR, DEFAULT_STATE_DIR};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Largest accepted budget margin, in percent.
pub const MAX_BUDGET_MARGIN_PERCENT: u8 = 50;

/// Accepted lock staleness window, in seconds.
pub const LOCK_STALE_SECONDS_RANGE: (u64, u64) = (1, 86_400);

/// Root settings type for a rulesmith project.
///
/// ```json
/// {
///   "budgetMarginPercent": 10,
///   "targets": { "claude": { "tokenBudget": 6000 } }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RulesmithSettings {
    /// Rules dir, relative to the project root.
    pub rules_dir: String,
    /// Manifest and lock dir, relative to the project root.
    pub state_dir: String,
    /// Percentage withheld from every token budget.
    pub budget_margin_percent: u8,
    /// Age after which a build lock is considered abandoned.
    pub lock_stale_seconds: u64,
    /// Share of a target budget above which the token-limit warning fires.
    pub token_warning_ratio: f64,
    /// Extra directory names skipped when scanning the project tree.
    pub exclude_dirs: Vec<String>,
    /// Target name to target settings.
    pub targets: BTreeMap<String, TargetSettings>,
}

impl Default for RulesmithSettings {
    fn default() -> Self {
        Self {
            rules_dir: DEFAULT_RULES_DIR.to_string(),
            state_dir: DEFAULT_STATE_DIR.to_string(),
            budget_margin_percent: 5,
            lock_stale_seconds: 300,
            token_warning_ratio: 0.9,
            exclude_dirs: Vec::new(),
            targets: default_targets(),
        }
    }
}

impl RulesmithSettings {
    /// Reject values that would make a build meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.budget_margin_percent > MAX_BUDGET_MARGIN_PERCENT {
            return Err(SettingsError::InvalidValue(format!(
                "budgetMarginPercent must be at most {MAX_BUDGET_MARGIN_PERCENT}, got {}",
                self.budget_margin_percent
            )));
        }
        let (min, max) = LOCK_STALE_SECONDS_RANGE;
        if !(min..=max).contains(&self.lock_stale_seconds) {
            return Err(SettingsError::InvalidValue(format!(
                "lockStaleSeconds must be within {min}..={max}, got {}",
                self.lock_stale_seconds
            )));
        }
        if !(self.token_warning_ratio > 0.0 && self.token_warning_ratio <= 1.0) {
            return Err(SettingsError::InvalidValue(format!(
                "tokenWarningRatio must be within (0, 1], got {}",
                self.token_warning_ratio
            )));
        }
        if self.rules_dir.trim().is_empty() || self.state_dir.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "rulesDir and stateDir must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Directory names skipped by the project tree scan: built-ins, the
    /// state dir, then configured extras.
    pub fn scan_excludes(&self) -> Vec<String> {
        let mut out: Vec<String> = DEFAULT_EXCLUDE_DIRS.iter().map(|s| (*s).to_string()).collect();
        for extra in std::iter::once(&self.state_dir).chain(&self.exclude_dirs) {
            if !out.contains(extra) {
                out.push(extra.clone());
            }
        }
        out
    }

    /// Names of enabled targets, sorted.
    pub fn enabled_targets(&self) -> Vec<&str> {
        self.targets
            .iter()
            .filter(|(_, t)| t.enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Settings for one target.
    pub fn target(&self, name: &str) -> Option<&TargetSettings> {
        self.targets.get(name)
    }
}
