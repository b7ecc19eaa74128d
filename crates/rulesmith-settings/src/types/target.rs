//! Per-target settings.

use std::collections::BTreeMap;

use rulesmith_core::Strategy;
use serde::{Deserialize, Serialize};

/// Built-in target names.
pub const BUILTIN_TARGETS: [&str; 4] = ["claude", "agents", "copilot", "cursor"];

/// Selection and output settings for one compile target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetSettings {
    /// Whether builds compile this target by default.
    pub enabled: bool,
    /// Selection strategy.
    pub strategy: Strategy,
    /// Nominal token budget. `None` means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_budget: Option<i64>,
    /// Rule ids admitted ahead of the sorted order, bypassing the filter.
    pub always_include: Vec<String>,
    /// Directories (relative to the rules dir) for the directory strategy.
    pub include_dirs: Vec<String>,
    /// Tags for the tag strategy.
    pub include_tags: Vec<String>,
    /// Output path override, relative to the project root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: Strategy::All,
            token_budget: None,
            always_include: Vec::new(),
            include_dirs: Vec::new(),
            include_tags: Vec::new(),
            output: None,
        }
    }
}

impl TargetSettings {
    /// Settings with the given strategy and budget, everything else default.
    pub fn with_strategy(strategy: Strategy, token_budget: Option<i64>) -> Self {
        Self {
            strategy,
            token_budget,
            ..Self::default()
        }
    }
}

/// The compiled-in target table.
pub fn default_targets() -> BTreeMap<String, TargetSettings> {
    BTreeMap::from([
        (
            "claude".to_string(),
            TargetSettings::with_strategy(Strategy::Priority, Some(8000)),
        ),
        (
            "agents".to_string(),
            TargetSettings::with_strategy(Strategy::All, None),
        ),
        (
            "copilot".to_string(),
            TargetSettings::with_strategy(Strategy::Priority, Some(4000)),
        ),
        (
            "cursor".to_string(),
            TargetSettings::with_strategy(Strategy::All, None),
        ),
    ])
}
