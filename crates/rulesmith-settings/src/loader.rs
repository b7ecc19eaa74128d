//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`RulesmithSettings::default()`]
//! 2. If `<project>/.rules/config.json` exists, deep-merge it over defaults.
//!    The location is fixed: a configured `rulesDir` does not move it.
//! 3. Apply `RULESMITH_*` environment overrides
//! 4. Validate ranges
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use rulesmith_core::constants::CONFIG_PATH;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::{LOCK_STALE_SECONDS_RANGE, MAX_BUDGET_MARGIN_PERCENT, RulesmithSettings};

/// Env var overriding `budgetMarginPercent`.
pub const ENV_BUDGET_MARGIN: &str = "RULESMITH_BUDGET_MARGIN";
/// Env var overriding `lockStaleSeconds`.
pub const ENV_LOCK_STALE_SECS: &str = "RULESMITH_LOCK_STALE_SECS";
/// Env var overriding `stateDir`.
pub const ENV_STATE_DIR: &str = "RULESMITH_STATE_DIR";

/// Path of the config document for a project.
pub fn settings_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_PATH)
}

/// Load settings for a project with env var overrides.
pub fn load_settings(project_root: &Path) -> Result<RulesmithSettings> {
    load_settings_from_path(&settings_path(project_root))
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or out-of-range values, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<RulesmithSettings> {
    let mut settings = read_merged(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn read_merged(path: &Path) -> Result<RulesmithSettings> {
    let json_err = |source| SettingsError::Json {
        path: path.to_path_buf(),
        source,
    };
    let defaults = serde_json::to_value(RulesmithSettings::default()).map_err(json_err)?;

    let merged = match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!(path = %path.display(), "loading config document");
            let user: Value = serde_json::from_str(&content).map_err(json_err)?;
            deep_merge(defaults, user)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config document not found, using defaults");
            defaults
        }
        Err(source) => {
            return Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_value(merged).map_err(json_err)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `RULESMITH_*` overrides from the process environment.
pub fn apply_env_overrides(settings: &mut RulesmithSettings) {
    apply_overrides_with(settings, |name| std::env::var(name).ok());
}

/// Apply overrides using `lookup` as the environment.
///
/// Invalid values are ignored with a warning (falling back to file/default).
pub fn apply_overrides_with<F>(settings: &mut RulesmithSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_BUDGET_MARGIN) {
        match parse_u8_range(&val, 0, MAX_BUDGET_MARGIN_PERCENT) {
            Some(v) => settings.budget_margin_percent = v,
            None => warn!(key = ENV_BUDGET_MARGIN, value = %val, "invalid env var, ignoring"),
        }
    }
    if let Some(val) = lookup(ENV_LOCK_STALE_SECS) {
        let (min, max) = LOCK_STALE_SECONDS_RANGE;
        match parse_u64_range(&val, min, max) {
            Some(v) => settings.lock_stale_seconds = v,
            None => warn!(key = ENV_LOCK_STALE_SECS, value = %val, "invalid env var, ignoring"),
        }
    }
    if let Some(val) = lookup(ENV_STATE_DIR).filter(|v| !v.trim().is_empty()) {
        settings.state_dir = val;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a `u8` within a range.
pub fn parse_u8_range(val: &str, min: u8, max: u8) -> Option<u8> {
    let n: u8 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = settings_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"targets": {"claude": {"tokenBudget": 8000, "enabled": true}}});
        let source = serde_json::json!({"targets": {"claude": {"tokenBudget": 6000}}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["targets"]["claude"]["tokenBudget"], 6000);
        assert_eq!(merged["targets"]["claude"]["enabled"], true);
    }

    #[test]
    fn merge_array_replace() {
        let merged = deep_merge(
            serde_json::json!({"excludeDirs": ["a", "b"]}),
            serde_json::json!({"excludeDirs": ["c"]}),
        );
        assert_eq!(merged["excludeDirs"], serde_json::json!(["c"]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let merged = deep_merge(serde_json::json!({"a": 1}), serde_json::json!({"a": null}));
        assert_eq!(merged["a"], 1);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let merged = deep_merge(
            serde_json::json!({"a": {"nested": true}}),
            serde_json::json!({"a": 42}),
        );
        assert_eq!(merged["a"], 42);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = read_merged(&settings_path(dir.path())).unwrap();
        apply_overrides_with(&mut settings, env(&[]));
        assert_eq!(settings, RulesmithSettings::default());
    }

    #[test]
    fn partial_document_overrides() {
        let (_dir, path) = write_config(
            r#"{"budgetMarginPercent": 10, "targets": {"claude": {"tokenBudget": 6000}}}"#,
        );
        let settings = read_merged(&path).unwrap();
        assert_eq!(settings.budget_margin_percent, 10);
        assert_eq!(settings.targets["claude"].token_budget, Some(6000));
        assert_eq!(
            settings.targets["claude"].strategy,
            rulesmith_core::Strategy::Priority
        );
        assert_eq!(settings.lock_stale_seconds, 300);
        assert_eq!(settings.targets.len(), 4);
    }

    #[test]
    fn new_target_gets_field_defaults() {
        let (_dir, path) = write_config(
            r#"{"targets": {"windsurf": {"output": ".windsurfrules", "strategy": "tag", "includeTags": ["web"]}}}"#,
        );
        let settings = read_merged(&path).unwrap();
        let t = &settings.targets["windsurf"];
        assert!(t.enabled);
        assert_eq!(t.include_tags, vec!["web"]);
        assert_eq!(t.output.as_deref(), Some(".windsurfrules"));
    }

    #[test]
    fn invalid_json_is_error() {
        let (_dir, path) = write_config("not valid json");
        assert_matches!(load_settings_from_path(&path), Err(SettingsError::Json { .. }));
    }

    #[test]
    fn wrong_type_is_error() {
        let (_dir, path) = write_config(r#"{"budgetMarginPercent": "lots"}"#);
        assert_matches!(read_merged(&path), Err(SettingsError::Json { .. }));
    }

    #[test]
    fn unknown_strategy_is_error() {
        let (_dir, path) = write_config(r#"{"targets": {"claude": {"strategy": "random"}}}"#);
        assert_matches!(read_merged(&path), Err(SettingsError::Json { .. }));
    }

    #[test]
    fn out_of_range_value_is_error() {
        let (_dir, path) = write_config(r#"{"tokenWarningRatio": 2.0}"#);
        assert_matches!(
            load_settings_from_path(&path),
            Err(SettingsError::InvalidValue(_))
        );
    }

    // ── env overrides ───────────────────────────────────────────────

    #[test]
    fn env_overrides_apply() {
        let mut s = RulesmithSettings::default();
        apply_overrides_with(
            &mut s,
            env(&[
                (ENV_BUDGET_MARGIN, "12"),
                (ENV_LOCK_STALE_SECS, "60"),
                (ENV_STATE_DIR, ".cache/rulesmith"),
            ]),
        );
        assert_eq!(s.budget_margin_percent, 12);
        assert_eq!(s.lock_stale_seconds, 60);
        assert_eq!(s.state_dir, ".cache/rulesmith");
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut s = RulesmithSettings::default();
        apply_overrides_with(
            &mut s,
            env(&[
                (ENV_BUDGET_MARGIN, "75"),
                (ENV_LOCK_STALE_SECS, "forever"),
                (ENV_STATE_DIR, "  "),
            ]),
        );
        assert_eq!(s, RulesmithSettings::default());
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_u8_range("50", 0, 50), Some(50));
        assert_eq!(parse_u8_range("51", 0, 50), None);
        assert_eq!(parse_u8_range(" 7 ", 0, 50), Some(7));
        assert_eq!(parse_u64_range("0", 1, 10), None);
        assert_eq!(parse_u64_range("abc", 1, 10), None);
    }
}
