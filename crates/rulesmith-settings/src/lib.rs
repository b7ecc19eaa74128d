//! # rulesmith-settings
//!
//! The configuration document for a rulesmith project.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`RulesmithSettings::default()`]
//! 2. **Project file**: `<project>/.rules/config.json` (deep-merged over defaults)
//! 3. **Environment variables**: `RULESMITH_*` overrides (highest priority)
//!
//! A missing document is not an error. Settings are passed explicitly into
//! the build; there is no global instance.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
