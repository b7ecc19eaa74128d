//! Package-level constants and fixed project locations.

/// Current version of rulesmith (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "rulesmith";

/// Default rules directory, relative to the project root.
pub const DEFAULT_RULES_DIR: &str = ".rules";

/// Directory (inside the rules dir) holding global context documents.
pub const GLOBAL_CONTEXT_DIR: &str = "_global";

/// Configuration document file name.
pub const CONFIG_FILENAME: &str = "config.json";

/// Project-relative path of the configuration document.
///
/// Fixed regardless of `rulesDir`, which the document itself configures.
pub const CONFIG_PATH: &str = ".rules/config.json";

/// Default state directory for the manifest and lock file. Never tracked.
pub const DEFAULT_STATE_DIR: &str = ".rulesmith";

/// Rule document extension.
pub const RULE_EXTENSION: &str = "md";

/// Maximum size of a single rule document.
pub const MAX_RULE_FILE_SIZE: u64 = 1024 * 1024;

/// Default priority for rules that do not declare one.
pub const DEFAULT_PRIORITY: u8 = 50;

/// Highest accepted priority.
pub const MAX_PRIORITY: u8 = 100;

/// Directories skipped when scanning the project tree.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "dist",
    "build",
    "coverage",
    "__pycache__",
    DEFAULT_STATE_DIR,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_semver() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert_eq!(parts.len(), 3, "VERSION must be semver (MAJOR.MINOR.PATCH)");
        for part in parts {
            let _: u32 = part.parse().expect("each semver segment must be a number");
        }
    }

    #[test]
    fn state_dir_is_excluded_from_scans() {
        assert!(DEFAULT_EXCLUDE_DIRS.contains(&DEFAULT_STATE_DIR));
    }

    #[test]
    fn config_lives_in_default_rules_dir() {
        assert_eq!(CONFIG_PATH, format!("{DEFAULT_RULES_DIR}/{CONFIG_FILENAME}"));
    }

    #[test]
    fn default_priority_in_range() {
        assert!(DEFAULT_PRIORITY <= MAX_PRIORITY);
    }
}
