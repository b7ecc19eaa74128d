//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The config document exists but could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The config document is not valid JSON, or has wrongly typed fields.
    #[error("failed to parse config {}: {source}", .path.display())]
    Json {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// A settings value was invalid (e.g., out of range).
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = SettingsError::Io {
            path: PathBuf::from("/p/.rules/config.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/p/.rules/config.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn json_error_display() {
        let source = serde_json::from_str::<serde_json::Value>("{bad}").unwrap_err();
        let err = SettingsError::Json {
            path: PathBuf::from("config.json"),
            source,
        };
        assert!(err.to_string().starts_with("failed to parse config config.json"));
    }

    #[test]
    fn invalid_value_display() {
        let err = SettingsError::InvalidValue("budgetMarginPercent out of range".into());
        assert_eq!(
            err.to_string(),
            "invalid settings value: budgetMarginPercent out of range"
        );
    }
}
