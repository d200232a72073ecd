//! Settings errors.

use std::path::PathBuf;

/// Result alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors raised while loading or validating settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file exists but could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Settings file is not valid JSON, or does not match the schema.
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A required value is missing or unusable.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        /// Dotted field path, e.g. `identity.clientId`.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
