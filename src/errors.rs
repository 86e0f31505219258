use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a settings file.
///
/// Registry operations never fail on their own; this enum only covers the
/// boundary where settings are read from disk.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported settings format for {0} (expected .json or .toml)")]
    UnsupportedFormat(PathBuf),

    // The root of a settings tree must be a table
    #[error("settings root must be a mapping, got {0}")]
    NotAMapping(&'static str),
}

pub type Result<T> = std::result::Result<T, SettingsError>;
