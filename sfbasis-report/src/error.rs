//! Error types for the reporting layer.

use sfbasis_core::DataError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while producing plots and summary artifacts.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("nothing to report: {0}")]
    Empty(String),
}

/// Errors raised while resolving [`crate::Settings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{key} is not a YYYY-MM-DD date: '{value}'")]
    InvalidDate { key: String, value: String },

    #[error("cannot determine working directory: {0}")]
    WorkingDir(#[source] std::io::Error),
}
