//! Validation Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, validating or normalizing input data
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// Input file does not exist
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// Scaler artifact does not exist
    #[error("Scaler artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// One or more required columns are absent; lists every absent column
    #[error("Missing columns in CSV: {0:?}")]
    MissingColumns(Vec<String>),

    /// Tabular input could not be decoded
    #[error("CSV error: {0}")]
    Csv(String),

    /// File could not be read
    #[error("I/O error: {0}")]
    Io(String),

    /// Persisted scaler parameters are malformed
    #[error("Invalid scaler artifact: {0}")]
    InvalidArtifact(String),

    /// Scaler contract does not match the feature layout
    #[error("Normalization failed: {0}")]
    Normalization(String),
}

impl From<csv::Error> for ValidationError {
    fn from(err: csv::Error) -> Self {
        ValidationError::Csv(err.to_string())
    }
}

impl From<std::io::Error> for ValidationError {
    fn from(err: std::io::Error) -> Self {
        ValidationError::Io(err.to_string())
    }
}
