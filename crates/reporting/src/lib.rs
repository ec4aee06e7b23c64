//! Reporting Layer
//!
//! Assembles per-window results, persists them as CSV, and renders the console summary.

mod report;

pub use report::{AnomalyReport, ResultRecord, Summary, RESULT_COLUMNS, TIMESTAMP_FORMAT};

use thiserror::Error;

/// Reporting errors
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write results: {0}")]
    Io(String),
    #[error("CSV error: {0}")]
    Csv(String),
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err.to_string())
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Csv(err.to_string())
    }
}
