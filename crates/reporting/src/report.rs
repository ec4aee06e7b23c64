//! Anomaly Report

use crate::ReportError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Output columns, in order
pub const RESULT_COLUMNS: [&str; 5] = [
    "sequence_id",
    "timestamp_start",
    "timestamp_end",
    "reconstruction_error",
    "is_anomaly",
];

/// Timestamp rendering; fractional seconds only when non-zero
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Result for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub sequence_id: usize,
    pub timestamp_start: NaiveDateTime,
    pub timestamp_end: NaiveDateTime,
    /// Reconstruction error rounded to 4 decimals
    pub reconstruction_error: f64,
    pub is_anomaly: bool,
}

impl ResultRecord {
    /// Create a record, rounding the error to 4 decimals
    pub fn new(
        sequence_id: usize,
        timestamp_start: NaiveDateTime,
        timestamp_end: NaiveDateTime,
        reconstruction_error: f64,
        is_anomaly: bool,
    ) -> Self {
        Self {
            sequence_id,
            timestamp_start,
            timestamp_end,
            reconstruction_error: (reconstruction_error * 1e4).round_ties_even() / 1e4,
            is_anomaly,
        }
    }

    fn to_row(&self) -> [String; 5] {
        [
            self.sequence_id.to_string(),
            self.timestamp_start.format(TIMESTAMP_FORMAT).to_string(),
            self.timestamp_end.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", self.reconstruction_error),
            u8::from(self.is_anomaly).to_string(),
        ]
    }
}

/// Ordered per-window results of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnomalyReport {
    records: Vec<ResultRecord>,
}

impl AnomalyReport {
    /// Create a report from records in window order
    pub fn new(records: Vec<ResultRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    /// Records flagged as anomalous
    pub fn anomalies(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter().filter(|r| r.is_anomaly)
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomalies().count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the results as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        let mut wtr = csv::Writer::from_writer(writer);

        wtr.write_record(RESULT_COLUMNS)?;
        for record in &self.records {
            wtr.write_record(record.to_row())?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Persist the results to `path`.
    ///
    /// Written to a sibling temporary file first, then renamed into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        let staging = staging_path(path);

        let result = File::create(&staging)
            .map_err(ReportError::from)
            .and_then(|file| self.write_csv(file))
            .and_then(|()| fs::rename(&staging, path).map_err(ReportError::from));

        if result.is_err() && staging.exists() {
            if let Err(e) = fs::remove_file(&staging) {
                warn!("Could not remove {}: {}", staging.display(), e);
            }
        }
        result?;

        info!("Saved {} results to {}", self.records.len(), path.display());
        Ok(())
    }

    /// Human-readable summary
    pub fn summary(&self) -> Summary<'_> {
        Summary { report: self }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Console summary of a report
pub struct Summary<'a> {
    report: &'a AnomalyReport,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let anomalies = self.report.anomaly_count();
        write!(
            f,
            "Detected {} anomalies out of {} sequences.",
            anomalies,
            self.report.len()
        )?;

        if anomalies > 0 {
            write!(f, "\n\nAnomalous sequences:")?;
            for record in self.report.anomalies() {
                write!(
                    f,
                    "\nSequence {}: Error = {:.4}, Time: {} to {}",
                    record.sequence_id,
                    record.reconstruction_error,
                    record.timestamp_start.format(TIMESTAMP_FORMAT),
                    record.timestamp_end.format(TIMESTAMP_FORMAT),
                )?;
            }
        }
        Ok(())
    }
}
