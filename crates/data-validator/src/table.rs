//! Raw Tabular Input

use crate::error::ValidationError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Headered table of string cells, rows in file order
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Create a table from headers and rows
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Load a CSV file, failing with `MissingInput` if it does not exist
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ValidationError::MissingInput(path.to_path_buf()));
        }

        info!("Loading sensor data from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse CSV from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ValidationError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!("Parsed {} rows x {} columns", rows.len(), headers.len());
        Ok(Self { headers, rows })
    }

    /// Column names in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows in file order
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Index of the first column with the given name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
