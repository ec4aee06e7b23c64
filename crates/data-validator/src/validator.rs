//! Schema Validator
//!
//! Checks column presence once and resolves every column the pipeline reads to
//! its position, so later stages work with typed fields instead of names.

use crate::error::ValidationError;
use crate::schema::{DERIVED_COLUMNS, DEVICE_ID, RAW_SENSOR_COLUMNS, REQUIRED_COLUMNS, TIMESTAMP};
use crate::table::RawTable;
use tracing::{debug, warn};

/// Column positions resolved from the table header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    /// `device_id` position
    pub device_id: usize,
    /// `timestamp` position
    pub timestamp: usize,
    /// Raw sensor positions, in feature order
    pub sensors: [usize; RAW_SENSOR_COLUMNS.len()],
    /// Precomputed derived column positions, `None` when absent
    pub derived: [Option<usize>; DERIVED_COLUMNS.len()],
}

/// Table whose header satisfies the schema
#[derive(Debug, Clone)]
pub struct ValidatedTable {
    table: RawTable,
    columns: ColumnMap,
}

impl ValidatedTable {
    /// Underlying table, unchanged by validation
    pub fn table(&self) -> &RawTable {
        &self.table
    }

    /// Resolved column positions
    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether there are no data rows
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Validator for the telemetry input schema
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate that every required column is present.
    ///
    /// All absent columns are reported together, in schema order.
    pub fn validate(&self, table: RawTable) -> Result<ValidatedTable, ValidationError> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| table.column_index(column).is_none())
            .map(|column| column.to_string())
            .collect();

        if !missing.is_empty() {
            warn!("Input is missing {} required column(s): {:?}", missing.len(), missing);
            return Err(ValidationError::MissingColumns(missing));
        }

        let required = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| ValidationError::MissingColumns(vec![name.to_string()]))
        };

        let mut sensors = [0; RAW_SENSOR_COLUMNS.len()];
        for (slot, name) in sensors.iter_mut().zip(RAW_SENSOR_COLUMNS) {
            *slot = required(name)?;
        }

        let columns = ColumnMap {
            device_id: required(DEVICE_ID)?,
            timestamp: required(TIMESTAMP)?,
            sensors,
            derived: DERIVED_COLUMNS.map(|name| table.column_index(name)),
        };

        debug!(
            "Schema valid: {} rows, precomputed derived columns: {:?}",
            table.len(),
            columns.derived
        );

        Ok(ValidatedTable { table, columns })
    }
}
