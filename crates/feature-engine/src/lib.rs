//! Feature Engineering Engine
//!
//! Turns validated telemetry rows into typed readings with the full 11-feature
//! vector, then cuts the time-ordered stream into fixed-length windows.

mod features;
mod window;

pub use features::{
    power_consumption, round_to, temperature_diff, vibration_magnitude, FeatureDeriver,
    FeatureVector, Reading, POWER_CONSUMPTION_CAP,
};
pub use window::{parse_timestamp, stack_windows, Window, Windower, SEQUENCE_LENGTH};

use thiserror::Error;

/// Errors while deriving features
#[derive(Debug, Clone, Error)]
pub enum FeatureError {
    #[error("Malformed numeric value {value:?} in column '{column}' at row {row}")]
    Computation {
        row: usize,
        column: String,
        value: String,
    },
}

/// Errors while building windows
#[derive(Debug, Clone, Error)]
pub enum WindowError {
    #[error("Unparseable timestamp {value:?} at row {row}")]
    InvalidTimestamp { row: usize, value: String },
    #[error("Not enough data to form any sequences: {rows} rows, need at least {required}")]
    InsufficientData { rows: usize, required: usize },
    #[error("Sequence length must be at least 1")]
    ZeroSequenceLength,
}
