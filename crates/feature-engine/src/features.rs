//! Feature Vector Assembly

use crate::FeatureError;
use data_validator::schema::{DERIVED_COLUMNS, FEATURE_COLUMNS, FEATURE_DIMENSION, RAW_SENSOR_COLUMNS};
use data_validator::ValidatedTable;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on derived power consumption
pub const POWER_CONSUMPTION_CAP: f64 = 2000.0;

/// Share of apparent power assumed to be real power
const POWER_FACTOR: f64 = 0.8;

/// Round to `decimals` places, ties to even
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Euclidean norm of the three compressor vibration axes, 2 decimals
pub fn vibration_magnitude(x: f64, y: f64, z: f64) -> f64 {
    round_to((x * x + y * y + z * z).sqrt(), 2)
}

/// `current * voltage * 0.8`, capped at 2000, 2 decimals
pub fn power_consumption(current: f64, voltage: f64) -> f64 {
    round_to((current * voltage * POWER_FACTOR).min(POWER_CONSUMPTION_CAP), 2)
}

/// Fridge temperature minus evaporator coil temperature, 2 decimals
pub fn temperature_diff(fridge: f64, evaporator: f64) -> f64 {
    round_to(fridge - evaporator, 2)
}

/// Model feature vector in contract order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature values, ordered as `FEATURE_COLUMNS`
    pub values: [f64; FEATURE_DIMENSION],
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            values: [0.0; FEATURE_DIMENSION],
        }
    }
}

impl FeatureVector {
    /// Look up a feature by column name
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|c| *c == name)
            .map(|i| self.values[i])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// One telemetry observation with its complete feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Position of the row in the input file (0-based, data rows only)
    pub row: usize,
    pub device_id: String,
    /// Timestamp as it appeared in the input
    pub timestamp: String,
    pub features: FeatureVector,
}

/// Computes missing derived features and maps rows into typed readings
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Create a new deriver
    pub fn new() -> Self {
        Self
    }

    /// Derive readings for every row of a validated table.
    ///
    /// Derived columns present in the input are used as-is; absent ones are computed.
    pub fn derive(&self, table: &ValidatedTable) -> Result<Vec<Reading>, FeatureError> {
        let columns = table.columns();
        let computed: Vec<&str> = DERIVED_COLUMNS
            .iter()
            .zip(columns.derived.iter())
            .filter(|(_, index)| index.is_none())
            .map(|(name, _)| *name)
            .collect();
        debug!("Deriving features for {} rows, computing {:?}", table.len(), computed);

        let mut readings = Vec::with_capacity(table.len());
        for (row, cells) in table.table().rows().iter().enumerate() {
            let cell = |index: usize| cells.get(index).map(String::as_str).unwrap_or("");

            let mut values = [0.0; FEATURE_DIMENSION];
            for (slot, (&index, name)) in values
                .iter_mut()
                .zip(columns.sensors.iter().zip(RAW_SENSOR_COLUMNS))
            {
                *slot = parse_cell(row, name, cell(index))?;
            }

            let (evaporator, fridge) = (values[0], values[1]);
            let (current, voltage) = (values[5], values[6]);
            let fallback = [
                vibration_magnitude(values[2], values[3], values[4]),
                power_consumption(current, voltage),
                temperature_diff(fridge, evaporator),
            ];

            for (offset, (index, computed)) in columns.derived.iter().zip(fallback).enumerate() {
                values[RAW_SENSOR_COLUMNS.len() + offset] = match index {
                    Some(index) => parse_cell(row, DERIVED_COLUMNS[offset], cell(*index))?,
                    None => computed,
                };
            }

            readings.push(Reading {
                row,
                device_id: cell(columns.device_id).to_string(),
                timestamp: cell(columns.timestamp).to_string(),
                features: FeatureVector { values },
            });
        }

        Ok(readings)
    }
}

fn parse_cell(row: usize, column: &str, raw: &str) -> Result<f64, FeatureError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(FeatureError::Computation {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_validator::schema::REQUIRED_COLUMNS;
    use data_validator::{RawTable, SchemaValidator};
    use proptest::prelude::*;

    const RAW_ROW: [&str; 10] = [
        "fridge-7",
        "2024-03-01 08:00:00",
        "-18.5",
        "3.25",
        "0.3",
        "0.4",
        "1.2",
        "4.1",
        "230.0",
        "0.02",
    ];

    fn validated(extra_headers: &[&str], rows: Vec<Vec<&str>>) -> ValidatedTable {
        let headers = REQUIRED_COLUMNS
            .iter()
            .chain(extra_headers)
            .map(|h| h.to_string())
            .collect();
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(str::to_string).collect())
            .collect();
        SchemaValidator::new()
            .validate(RawTable::new(headers, rows))
            .unwrap()
    }

    #[test]
    fn test_derives_absent_features() {
        let table = validated(&[], vec![RAW_ROW.to_vec()]);
        let readings = FeatureDeriver::new().derive(&table).unwrap();

        assert_eq!(readings.len(), 1);
        let reading = &readings[0];
        assert_eq!(reading.device_id, "fridge-7");
        assert_eq!(reading.timestamp, "2024-03-01 08:00:00");
        assert_eq!(reading.features.get("input_voltage"), Some(230.0));
        assert_eq!(reading.features.get("compressor_vibration"), Some(1.3));
        // 4.1 * 230 * 0.8 = 754.4
        assert_eq!(reading.features.get("power_consumption"), Some(754.4));
        assert_eq!(reading.features.get("temperature_diff"), Some(21.75));
    }

    #[test]
    fn test_precomputed_features_untouched() {
        let mut row = RAW_ROW.to_vec();
        row.extend(["12.3456789", "99999", "-0.001"]);
        let table = validated(&DERIVED_COLUMNS, vec![row]);

        let readings = FeatureDeriver::new().derive(&table).unwrap();
        let features = readings[0].features;

        assert_eq!(features.get("compressor_vibration").unwrap().to_bits(), 12.3456789f64.to_bits());
        assert_eq!(features.get("power_consumption"), Some(99999.0));
        assert_eq!(features.get("temperature_diff"), Some(-0.001));
    }

    #[test]
    fn test_partial_precomputed() {
        let mut row = RAW_ROW.to_vec();
        row.push("5.0");
        let table = validated(&["temperature_diff"], vec![row]);

        let features = FeatureDeriver::new().derive(&table).unwrap()[0].features;
        assert_eq!(features.get("temperature_diff"), Some(5.0));
        assert_eq!(features.get("compressor_vibration"), Some(1.3));
    }

    #[test]
    fn test_malformed_numeric_value() {
        let mut row = RAW_ROW.to_vec();
        row[8] = "two-thirty";
        let table = validated(&[], vec![RAW_ROW.to_vec(), row]);

        match FeatureDeriver::new().derive(&table) {
            Err(FeatureError::Computation { row, column, value }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "input_voltage");
                assert_eq!(value, "two-thirty");
            }
            other => panic!("expected Computation error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_non_finite_cells_rejected() {
        for bad in ["", "NaN", "inf"] {
            let mut row = RAW_ROW.to_vec();
            row[2] = bad;
            let table = validated(&[], vec![row]);
            assert!(FeatureDeriver::new().derive(&table).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_zero_vibration() {
        assert_eq!(vibration_magnitude(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_power_clamp_example() {
        assert_eq!(power_consumption(1000.0, 1000.0), 2000.0);
    }

    #[test]
    fn test_round_ties_to_even() {
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(1.23456, 4), 1.2346);
    }

    proptest! {
        #[test]
        fn prop_vibration_non_negative(x in -1e3f64..1e3, y in -1e3f64..1e3, z in -1e3f64..1e3) {
            let magnitude = vibration_magnitude(x, y, z);
            prop_assert!(magnitude >= 0.0);
            prop_assert_eq!(magnitude, round_to((x * x + y * y + z * z).sqrt(), 2));
        }

        #[test]
        fn prop_power_never_exceeds_cap(current in 0f64..1e6, voltage in 0f64..1e6) {
            prop_assert!(power_consumption(current, voltage) <= POWER_CONSUMPTION_CAP);
        }
    }
}
