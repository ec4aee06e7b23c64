//! Column and feature contract shared by every pipeline stage.
//!
//! Feature order must match the order the pretrained scaler and autoencoder were fit on.

/// Device identifier column
pub const DEVICE_ID: &str = "device_id";

/// Reading timestamp column
pub const TIMESTAMP: &str = "timestamp";

/// Raw sensor columns, in feature order
pub const RAW_SENSOR_COLUMNS: [&str; 8] = [
    "evaporator_coil_temperature",
    "fridge_temperature",
    "compressor_vibration_x",
    "compressor_vibration_y",
    "compressor_vibration_z",
    "compressor_current",
    "input_voltage",
    "gas_leakage_level",
];

/// Engineered columns, computed when absent from the input
pub const DERIVED_COLUMNS: [&str; 3] = [
    "compressor_vibration",
    "power_consumption",
    "temperature_diff",
];

/// Columns every input table must carry
pub const REQUIRED_COLUMNS: [&str; 10] = [
    DEVICE_ID,
    TIMESTAMP,
    "evaporator_coil_temperature",
    "fridge_temperature",
    "compressor_vibration_x",
    "compressor_vibration_y",
    "compressor_vibration_z",
    "compressor_current",
    "input_voltage",
    "gas_leakage_level",
];

/// Number of model features
pub const FEATURE_DIMENSION: usize = 11;

/// Model features, in contract order
pub const FEATURE_COLUMNS: [&str; FEATURE_DIMENSION] = [
    "evaporator_coil_temperature",
    "fridge_temperature",
    "compressor_vibration_x",
    "compressor_vibration_y",
    "compressor_vibration_z",
    "compressor_current",
    "input_voltage",
    "gas_leakage_level",
    "compressor_vibration",
    "power_consumption",
    "temperature_diff",
];

/// Position of `input_voltage` in the feature vector
pub const INPUT_VOLTAGE_INDEX: usize = 6;

/// Position of `power_consumption` in the feature vector
pub const POWER_CONSUMPTION_INDEX: usize = 9;

/// Feature positions that receive `ln(1 + x)` before scaling
pub const LOG_SCALED_FEATURES: [usize; 2] = [INPUT_VOLTAGE_INDEX, POWER_CONSUMPTION_INDEX];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order_is_raw_then_derived() {
        assert_eq!(&FEATURE_COLUMNS[..8], &RAW_SENSOR_COLUMNS[..]);
        assert_eq!(&FEATURE_COLUMNS[8..], &DERIVED_COLUMNS[..]);
        assert_eq!(FEATURE_COLUMNS[INPUT_VOLTAGE_INDEX], "input_voltage");
        assert_eq!(FEATURE_COLUMNS[POWER_CONSUMPTION_INDEX], "power_consumption");
    }

    #[test]
    fn test_required_columns_cover_raw_sensors() {
        assert_eq!(&REQUIRED_COLUMNS[2..], &RAW_SENSOR_COLUMNS[..]);
    }
}
