//! Runtime settings

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "coldchain";

/// Prefix for environment overrides, e.g. `COLDCHAIN_INPUT_PATH`
pub const ENV_PREFIX: &str = "COLDCHAIN";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sensor readings CSV
    pub input_path: PathBuf,
    /// Result CSV written on success
    pub output_path: PathBuf,
    /// Autoencoder exported to ONNX
    pub model_path: PathBuf,
    /// Fitted scaler parameters (JSON)
    pub scaler_path: PathBuf,
    /// Decision threshold (JSON)
    pub threshold_path: PathBuf,
    /// Readings per window; must match the model input length
    pub sequence_length: usize,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("new_sensor_data.csv"),
            output_path: PathBuf::from("anomaly_results.csv"),
            model_path: PathBuf::from("autoencoder_model.onnx"),
            scaler_path: PathBuf::from("scaler.json"),
            threshold_path: PathBuf::from("threshold.json"),
            sequence_length: feature_engine::SEQUENCE_LENGTH,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    /// Layer defaults, the config file, then `COLDCHAIN_*` environment variables.
    ///
    /// An explicit `config_path` must exist; the default file is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Self = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        if settings.sequence_length == 0 {
            return Err(ConfigError::Message(
                "sequence_length must be at least 1".to_string(),
            ));
        }
        Ok(settings)
    }
}
