//! Window Normalization
//!
//! Log-stabilizes the heavy-tailed channels, then applies the pretrained scaler
//! over the flattened `(windows * steps, features)` view.

use crate::error::ValidationError;
use crate::scaler::Scaler;
use crate::schema::{FEATURE_COLUMNS, FEATURE_DIMENSION, LOG_SCALED_FEATURES};
use ndarray::{Array2, Array3};
use tracing::debug;

/// Replace the log-scaled feature columns with `ln(1 + x)`
pub fn log_stabilize(matrix: &mut Array2<f64>) {
    for &index in &LOG_SCALED_FEATURES {
        matrix.column_mut(index).mapv_inplace(f64::ln_1p);
    }
}

/// Normalizer bound to a pretrained scaler
pub struct Normalizer<'a> {
    scaler: &'a dyn Scaler,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer, checking the scaler was fit on the full feature vector
    pub fn new(scaler: &'a dyn Scaler) -> Result<Self, ValidationError> {
        if scaler.n_features() != FEATURE_DIMENSION {
            return Err(ValidationError::Normalization(format!(
                "scaler was fit on {} features, expected {}",
                scaler.n_features(),
                FEATURE_DIMENSION
            )));
        }
        Ok(Self { scaler })
    }

    /// Normalize a `(windows, steps, features)` batch
    pub fn normalize(&self, batch: Array3<f64>) -> Result<Array3<f64>, ValidationError> {
        let (windows, steps, features) = batch.dim();
        if features != FEATURE_DIMENSION {
            return Err(ValidationError::Normalization(format!(
                "batch has {} features, expected {}",
                features, FEATURE_DIMENSION
            )));
        }

        let rows = windows * steps;
        let mut flat = Array2::from_shape_vec((rows, features), batch.iter().copied().collect())
            .map_err(|e| ValidationError::Normalization(e.to_string()))?;

        log_stabilize(&mut flat);
        if let Some(((row, col), value)) = flat.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ValidationError::Normalization(format!(
                "'{}' is {} after log scaling at window {} step {}",
                FEATURE_COLUMNS[col],
                value,
                row / steps,
                row % steps
            )));
        }

        let scaled = self.scaler.transform(flat)?;

        if scaled.dim() != (rows, features) {
            return Err(ValidationError::Normalization(format!(
                "scaler returned shape {:?}, expected {:?}",
                scaled.dim(),
                (rows, features)
            )));
        }

        debug!("Normalized {} windows ({} rows)", windows, rows);
        Array3::from_shape_vec((windows, steps, features), scaled.iter().copied().collect())
            .map_err(|e| ValidationError::Normalization(e.to_string()))
    }
}
