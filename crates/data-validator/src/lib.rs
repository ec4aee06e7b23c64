//! Data Validation and Normalization
//!
//! Provides the feature/column contract, input table loading, schema validation,
//! and the log1p + pretrained-scaler normalization applied before inference.

mod error;
mod normalizer;
mod scaler;
pub mod schema;
mod table;
mod validator;

pub use error::ValidationError;
pub use normalizer::{log_stabilize, Normalizer};
pub use scaler::{AffineScaler, Scaler};
pub use table::RawTable;
pub use validator::{ColumnMap, SchemaValidator, ValidatedTable};
