//! Cold-Chain Anomaly Inference Pipeline
//!
//! Validates telemetry, derives features, windows the time-ordered readings,
//! normalizes them with the pretrained scaler, scores each window with the
//! autoencoder, and reports which windows exceed the anomaly threshold.

mod settings;

pub use settings::{LogFormat, Settings, DEFAULT_CONFIG_FILE, ENV_PREFIX};

use data_validator::{AffineScaler, Normalizer, RawTable, Scaler, SchemaValidator, ValidationError};
use feature_engine::{stack_windows, FeatureDeriver, FeatureError, WindowError, Windower};
use inference_engine::{
    DecisionEngine, InferenceError, OnnxAutoencoder, ReconstructionModel, Scorer, Threshold,
};
use reporting::{AnomalyReport, ReportError, ResultRecord};
use std::path::Path;
use thiserror::Error;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Any failure that halts a run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Pretrained artifacts and windowing parameters for one run
pub struct PipelineContext<'a> {
    pub model: &'a dyn ReconstructionModel,
    pub scaler: &'a dyn Scaler,
    pub threshold: Threshold,
    pub sequence_length: usize,
}

/// Run every stage over an in-memory table
pub fn run(ctx: &PipelineContext<'_>, table: RawTable) -> Result<AnomalyReport, PipelineError> {
    let validated = SchemaValidator::new().validate(table)?;
    let readings = FeatureDeriver::new().derive(&validated)?;
    let windows = Windower::new(ctx.sequence_length)?.build(readings)?;

    let batch = Normalizer::new(ctx.scaler)?.normalize(stack_windows(&windows))?;
    let errors = Scorer::new(ctx.model).score(&batch)?;
    let verdicts = DecisionEngine::new(ctx.threshold).decide(&errors);

    let records = windows
        .iter()
        .zip(verdicts)
        .map(|(window, verdict)| {
            ResultRecord::new(
                window.sequence_id,
                window.timestamp_start,
                window.timestamp_end,
                verdict.reconstruction_error,
                verdict.is_anomaly,
            )
        })
        .collect();

    Ok(AnomalyReport::new(records))
}

/// Load `input`, run the pipeline, and persist the results to `output`.
///
/// Nothing is written unless every stage succeeds.
pub fn process_file(
    ctx: &PipelineContext<'_>,
    input: &Path,
    output: &Path,
) -> Result<AnomalyReport, PipelineError> {
    let table = RawTable::from_path(input)?;
    let report = run(ctx, table)?;
    report.save(output)?;

    info!(
        "Detected {} anomalies out of {} sequences",
        report.anomaly_count(),
        report.len()
    );
    Ok(report)
}

/// Load the pretrained artifacts named in `settings` and process the input file
pub fn execute(settings: &Settings) -> Result<AnomalyReport, PipelineError> {
    let model = OnnxAutoencoder::load(&settings.model_path)?;
    let scaler = AffineScaler::load(&settings.scaler_path)?;
    let threshold = Threshold::load(&settings.threshold_path)?;

    let ctx = PipelineContext {
        model: &model,
        scaler: &scaler,
        threshold,
        sequence_length: settings.sequence_length,
    };
    process_file(&ctx, &settings.input_path, &settings.output_path)
}

/// Initialize logging to stderr, keeping stdout for the summary
pub fn init_logging(settings: &Settings) -> Result<(), PipelineError> {
    let level = settings.log_level.parse::<Level>().map_err(|_| {
        PipelineError::Logging(format!("unknown log level {:?}", settings.log_level))
    })?;
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| PipelineError::Logging(e.to_string()))
}
