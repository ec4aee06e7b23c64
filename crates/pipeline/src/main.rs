//! Cold-Chain Anomaly Inference - Main Entry Point

use pipeline::{execute, init_logging, PipelineError, Settings};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), PipelineError> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref())?;
    init_logging(&settings)?;

    info!("=== Cold-Chain Anomaly Inference v{} ===", env!("CARGO_PKG_VERSION"));

    let report = execute(&settings)?;

    println!("{}", report.summary());
    println!("Results saved to '{}'.", settings.output_path.display());
    Ok(())
}
