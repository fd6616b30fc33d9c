//! mitosis terminal client
//!
//! Usage: mitosis <name>
//!
//! Settings come from `MITOSIS_*` environment variables.

use std::process::ExitCode;

use mitosis_client::telemetry::init_tracing;
use mitosis_client::{runtime, ClientConfig};
use tracing::error;

fn main() -> ExitCode {
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mitosis: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(config.tracing()) {
        eprintln!("mitosis: {e}");
        return ExitCode::FAILURE;
    }

    match runtime::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "client stopped");
            eprintln!("mitosis: {e}");
            ExitCode::FAILURE
        }
    }
}
