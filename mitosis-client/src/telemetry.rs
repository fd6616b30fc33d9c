//! Logging setup.
//!
//! The terminal is the drawing surface, so log output goes to a file.
//! `RUST_LOG` overrides the configured level.
//!
//! # Example
//!
//! ```rust,ignore
//! use mitosis_client::telemetry::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::default().with_file("mitosis.log"))?;
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ClientError, Result};

/// Tracing configuration.
#[derive(Clone, Debug)]
pub struct TracingConfig {
    /// Log level filter (e.g., "info", "mitosis_client=debug").
    pub log_level: String,
    /// Log file, appended to. `None` disables logging.
    pub log_file: Option<PathBuf>,
    /// Output logs as JSON.
    pub json_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            log_file: None,
            json_output: false,
        }
    }
}

impl TracingConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn with_json(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Install the global subscriber. Call once at startup.
///
/// Returns `Ok(false)` when no log file is configured and nothing was
/// installed.
pub fn init_tracing(config: TracingConfig) -> Result<bool> {
    let Some(path) = config.log_file else {
        return Ok(false);
    };

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json_output {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(Mutex::new(file))
            .with_ansi(false);
        registry.with(fmt_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .compact();
        registry.with(fmt_layer).try_init()
    };

    result.map_err(|e| ClientError::Telemetry(e.to_string()))?;
    Ok(true)
}
