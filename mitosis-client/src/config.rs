//! Client configuration.
//!
//! Built from the positional name argument and `MITOSIS_*` environment
//! variables. Everything is validated before the terminal is touched or a
//! connection is attempted.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rand::seq::SliceRandom;

use crate::binding::Identity;
use crate::error::{ClientError, Result};
use crate::input::ControlMode;
use crate::lifecycle::RestartMode;
use crate::render::{CellSize, Rgb};
use crate::scheduler::DEFAULT_FPS;
use crate::session::SessionConfig;
use crate::telemetry::TracingConfig;

pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8765";
pub const DEFAULT_LOG_FILE: &str = "mitosis.log";
pub const DEFAULT_KEY_RELEASE: Duration = Duration::from_millis(600);
pub const MAX_FPS: u32 = 240;

/// Colours picked from when none is configured.
pub const PALETTE: [&str; 8] = [
    "#ff6b6b", "#4ecdc4", "#45b7d1", "#96ceb4", "#ffeaa7", "#dda0dd", "#98d8c8", "#f7dc6f",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub name: String,
    pub color: String,
    pub server_url: String,
    pub control_mode: ControlMode,
    pub restart_mode: RestartMode,
    pub fps: u32,
    pub cell_size: CellSize,
    pub key_release: Duration,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    /// JSON log lines instead of the compact text format.
    pub log_json: bool,
}

impl ClientConfig {
    /// Read the first command-line argument and the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(std::env::args().nth(1), |key| std::env::var(key).ok())
    }

    /// Build from an explicit name argument and a variable lookup.
    pub fn from_lookup<F>(name_arg: Option<String>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = name_arg
            .or_else(|| lookup("MITOSIS_NAME"))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or(ClientError::MissingName)?;

        let color = match lookup("MITOSIS_COLOR").map(|c| c.trim().to_string()) {
            Some(color) if !color.is_empty() => {
                if Rgb::parse(&color).is_none() {
                    return Err(ClientError::invalid_config(
                        "MITOSIS_COLOR",
                        color,
                        "expected #rrggbb, #rgb or rgb(r, g, b)",
                    ));
                }
                color
            }
            _ => random_color(),
        };

        let fps = match lookup("MITOSIS_FPS") {
            Some(raw) => {
                let fps: u32 = raw.trim().parse().map_err(|_| {
                    ClientError::invalid_config("MITOSIS_FPS", &raw, "expected a whole number")
                })?;
                if !(1..=MAX_FPS).contains(&fps) {
                    return Err(ClientError::invalid_config(
                        "MITOSIS_FPS",
                        raw,
                        "must be between 1 and 240",
                    ));
                }
                fps
            }
            None => DEFAULT_FPS,
        };

        let key_release = match lookup("MITOSIS_KEY_RELEASE_MS") {
            Some(raw) => raw.trim().parse().map(Duration::from_millis).map_err(|_| {
                ClientError::invalid_config(
                    "MITOSIS_KEY_RELEASE_MS",
                    &raw,
                    "expected milliseconds",
                )
            })?,
            None => DEFAULT_KEY_RELEASE,
        };

        let log_file = match lookup("MITOSIS_LOG_FILE") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path.trim())),
            None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        };

        let log_json = match lookup("MITOSIS_LOG_JSON") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                ClientError::invalid_config("MITOSIS_LOG_JSON", &raw, "expected true or false")
            })?,
            None => false,
        };

        Ok(Self {
            name,
            color,
            server_url: lookup("MITOSIS_SERVER_URL")
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            control_mode: parse_or_default(&lookup, "MITOSIS_CONTROLS")?,
            restart_mode: parse_or_default(&lookup, "MITOSIS_RESTART")?,
            fps,
            cell_size: parse_or_default(&lookup, "MITOSIS_CELL_SIZE")?,
            key_release,
            log_file,
            log_level: lookup("MITOSIS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json,
        })
    }

    pub fn identity(&self) -> Identity {
        Identity::new(&self.name, &self.color)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            identity: self.identity(),
            control_mode: self.control_mode,
            restart_mode: self.restart_mode,
        }
    }

    pub fn tracing(&self) -> TracingConfig {
        let mut config = TracingConfig::default().with_level(&self.log_level);
        if self.log_json {
            config = config.with_json();
        }
        match &self.log_file {
            Some(path) => config.with_file(path),
            None => config,
        }
    }
}

fn parse_or_default<T, F>(lookup: &F, key: &str) -> Result<T>
where
    T: FromStr<Err = ClientError> + Default,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.parse(),
        _ => Ok(T::default()),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn random_color() -> String {
    PALETTE
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(PALETTE[0])
        .to_string()
}
