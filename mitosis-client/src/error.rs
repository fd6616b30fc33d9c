//! Error types for the mitosis client.

use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure decoding an inbound frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame is not valid JSON or does not match the expected shape.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON with no recognizable discriminant.
    #[error("unrecognized message")]
    UnknownMessage,
}

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Display name was empty; nothing was started.
    #[error(
        "a display name is required to join (pass it as the first argument or set MITOSIS_NAME)"
    )]
    MissingName,

    /// A configuration value could not be parsed.
    #[error("invalid {key}: {value:?} ({reason})")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: &'static str,
    },

    /// Could not open the server connection at session start.
    #[error("could not connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: mitosis_ws::WsError,
    },

    /// Terminal or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging could not be initialised.
    #[error("telemetry error: {0}")]
    Telemetry(String),
}

impl ClientError {
    pub fn invalid_config(
        key: &'static str,
        value: impl Into<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidConfig {
            key,
            value: value.into(),
            reason,
        }
    }
}
