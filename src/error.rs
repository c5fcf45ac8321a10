//! Error types for the relay.

use std::net::SocketAddr;

/// Top-level error type for the relay binary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("Log sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Configuration-related errors. Surfaced at startup only; the loaded
/// configuration is read-only for the process lifetime.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// HTTP server lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Durable log sink errors.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to create logs directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to open log file {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to append to log file: {0}")]
    Write(#[from] std::io::Error),
}

/// Per-request ingestion failures that map directly to HTTP responses.
///
/// Only validation and authentication may short-circuit a request. Channel
/// delivery failures are not errors at all: they are reported as
/// [`DeliveryOutcome`](crate::channels::DeliveryOutcome) values and absorbed
/// into the aggregated response.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Missing message parameter")]
    MissingMessage,

    #[error("Missing message in request body")]
    MissingBodyMessage,

    #[error("Malformed request body")]
    MalformedBody,

    #[error("Invalid API key")]
    InvalidApiKey,
}
