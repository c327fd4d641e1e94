//! Core error types for torctl

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use torctl_protocol::ProtocolError;

use crate::client::ClientState;

/// Top-level error type for control port operations
#[derive(Error, Debug)]
pub enum ControlError {
    /// Could not establish the connection
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Read or write failed on an established connection
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unexpected traffic
    #[error("Protocol error: {0}")]
    Protocol(ProtocolError),

    /// Daemon speaks a control protocol version this client does not
    #[error("Unsupported protocol version: {}", .found.as_deref().unwrap_or("<missing>"))]
    UnsupportedVersion { found: Option<String> },

    /// Operation not allowed in the client's current state
    #[error("Cannot {operation} while client is {state}")]
    InvalidState {
        operation: &'static str,
        state: ClientState,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<ProtocolError> for ControlError {
    fn from(err: ProtocolError) -> Self {
        // Stream failures surfaced through the codec stay I/O errors
        match err {
            ProtocolError::Io(e) => ControlError::Io(e),
            other => ControlError::Protocol(other),
        }
    }
}

/// Connection establishment errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Endpoint unreachable or refused the connection
    #[error("Connection refused by {address}: {source}")]
    Refused {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Connect did not complete in time
    #[error("Timed out connecting to {address} after {after:?}")]
    Timeout { address: String, after: Duration },

    /// Endpoint is not a host:port pair
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
