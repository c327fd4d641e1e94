//! torctl-core: Tor control port client
//!
//! This crate provides the connection layer ([`Transport`]), the
//! handshaking [`ProtocolClient`], the capability record negotiated at
//! startup and the configuration used to reach the daemon.

pub mod capabilities;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use capabilities::NegotiatedCapabilities;
pub use client::{ClientState, ProtocolClient};
pub use config::ControlConfig;
pub use error::{ConfigError, ConnectionError, ControlError};
pub use transport::Transport;

pub use torctl_protocol::{ProtocolInfo, Reply, StatusCode};

/// The only control protocol version this client understands
pub const SUPPORTED_PROTOCOL_VERSION: u32 = 1;

/// Conventional Tor control port
pub const DEFAULT_CONTROL_PORT: u16 = 9051;
