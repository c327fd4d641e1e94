//! torctl-protocol: Wire grammar for the Tor control protocol
//!
//! This crate defines the line-oriented text protocol spoken on a Tor
//! control port: newline framing, status-line parsing, multi-line reply
//! accumulation and the `PROTOCOLINFO` reply body.

pub mod codec;
pub mod error;
pub mod line;
pub mod protocol_info;
pub mod reply;

pub use codec::{ControlCodec, MAX_LINE_LENGTH};
pub use error::ProtocolError;
pub use line::{ReplyLine, StatusCode};
pub use protocol_info::ProtocolInfo;
pub use reply::{Reply, ReplyBuilder};

/// Bootstrap command that discovers the protocol version and auth methods
pub const PROTOCOLINFO: &str = "PROTOCOLINFO";
