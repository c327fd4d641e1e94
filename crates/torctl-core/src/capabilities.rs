//! Capability record negotiated during the handshake

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use torctl_protocol::ProtocolInfo;

use crate::error::ControlError;
use crate::SUPPORTED_PROTOCOL_VERSION;

/// What the daemon advertised in its `PROTOCOLINFO` reply
///
/// Built once during the handshake and never modified afterwards. Only a
/// record whose protocol version this client understands can be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NegotiatedCapabilities {
    protocol_version: u32,
    auth_methods: BTreeSet<String>,
    auth_cookie_path: Option<PathBuf>,
}

impl NegotiatedCapabilities {
    /// Apply the version gate to a parsed `PROTOCOLINFO` reply
    pub fn negotiate(info: ProtocolInfo) -> Result<Self, ControlError> {
        let version = info
            .protocol_version
            .as_deref()
            .and_then(|v| v.parse::<u32>().ok());

        match version {
            Some(SUPPORTED_PROTOCOL_VERSION) => Ok(Self {
                protocol_version: SUPPORTED_PROTOCOL_VERSION,
                auth_methods: info.auth_methods,
                auth_cookie_path: info.auth_cookie_path,
            }),
            _ => Err(ControlError::UnsupportedVersion {
                found: info.protocol_version,
            }),
        }
    }

    /// Negotiated control protocol version
    pub fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    /// Authentication methods the daemon accepts
    pub fn auth_methods(&self) -> &BTreeSet<String> {
        &self.auth_methods
    }

    pub fn supports_auth_method(&self, method: &str) -> bool {
        self.auth_methods.contains(method)
    }

    /// Cookie file for COOKIE/SAFECOOKIE auth, when one of those is offered
    pub fn auth_cookie_path(&self) -> Option<&Path> {
        self.auth_cookie_path.as_deref()
    }
}
