//! Control port connection configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::duration_secs;
use crate::error::ConfigError;
use crate::DEFAULT_CONTROL_PORT;

/// How to reach the daemon's control port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Control port endpoint (host:port, loopback by default)
    pub address: String,

    /// How long to wait for the TCP connect to complete
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Upper bound on any single line read or command write
    #[serde(with = "duration_secs")]
    pub io_timeout: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            address: format!("127.0.0.1:{}", DEFAULT_CONTROL_PORT),
            connect_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(30),
        }
    }
}

impl ControlConfig {
    /// Config for a specific endpoint with default timeouts
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Check that the endpoint is host:port and timeouts are non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let port = self
            .address
            .rsplit_once(':')
            .filter(|(host, _)| !host.is_empty())
            .map(|(_, port)| port);

        match port.map(str::parse::<u16>) {
            Some(Ok(p)) if p != 0 => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "address must be host:port, got {:?}",
                    self.address
                )))
            }
        }

        if self.connect_timeout.is_zero() || self.io_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "timeouts must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let config = ControlConfig::default();
        assert_eq!(config.address, "127.0.0.1:9051");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ControlConfig = toml::from_str("io_timeout = 3").unwrap();
        assert_eq!(config.address, "127.0.0.1:9051");
        assert_eq!(config.io_timeout, Duration::from_secs(3));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validate_rejects_bad_address() {
        for address in ["localhost", ":9051", "127.0.0.1:", "127.0.0.1:0", "host:99999"] {
            let config = ControlConfig::with_address(address);
            assert!(config.validate().is_err(), "{address} should be rejected");
        }
    }

    #[test]
    fn test_validate_accepts_ipv6() {
        assert!(ControlConfig::with_address("[::1]:9051").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ControlConfig {
            io_timeout: Duration::ZERO,
            ..ControlConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_accepts_sub_second_timeout() {
        let config = ControlConfig {
            connect_timeout: Duration::from_millis(500),
            ..ControlConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
