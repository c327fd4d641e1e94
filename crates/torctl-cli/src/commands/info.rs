//! Info command implementation

use anyhow::{Context, Result};

use torctl_core::{ControlConfig, ControlError, ProtocolClient};

use crate::output::{format_capabilities, print_error};

/// Execute the info command: handshake, print capabilities, disconnect
pub async fn info_command(config: &ControlConfig, json: bool) -> Result<()> {
    let mut client = match ProtocolClient::connect(config).await {
        Ok(client) => client,
        Err(e) => {
            print_error(&format!("Failed to query {}: {}", config.address, e));
            if matches!(e, ControlError::Connection(_)) {
                print_error("Is tor running with ControlPort enabled?");
            }
            return Err(e.into());
        }
    };

    let result = match client.capabilities() {
        Some(caps) if json => serde_json::to_string_pretty(caps)
            .map(|s| println!("{}", s))
            .context("Failed to serialize capabilities"),
        Some(caps) => {
            println!("{}", format_capabilities(client.address(), caps));
            Ok(())
        }
        None => Err(anyhow::anyhow!("Client is {} after handshake", client.state())),
    };

    client.close().await;
    result
}
