//! torctl CLI
//!
//! Talks to a local Tor daemon's control port:
//! - `info`: run the PROTOCOLINFO handshake and show what the daemon offers
//! - `config`: inspect or initialize the client configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use torctl::commands;
use torctl::output::print_error;
use torctl_core::config::{self, ControlConfig};
use torctl_core::ConfigError;

#[derive(Parser)]
#[command(name = "torctl")]
#[command(author, version, about = "Tor control port client")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Control port address (overrides config)
    #[arg(short, long, global = true)]
    address: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show protocol version and auth methods advertised by the daemon
    Info {
        /// Print capabilities as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Show config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let explicit_path = cli.config.as_deref();
    let address = cli.address.as_deref();
    let config_path = explicit_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path);

    match cli.command {
        Commands::Info { json } => {
            let config = load_effective_config(explicit_path, address)?;
            commands::info_command(&config, json).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                commands::config_show(&load_effective_config(explicit_path, address)?)
            }
            ConfigAction::Path => commands::config_path(&config_path),
            ConfigAction::Init { force } => commands::config_init(&config_path, force),
        },
    }
}

/// Config file (or defaults) with command-line overrides applied
fn load_effective_config(
    explicit_path: Option<&Path>,
    address: Option<&str>,
) -> Result<ControlConfig> {
    let path = explicit_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path);

    let mut config = match config::load_config::<ControlConfig>(&path) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "Loaded config");
            config
        }
        // Only an explicitly requested file has to exist
        Err(ConfigError::NotFound(_)) if explicit_path.is_none() => {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            ControlConfig::default()
        }
        Err(e) => {
            print_error(&format!("Failed to load config: {}", e));
            return Err(e).with_context(|| format!("Config file: {}", path.display()));
        }
    };

    if let Some(address) = address {
        config.address = address.to_string();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
