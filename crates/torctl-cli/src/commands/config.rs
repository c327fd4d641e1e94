//! Config command implementation

use std::path::Path;

use anyhow::{Context, Result};

use torctl_core::config::save_config;
use torctl_core::ControlConfig;

use crate::output::{print_info, print_success};

/// Show the effective configuration as TOML
pub fn config_show(config: &ControlConfig) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    print!("{}", content);
    Ok(())
}

/// Print where the config file lives
pub fn config_path(path: &Path) -> Result<()> {
    println!("{}", path.display());
    Ok(())
}

/// Write a default config file
pub fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        print_info(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ));
        return Ok(());
    }

    save_config(path, &ControlConfig::default())
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    print_success(&format!("Wrote default config to {}", path.display()));
    Ok(())
}
