//! CLI command implementations

mod config;
mod info;

pub use config::{config_init, config_path, config_show};
pub use info::info_command;
