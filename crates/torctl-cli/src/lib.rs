//! torctl: Command-line interface for the Tor control port
//!
//! Provides the `torctl` CLI for inspecting what a local daemon
//! advertises on its control port.

pub mod commands;
pub mod output;
