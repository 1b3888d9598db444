//! Command-line interface for settings-tree.
//!
//! This module provides CLI commands for inspecting and editing the settings
//! document without writing any code.

mod commands;

pub use commands::{Cli, Commands, ServicesCommand, run_command};
