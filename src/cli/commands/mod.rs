//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `document`: whole-document inspection and path edits
//! - `services`: the `api_based` service collection
//! - `select`: the `now_using` selection

mod document;
mod select;
mod services;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::settings::Settings;
use crate::store;

pub use document::{cmd_path, cmd_set_path, cmd_show};
pub use select::{cmd_active, cmd_use};
pub use services::{cmd_services_add, cmd_services_list, cmd_services_remove};

/// Settings Tree CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings document (defaults to the OS config directory)
    #[arg(short, long, global = true, env = "SETTINGS_TREE_FILE")]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the whole settings document
    Show,
    /// Print the location of the settings document
    Path,
    /// Manage API-based translation services
    Services {
        #[command(subcommand)]
        action: ServicesCommand,
    },
    /// Select the active translation service
    Use {
        /// Service category: api_based or local_llm
        category: String,
        /// Service name within the category
        name: String,
    },
    /// Show attributes of the active translation service
    Active {
        /// Attributes to print (default: the whole service)
        fields: Vec<String>,
    },
    /// Set a path-valued setting such as js_path or work_dir
    SetPath {
        /// Setting name
        field: String,
        /// New path (relative paths are made absolute)
        path: PathBuf,
    },
}

/// `services` subcommands
#[derive(Subcommand)]
pub enum ServicesCommand {
    /// List registered services
    List {
        /// Output format: text, yaml
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Register a service from a YAML file
    Add {
        /// YAML mapping with service_name, key, request_form, client_type, base_url
        file: PathBuf,
    },
    /// Remove a service by name
    Remove {
        /// Service name
        name: String,
    },
}

/// Run the parsed command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let path = settings_file(cli)?;

    match &cli.command {
        Commands::Show => cmd_show(&path),
        Commands::Path => cmd_path(&path),
        Commands::Services { action } => match action {
            ServicesCommand::List { format } => cmd_services_list(&path, format),
            ServicesCommand::Add { file } => cmd_services_add(&path, file),
            ServicesCommand::Remove { name } => cmd_services_remove(&path, name),
        },
        Commands::Use { category, name } => cmd_use(&path, category, name),
        Commands::Active { fields } => cmd_active(&path, fields),
        Commands::SetPath { field, path: value } => cmd_set_path(&path, field, value),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Resolve the settings document location from `--file` or the config dir.
fn settings_file(cli: &Cli) -> anyhow::Result<PathBuf> {
    cli.file
        .clone()
        .or_else(store::config_path)
        .context("Could not determine the config directory; pass --file")
}

pub(crate) fn load(path: &Path) -> anyhow::Result<Settings> {
    store::load_settings(path).with_context(|| format!("Failed to load {}", path.display()))
}

pub(crate) fn save(path: &Path, settings: &Settings) -> anyhow::Result<()> {
    store::save_settings(path, settings)
        .with_context(|| format!("Failed to save {}", path.display()))
}
