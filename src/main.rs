use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use settings_tree::cli;

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("settings_tree=info".parse()?))
        .init();

    cli::run_command(&args)
}
