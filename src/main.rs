// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Inspect { args } => commands::cmd_inspect(&args),
        Commands::Export {
            args,
            allow_unpushed,
        } => commands::cmd_export(&args, allow_unpushed),
        Commands::Source { args } => commands::cmd_source(&args),
        Commands::Build { args, skip_tests } => commands::cmd_build(&args, skip_tests),
        Commands::Package { args } => commands::cmd_package(&args),
        Commands::Create {
            args,
            no_export,
            allow_unpushed,
            skip_tests,
        } => commands::cmd_create(&args, no_export, allow_unpushed, skip_tests),
    }
}
