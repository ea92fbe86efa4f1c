// src/cli.rs
//! CLI definitions for ladle
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ladle")]
#[command(version)]
#[command(about = "Evaluate package recipes: export, source, build and package", long_about = None)]
pub struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments shared by every lifecycle command
#[derive(Args, Debug, Clone)]
pub struct RecipeArgs {
    /// Recipe file, or a folder containing recipe.toml
    #[arg(default_value = ".")]
    pub recipe: PathBuf,

    /// Setting, e.g. -s os=Linux -s compiler.cppstd=20
    #[arg(short = 's', long = "settings", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,

    /// Option, e.g. -o shared=True
    #[arg(short = 'o', long = "options", value_name = "KEY=VALUE")]
    pub options: Vec<String>,

    /// Profile file with [settings], [options] and [conf] sections
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Package folder (default: <root>/package)
    #[arg(long, value_name = "DIR")]
    pub package_folder: Option<PathBuf>,

    /// Whether target binaries can run here (default: detect cross-building)
    #[arg(long, value_name = "BOOL")]
    pub can_run: Option<bool>,

    /// Fail packaging when the license file is missing
    #[arg(long)]
    pub require_license: bool,

    /// Number of parallel build jobs
    #[arg(short, long)]
    pub jobs: Option<u32>,

    /// CMake generator
    #[arg(short = 'G', long)]
    pub generator: Option<String>,

    /// Path to the cmake executable
    #[arg(long, value_name = "PATH")]
    pub cmake: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show pruned options, build profile and requirements
    Inspect {
        #[command(flatten)]
        args: RecipeArgs,
    },

    /// Record the recipe checkout's url and commit
    Export {
        #[command(flatten)]
        args: RecipeArgs,

        /// Accept commits not yet pushed to a remote
        #[arg(long)]
        allow_unpushed: bool,
    },

    /// Check out the exported sources
    Source {
        #[command(flatten)]
        args: RecipeArgs,
    },

    /// Configure, build and test
    Build {
        #[command(flatten)]
        args: RecipeArgs,

        /// Do not run the test step
        #[arg(long)]
        skip_tests: bool,
    },

    /// Install into the package folder and copy the license
    Package {
        #[command(flatten)]
        args: RecipeArgs,
    },

    /// Run the whole lifecycle, resuming where a previous run stopped
    Create {
        #[command(flatten)]
        args: RecipeArgs,

        /// Reuse the recorded coordinate instead of exporting
        #[arg(long)]
        no_export: bool,

        /// Accept commits not yet pushed to a remote
        #[arg(long)]
        allow_unpushed: bool,

        /// Do not run the test step
        #[arg(long)]
        skip_tests: bool,
    },
}
