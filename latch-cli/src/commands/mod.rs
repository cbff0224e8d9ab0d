//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod resolve;
mod stubs;
mod validate;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check that every pipeline of a configuration materializes cleanly
    Validate {
        /// Base configuration file
        #[arg(long, env = "LATCH_CONFIG_DEFAULT")]
        config_default: PathBuf,

        /// Configuration file merged on top of the base
        #[arg(long, env = "LATCH_CONFIG_LOCAL")]
        config_local: PathBuf,

        /// Print each materialized run
        #[arg(short, long)]
        verbose: bool,
    },
    /// Resolve a configuration against a recorded event
    Resolve {
        /// Configuration file
        #[arg(short, long, env = "LATCH_CONFIG")]
        config: PathBuf,

        /// Configuration file merged on top of `--config`
        #[arg(long = "override")]
        overlay: Option<PathBuf>,

        /// Interceptor request as JSON
        #[arg(short, long)]
        event: PathBuf,
    },
    /// Generate Lua stubs for editor completion of expressions
    Stubs {
        /// Write the stubs to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Routes a command to its handler
pub fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Validate {
            config_default,
            config_local,
            verbose,
        } => validate::handle_validate(&config_default, &config_local, verbose),
        Commands::Resolve {
            config,
            overlay,
            event,
        } => resolve::handle_resolve(&config, overlay.as_deref(), &event),
        Commands::Stubs { output } => stubs::handle_stubs(output.as_deref()),
    }
}
