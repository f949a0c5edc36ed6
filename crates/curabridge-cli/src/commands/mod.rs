//! CLI command definitions and dispatch.

pub mod clean;
pub mod config;
pub mod doctor;
pub mod send;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use curabridge_core::{BridgeConfig, BridgeResult};

/// Cura Bridge: export a mesh to STL and open it in UltiMaker Cura
#[derive(Debug, Parser)]
#[command(name = "cura-bridge", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Export the selected mesh to STL and open it in the slicer
    Send(send::SendArgs),
    /// Empty the export directory
    Clean(clean::CleanArgs),
    /// Show which launch strategies apply on this machine
    Doctor,
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command with the loaded configuration
    pub async fn execute(&self, config: BridgeConfig) -> BridgeResult<()> {
        match &self.command {
            Commands::Send(args) => send::execute(args, config, self.format).await,
            Commands::Clean(args) => clean::execute(args, &config),
            Commands::Doctor => doctor::execute(&config, self.format),
            Commands::Config(args) => {
                config::execute(args, &config, self.config.as_deref(), self.format)
            }
        }
    }
}
