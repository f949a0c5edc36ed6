//! Configuration management CLI commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use curabridge_core::config::default_config_path;
use curabridge_core::{BridgeConfig, BridgeError, BridgeResult};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration and print a summary
    Validate,
    /// Write a configuration file with default values
    Generate {
        /// Output file path (defaults to the per-user config location)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Execute config commands
pub fn execute(
    args: &ConfigArgs,
    config: &BridgeConfig,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> BridgeResult<()> {
    match &args.command {
        ConfigCommand::Show => match format {
            OutputFormat::Table => print!("{}", config.to_toml()?),
            OutputFormat::Json => output::print_json(config),
        },
        ConfigCommand::Validate => {
            // Loading already validated; report where the values came from.
            let source = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(default_config_path);
            output::print_success(&format!("Configuration '{}' is valid", source.display()));
            output::print_kv(
                "Slicer",
                &config
                    .configured_slicer_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "auto-detect".to_string()),
            );
            output::print_kv(
                "Export directory",
                &config.effective_export_dir().display().to_string(),
            );
            output::print_kv("Scale", &config.export.scale.to_string());
            output::print_kv(
                "Axes",
                &format!(
                    "forward {} / up {}",
                    config.export.forward_axis, config.export.up_axis
                ),
            );
            output::print_kv(
                "Grace period",
                &format!("{} ms", config.launch.grace_period_ms),
            );
        }
        ConfigCommand::Generate {
            output: out_path,
            force,
        } => {
            let path = out_path.clone().unwrap_or_else(default_config_path);
            generate(&path, *force)?;
            output::print_success(&format!("Default config written to '{}'", path.display()));
        }
    }

    Ok(())
}

/// Write the default configuration as TOML to `path`.
pub fn generate(path: &Path, force: bool) -> BridgeResult<()> {
    if path.exists() && !force {
        return Err(BridgeError::configuration(format!(
            "'{}' already exists; pass --force to overwrite",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, BridgeConfig::default().to_toml()?)?;
    Ok(())
}
