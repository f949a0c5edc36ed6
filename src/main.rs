//! Cura Bridge: export a mesh to STL and open it in UltiMaker Cura.
//!
//! Entry point: parses the command line, loads configuration, sets up
//! logging and dispatches to the selected command.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use curabridge_cli::Cli;
use curabridge_core::BridgeConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match BridgeConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    init_logging(&config);
    tracing::debug!("Cura Bridge v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = cli.execute(config).await {
        tracing::debug!(kind = %e.kind, "Command failed");
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

/// Initialize tracing/logging
fn init_logging(config: &BridgeConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        "pretty" => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .compact()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
