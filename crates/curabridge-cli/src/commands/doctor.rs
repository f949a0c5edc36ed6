//! `doctor`: show how the slicer would be launched on this machine.

use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use curabridge_core::{BridgeConfig, BridgeResult};
use curabridge_launch::{HostEnvironment, SlicerLauncher};

/// Placeholder file name used when planning invocations.
const SAMPLE_FILE: &str = "model.stl";

/// One row of the strategy table.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct StrategyRow {
    /// Position in the fallback chain.
    #[tabled(rename = "#")]
    pub order: usize,
    /// Strategy name.
    #[tabled(rename = "Strategy")]
    pub strategy: String,
    /// Whether the strategy would be tried.
    #[tabled(rename = "Applies")]
    pub applies: bool,
    /// Planned command line, or why the strategy is skipped.
    #[tabled(rename = "Command / Reason")]
    pub detail: String,
}

/// Build the strategy table for `launcher`.
pub fn strategy_rows(launcher: &SlicerLauncher) -> Vec<StrategyRow> {
    let sample = launcher
        .host()
        .home_dir()
        .unwrap_or_default()
        .join(SAMPLE_FILE);

    launcher
        .preview(&sample)
        .into_iter()
        .enumerate()
        .map(|(i, (strategy, plan))| {
            let (applies, detail) = match plan {
                Ok(invocation) => (true, invocation.command_line()),
                Err(reason) => (false, reason),
            };
            StrategyRow {
                order: i + 1,
                strategy: strategy.to_string(),
                applies,
                detail,
            }
        })
        .collect()
}

/// Execute the doctor command
pub fn execute(config: &BridgeConfig, format: OutputFormat) -> BridgeResult<()> {
    let host = HostEnvironment::current();
    let launcher = SlicerLauncher::new(config.launch.clone(), host)
        .with_configured_path(config.configured_slicer_path().map(|p| p.to_path_buf()));
    let rows = strategy_rows(&launcher);

    if format == OutputFormat::Table {
        let host = launcher.host();
        output::print_header(&config.tab_name);
        output::print_kv("Host OS", &host.os.to_string());
        output::print_kv("Sandboxed", &host.is_sandboxed().to_string());
        output::print_kv(
            "Export directory",
            &config.effective_export_dir().display().to_string(),
        );
        output::print_kv(
            "Grace period",
            &format!("{} ms", config.launch.grace_period_ms),
        );
        if !rows.iter().any(|r| r.applies) {
            output::print_warning("No launch strategy applies; set slicer_path.");
        }
    }

    output::print_list(&rows, format);
    Ok(())
}
