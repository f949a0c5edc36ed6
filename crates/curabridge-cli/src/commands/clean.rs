//! `clean`: empty the export directory.

use clap::Args;

use crate::output;
use curabridge_core::{BridgeConfig, BridgeResult};
use curabridge_export::{ensure_export_dir, wipe_export_dir};

/// Arguments for the clean command
#[derive(Debug, Clone, Default, Args)]
pub struct CleanArgs {
    /// Remove the directory itself instead of leaving it empty
    #[arg(long)]
    pub remove: bool,
}

/// Execute the clean command
pub fn execute(args: &CleanArgs, config: &BridgeConfig) -> BridgeResult<()> {
    let dir = config.effective_export_dir();
    wipe_export_dir(&dir);

    if args.remove {
        output::print_success(&format!("Removed '{}'", dir.display()));
    } else {
        ensure_export_dir(&dir)?;
        output::print_success(&format!("Emptied '{}'", dir.display()));
    }
    Ok(())
}
