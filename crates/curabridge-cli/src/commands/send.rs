//! `send`: wipe the export directory, export the selection, start the slicer.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::output::{self, OutputFormat};
use curabridge_core::config::absolutize;
use curabridge_core::{Axis, BridgeConfig, BridgeError, BridgeResult};
use curabridge_export::{
    ExportSummary, MeshExporter, Scene, StlExporter, reset_export_dir, resolve_export_path,
};
use curabridge_launch::{AttemptOutcome, HostEnvironment, LaunchReport, SlicerLauncher};

/// Scene argument value that reads OBJ from stdin.
const STDIN_MARKER: &str = "-";

/// Arguments for the send command
#[derive(Debug, Clone, Default, Args)]
pub struct SendArgs {
    /// OBJ scene to export, or `-` to read from stdin
    pub scene: PathBuf,

    /// Object to export (repeatable); all objects when omitted
    #[arg(short, long = "object")]
    pub objects: Vec<String>,

    /// Document path used to name the STL (defaults to the scene file)
    #[arg(long)]
    pub document: Option<PathBuf>,

    /// Scene unit scale
    #[arg(long)]
    pub unit_scale: Option<f64>,

    /// Global scale factor
    #[arg(long)]
    pub scale: Option<f64>,

    /// Write ASCII STL instead of binary
    #[arg(long)]
    pub ascii: bool,

    /// Do not apply modifiers
    #[arg(long)]
    pub no_modifiers: bool,

    /// Ignore the scene unit scale
    #[arg(long)]
    pub no_scene_unit: bool,

    /// Forward axis (X, Y, Z, -X, -Y, -Z)
    #[arg(long, allow_hyphen_values = true)]
    pub forward: Option<Axis>,

    /// Up axis (X, Y, Z, -X, -Y, -Z)
    #[arg(long, allow_hyphen_values = true)]
    pub up: Option<Axis>,

    /// Slicer executable, overriding the configuration
    #[arg(long)]
    pub slicer: Option<PathBuf>,

    /// Export directory, overriding the configuration
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Grace period in milliseconds for detecting an immediate exit
    #[arg(long)]
    pub grace_ms: Option<u64>,

    /// Export only; do not start the slicer
    #[arg(long)]
    pub no_launch: bool,
}

impl SendArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut BridgeConfig) {
        if let Some(scale) = self.scale {
            config.export.scale = scale;
        }
        if self.ascii {
            config.export.ascii = true;
        }
        if self.no_modifiers {
            config.export.apply_modifiers = false;
        }
        if self.no_scene_unit {
            config.export.use_scene_unit = false;
        }
        if let Some(axis) = self.forward {
            config.export.forward_axis = axis;
        }
        if let Some(axis) = self.up {
            config.export.up_axis = axis;
        }
        if let Some(ref path) = self.slicer {
            config.slicer_path = Some(path.clone());
        }
        if let Some(ref dir) = self.export_dir {
            config.export_dir = Some(dir.clone());
        }
        if let Some(ms) = self.grace_ms {
            config.launch.grace_period_ms = ms;
        }
    }
}

/// Result of a send action.
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    /// What was exported.
    pub export: ExportSummary,
    /// Launch attempts; `None` when launching was skipped.
    pub launch: Option<LaunchReport>,
}

/// Execute the send command
pub async fn execute(
    args: &SendArgs,
    mut config: BridgeConfig,
    format: OutputFormat,
) -> BridgeResult<()> {
    args.apply(&mut config);
    config.validate()?;

    let outcome = send(args, &config, HostEnvironment::current(), &StlExporter::new()).await?;

    match format {
        OutputFormat::Table => print_outcome(&config.tab_name, &outcome),
        OutputFormat::Json => output::print_json(&outcome),
    }

    if let Some(report) = outcome.launch {
        report.into_result()?;
        if format == OutputFormat::Table {
            output::print_success("Cura launched; STL sent.");
        }
    }
    Ok(())
}

/// Run one export-and-launch action.
///
/// The scene is read before the export directory is reset, and a scene
/// stored inside that directory is refused. Selection and export failures
/// abort before launching. Launch exhaustion is not an error here: the
/// report says so and the STL stays on disk.
pub async fn send(
    args: &SendArgs,
    config: &BridgeConfig,
    host: HostEnvironment,
    exporter: &dyn MeshExporter,
) -> BridgeResult<SendOutcome> {
    let mut scene = read_scene(&args.scene)?;
    if let Some(unit_scale) = args.unit_scale {
        scene.unit_scale = check_unit_scale(unit_scale)?;
    }

    let export_dir = config.effective_export_dir();
    if let Some(source) = scene.source.as_deref().filter(|s| is_within(s, &export_dir)) {
        return Err(BridgeError::validation(format!(
            "scene '{}' is inside the export directory '{}', which is wiped before each export",
            source.display(),
            export_dir.display()
        )));
    }
    reset_export_dir(&export_dir);

    let selection = scene.select(&args.objects)?;
    let meshes: Vec<_> = selection.meshes().collect();
    let active_name = selection.active().map(|o| o.name.as_str()).unwrap_or_default();

    let document = args.document.as_deref().or(scene.source.as_deref());
    let stl_path = resolve_export_path(document, active_name, &export_dir)?;
    info!(path = %stl_path.display(), "Export target resolved");

    let export = exporter.export(&scene, &meshes, &stl_path, &config.export)?;

    if args.no_launch {
        return Ok(SendOutcome {
            export,
            launch: None,
        });
    }

    let launcher = SlicerLauncher::new(config.launch.clone(), host)
        .with_configured_path(config.configured_slicer_path().map(Path::to_path_buf));
    let report = launcher.launch(&export.path).await;

    Ok(SendOutcome {
        export,
        launch: Some(report),
    })
}

fn read_scene(path: &Path) -> BridgeResult<Scene> {
    if path.as_os_str() == STDIN_MARKER {
        return Ok(Scene::from_obj_reader(std::io::stdin().lock(), "Object")?);
    }
    Ok(Scene::load(path)?)
}

/// A unit scale must be a finite, positive number.
fn check_unit_scale(value: f64) -> BridgeResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(BridgeError::validation(format!(
            "unit scale must be a finite number greater than zero, got {value}"
        )))
    }
}

/// Whether `path` resolves to a location under `dir`.
fn is_within(path: &Path, dir: &Path) -> bool {
    let path = std::fs::canonicalize(path).unwrap_or_else(|_| absolutize(path));
    let dir = std::fs::canonicalize(dir).unwrap_or_else(|_| absolutize(dir));
    path.starts_with(dir)
}

fn print_outcome(title: &str, outcome: &SendOutcome) {
    output::print_header(title);
    output::print_kv("STL", &outcome.export.path.display().to_string());
    output::print_kv("Objects", &outcome.export.objects.to_string());
    output::print_kv("Triangles", &outcome.export.triangles.to_string());
    output::print_kv("Size", &format!("{} bytes", outcome.export.bytes));
    output::print_kv(
        "Format",
        if outcome.export.ascii { "ASCII" } else { "binary" },
    );

    let Some(report) = &outcome.launch else {
        output::print_warning("Launch skipped; STL exported only.");
        return;
    };

    for attempt in &report.attempts {
        let status = match &attempt.outcome {
            AttemptOutcome::Launched { pid: Some(pid) } => format!("launched (pid {pid})"),
            AttemptOutcome::Launched { pid: None } => "launched".to_string(),
            AttemptOutcome::Failed { reason } => format!("failed: {reason}"),
            AttemptOutcome::NotApplicable { reason } => format!("skipped: {reason}"),
        };
        output::print_kv(&attempt.strategy.to_string(), &status);
    }
}
