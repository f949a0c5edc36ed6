//! Integration tests for the export-and-launch pipeline.

mod helpers;

use std::path::{Path, PathBuf};

use curabridge_cli::commands::send::{SendArgs, send};
use curabridge_core::{ErrorKind, ExportSettings};
use curabridge_export::error::ExportError;
use curabridge_export::{ExportSummary, MeshExporter, Scene, SceneObject, StlExporter};
use helpers::TestEnv;

fn args(scene: PathBuf) -> SendArgs {
    SendArgs {
        scene,
        no_launch: true,
        ..Default::default()
    }
}

/// Exporter that always fails.
struct FailingExporter;

impl MeshExporter for FailingExporter {
    fn export(
        &self,
        _scene: &Scene,
        _objects: &[&SceneObject],
        _path: &Path,
        _settings: &ExportSettings,
    ) -> Result<ExportSummary, ExportError> {
        Err(ExportError::NoTriangles)
    }
}

#[tokio::test]
async fn test_export_names_file_after_document() {
    let env = TestEnv::new();
    let scene = env.write_scene("bracket.obj");

    let outcome = send(&args(scene), &env.config(), env.linux_host(&[]), &StlExporter::new())
        .await
        .expect("send");

    assert_eq!(outcome.export.path, env.export_dir.join("bracket.stl"));
    assert_eq!(outcome.export.triangles, 3);
    assert_eq!(outcome.export.objects, 1);
    assert_eq!(outcome.export.bytes, 84 + 50 * 3);
    assert!(outcome.launch.is_none());
    assert_eq!(env.exported_files(), vec![env.export_dir.join("bracket.stl")]);
}

#[tokio::test]
async fn test_document_override_and_stale_files_are_wiped() {
    let env = TestEnv::new();
    std::fs::create_dir_all(env.export_dir.join("old")).expect("mkdir");
    std::fs::write(env.export_dir.join("previous.stl"), b"solid old").expect("write");
    let scene = env.write_scene("scene.obj");

    let send_args = SendArgs {
        document: Some(PathBuf::from("/projects/widget.blend")),
        ..args(scene)
    };
    let outcome = send(&send_args, &env.config(), env.linux_host(&[]), &StlExporter::new())
        .await
        .expect("send");

    assert_eq!(outcome.export.path, env.export_dir.join("widget.stl"));
    assert_eq!(env.exported_files(), vec![env.export_dir.join("widget.stl")]);
}

#[tokio::test]
async fn test_unknown_object_is_a_selection_error() {
    let env = TestEnv::new();
    let scene = env.write_scene("scene.obj");

    let send_args = SendArgs {
        objects: vec!["Sphere".to_string()],
        ..args(scene)
    };
    let err = send(&send_args, &env.config(), env.linux_host(&[]), &StlExporter::new())
        .await
        .expect_err("unknown object");

    assert_eq!(err.kind, ErrorKind::Selection);
    assert_eq!(err.exit_code(), 1);
    assert!(env.exported_files().is_empty());
}

#[tokio::test]
async fn test_selection_without_mesh_exports_nothing() {
    let env = TestEnv::new();
    let scene = env.write_scene("scene.obj");

    let send_args = SendArgs {
        objects: vec!["Empty".to_string()],
        ..args(scene)
    };
    let err = send(&send_args, &env.config(), env.linux_host(&[]), &StlExporter::new())
        .await
        .expect_err("no mesh");

    assert_eq!(err.kind, ErrorKind::Selection);
    assert_eq!(err.message, "Select a mesh object to export.");
    assert!(env.exported_files().is_empty());
}

#[tokio::test]
async fn test_exporter_failure_skips_launch() {
    let env = TestEnv::new();
    let scene = env.write_scene("scene.obj");
    let send_args = SendArgs {
        no_launch: false,
        ..args(scene)
    };

    let err = send(&send_args, &env.config(), env.linux_host(&[]), &FailingExporter)
        .await
        .expect_err("export fails");

    assert_eq!(err.kind, ErrorKind::Export);
    assert!(err.message.starts_with("STL export failed"));
}

#[tokio::test]
async fn test_launch_exhaustion_keeps_stl() {
    let env = TestEnv::new();
    let scene = env.write_scene("part.obj");
    let send_args = SendArgs {
        no_launch: false,
        ..args(scene)
    };

    let outcome = send(&send_args, &env.config(), env.linux_host(&[]), &StlExporter::new())
        .await
        .expect("send");

    let report = outcome.launch.expect("launch attempted");
    assert!(!report.launched());
    assert!(outcome.export.path.is_file());

    let err: curabridge_core::BridgeError = report.into_result().expect_err("exhausted").into();
    assert_eq!(err.kind, ErrorKind::LaunchExhausted);
    assert_eq!(err.exit_code(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn test_send_launches_slicer_on_path() {
    use curabridge_launch::LaunchStrategy;

    let env = TestEnv::new();
    helpers::write_script(&env.bin_dir, "cura", helpers::LONG_RUNNING);
    let scene = env.write_scene("part.obj");
    let send_args = SendArgs {
        no_launch: false,
        ascii: true,
        ..args(scene)
    };
    let mut config = env.config();
    send_args.apply(&mut config);

    let outcome = send(&send_args, &config, env.linux_host(&[]), &StlExporter::new())
        .await
        .expect("send");

    assert!(outcome.export.ascii);
    let report = outcome.launch.expect("launch attempted");
    assert_eq!(report.launched_by, Some(LaunchStrategy::DirectBinary));
    assert_eq!(report.file, env.export_dir.join("part.stl"));

    let text = std::fs::read_to_string(&report.file).expect("read stl");
    assert!(text.starts_with("solid part"));
}

#[tokio::test]
async fn test_scene_inside_export_dir_is_refused_and_kept() {
    let env = TestEnv::new();
    std::fs::create_dir_all(&env.export_dir).expect("mkdir");
    let scene = env.export_dir.join("model.obj");
    std::fs::write(&scene, helpers::SCENE_OBJ).expect("write scene");

    let err = send(&args(scene.clone()), &env.config(), env.linux_host(&[]), &StlExporter::new())
        .await
        .expect_err("scene inside export dir");

    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(scene.is_file());
    assert_eq!(env.exported_files(), vec![scene]);
}

#[tokio::test]
async fn test_invalid_unit_scale_exports_nothing() {
    let env = TestEnv::new();
    let scene = env.write_scene("scene.obj");

    for unit_scale in [0.0, -1.0, f64::NAN] {
        let send_args = SendArgs {
            unit_scale: Some(unit_scale),
            ..args(scene.clone())
        };
        let err = send(&send_args, &env.config(), env.linux_host(&[]), &StlExporter::new())
            .await
            .expect_err("invalid unit scale");

        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(env.exported_files().is_empty());
    }
}

#[tokio::test]
async fn test_valid_unit_scale_reaches_exporter() {
    let env = TestEnv::new();
    let scene = env.write_scene("scene.obj");
    let send_args = SendArgs {
        unit_scale: Some(0.01),
        ..args(scene)
    };

    let outcome = send(&send_args, &env.config(), env.linux_host(&[]), &StlExporter::new())
        .await
        .expect("send");

    assert_eq!(outcome.export.effective_scale, 0.01);
}
