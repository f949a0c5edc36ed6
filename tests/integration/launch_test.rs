//! Integration tests for the slicer launch fallback chain.

#![cfg(unix)]

mod helpers;

use std::collections::HashMap;

use curabridge_core::LaunchConfig;
use curabridge_launch::{AttemptOutcome, HostOs, LaunchStrategy, SlicerLauncher, launch_slicer};
use helpers::{LONG_RUNNING, QUICK_EXIT, TestEnv, write_script};

fn launch_config() -> LaunchConfig {
    LaunchConfig {
        grace_period_ms: 300,
        capture_output: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_quick_exit_without_fallbacks_reports_failure() {
    let env = TestEnv::new();
    let slicer = write_script(&env.bin_dir, "broken-cura", QUICK_EXIT);
    let stl = env.root().join("part.stl");

    let hints = HashMap::from([("PATH".to_string(), env.root().join("empty").display().to_string())]);
    let launched = launch_slicer(&stl, Some(&slicer), HostOs::Linux, hints).await;

    assert!(!launched);
}

#[tokio::test]
async fn test_running_configured_slicer_stops_the_chain() {
    let env = TestEnv::new();
    let slicer = write_script(&env.bin_dir, "my-cura", LONG_RUNNING);
    let stl = env.root().join("part.stl");

    let launcher = SlicerLauncher::new(launch_config(), env.linux_host(&[]))
        .with_configured_path(Some(slicer));
    let report = launcher.launch(&stl).await;

    assert!(report.launched());
    assert_eq!(report.attempts.len(), 1);
    assert_eq!(report.launched_by, Some(LaunchStrategy::ConfiguredExecutable));
    assert!(matches!(
        report.attempts[0].outcome,
        AttemptOutcome::Launched { pid: Some(_) }
    ));
}

#[tokio::test]
async fn test_falls_back_to_binary_on_path() {
    let env = TestEnv::new();
    let configured = write_script(env.root(), "broken-cura", QUICK_EXIT);
    write_script(&env.bin_dir, "cura", LONG_RUNNING);
    let stl = env.root().join("part.stl");

    let launcher = SlicerLauncher::new(launch_config(), env.linux_host(&[]))
        .with_configured_path(Some(configured));
    let report = launcher.launch(&stl).await;

    assert_eq!(report.launched_by, Some(LaunchStrategy::DirectBinary));
    let strategies: Vec<_> = report.attempts.iter().map(|a| a.strategy).collect();
    assert_eq!(
        strategies,
        vec![
            LaunchStrategy::ConfiguredExecutable,
            LaunchStrategy::SandboxHostSpawn,
            LaunchStrategy::DirectBinary,
        ]
    );
    assert!(matches!(
        report.attempts[0].outcome,
        AttemptOutcome::Failed { .. }
    ));
    assert!(matches!(
        report.attempts[1].outcome,
        AttemptOutcome::NotApplicable { .. }
    ));
}

#[tokio::test]
async fn test_sandbox_uses_host_spawn_helper() {
    let env = TestEnv::new();
    write_script(&env.bin_dir, "flatpak-spawn", LONG_RUNNING);
    let stl = env.root().join("part.stl");

    let launcher = SlicerLauncher::new(
        launch_config(),
        env.linux_host(&[("FLATPAK_ID", "org.blender.Blender")]),
    );
    let report = launcher.launch(&stl).await;

    assert_eq!(report.launched_by, Some(LaunchStrategy::SandboxHostSpawn));
    assert_eq!(report.attempted().count(), 1);
}

#[tokio::test]
async fn test_failure_reason_carries_stderr() {
    let env = TestEnv::new();
    let configured = write_script(&env.bin_dir, "broken-cura", QUICK_EXIT);
    let config = LaunchConfig {
        capture_output: true,
        log_dir: Some(env.root().join("logs")),
        ..launch_config()
    };

    let report = SlicerLauncher::new(config, env.linux_host(&[]))
        .with_configured_path(Some(configured))
        .launch(&env.root().join("part.stl"))
        .await;

    assert!(!report.launched());
    let AttemptOutcome::Failed { reason } = &report.attempts[0].outcome else {
        panic!("expected failure, got {:?}", report.attempts[0].outcome);
    };
    assert!(reason.contains("cannot open display"), "reason: {reason}");
}
