//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use curabridge_core::BridgeConfig;
use curabridge_launch::{HostEnvironment, HostOs};

/// Two objects: a cube mesh and an empty helper.
pub const SCENE_OBJ: &str = "\
o Cube
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
f 1 2 3 4
f 1 2 5
o Empty
";

/// Scratch workspace for one test
pub struct TestEnv {
    /// Keeps the directory alive
    pub temp: TempDir,
    /// Directory holding fake executables
    pub bin_dir: PathBuf,
    /// Export directory handed to the config
    pub export_dir: PathBuf,
}

impl TestEnv {
    /// Create an empty scratch workspace
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let bin_dir = temp.path().join("bin");
        std::fs::create_dir_all(&bin_dir).expect("Failed to create bin dir");
        let export_dir = temp.path().join("CuraBridge");
        Self {
            temp,
            bin_dir,
            export_dir,
        }
    }

    /// Root of the scratch workspace
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Write the sample scene and return its path
    pub fn write_scene(&self, name: &str) -> PathBuf {
        let path = self.root().join(name);
        std::fs::write(&path, SCENE_OBJ).expect("Failed to write scene");
        path
    }

    /// Config that exports into this workspace with a short grace period
    pub fn config(&self) -> BridgeConfig {
        let mut config = BridgeConfig {
            export_dir: Some(self.export_dir.clone()),
            ..Default::default()
        };
        config.launch.grace_period_ms = 300;
        config.launch.log_dir = Some(self.root().join("logs"));
        config
    }

    /// Linux host whose PATH only contains the fake bin dir
    pub fn linux_host(&self, extra: &[(&str, &str)]) -> HostEnvironment {
        let mut vars = HashMap::from([
            ("PATH".to_string(), self.bin_dir.display().to_string()),
            ("HOME".to_string(), self.root().display().to_string()),
        ]);
        for (k, v) in extra {
            vars.insert(k.to_string(), v.to_string());
        }
        HostEnvironment::new(HostOs::Linux, vars)
    }

    /// Files currently in the export directory
    pub fn exported_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.export_dir) {
            Ok(entries) => entries.filter_map(|e| e.ok().map(|e| e.path())).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Script that keeps running past the grace period
#[cfg(unix)]
pub const LONG_RUNNING: &str = "#!/bin/sh\nexec sleep 3\n";

/// Script that fails immediately
#[cfg(unix)]
pub const QUICK_EXIT: &str = "#!/bin/sh\necho 'cannot open display' >&2\nexit 1\n";

/// Write an executable shell script
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).expect("Failed to write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to chmod script");
    path
}
