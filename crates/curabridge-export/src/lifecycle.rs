//! Export directory lifecycle: wipe and recreate.
//!
//! Cleanup is best effort. Failing to pre-clean must never block an export,
//! so [`wipe_export_dir`] and [`reset_export_dir`] log and swallow errors.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

/// Create the export directory and its parents. Idempotent.
///
/// Fails only on unrecoverable I/O, e.g. when `path` is an existing file.
pub fn ensure_export_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Remove the export directory and everything in it, ignoring errors.
///
/// Read-only entries are made writable and the removal retried once.
pub fn wipe_export_dir(path: &Path) {
    if !path.is_dir() {
        debug!(dir = %path.display(), "Export directory absent, nothing to wipe");
        return;
    }

    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!(dir = %path.display(), "Export directory wiped");
            return;
        }
        Err(e) => {
            debug!(
                dir = %path.display(),
                error = %e,
                "Wipe failed, clearing read-only flags and retrying"
            );
        }
    }

    make_tree_writable(path);

    if let Err(e) = fs::remove_dir_all(path) {
        warn!(
            dir = %path.display(),
            error = %e,
            "Failed to wipe export directory"
        );
    }
}

/// Wipe then recreate the export directory, ignoring errors.
pub fn reset_export_dir(path: &Path) {
    wipe_export_dir(path);
    match ensure_export_dir(path) {
        Ok(()) => info!(dir = %path.display(), "Export directory cleaned"),
        Err(e) => warn!(
            dir = %path.display(),
            error = %e,
            "Failed to recreate export directory"
        ),
    }
}

fn make_tree_writable(dir: &Path) {
    make_writable(dir);

    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Cannot list directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            make_tree_writable(&path);
        } else {
            make_writable(&path);
        }
    }
}

#[cfg(unix)]
fn make_writable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let Ok(metadata) = fs::symlink_metadata(path) else {
        return;
    };
    if metadata.file_type().is_symlink() {
        return;
    }
    let mode = metadata.permissions().mode() | 0o700;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
        debug!(path = %path.display(), error = %e, "Cannot change permissions");
    }
}

#[cfg(not(unix))]
fn make_writable(path: &Path) {
    let Ok(metadata) = fs::metadata(path) else {
        return;
    };
    let mut permissions = metadata.permissions();
    if permissions.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        if let Err(e) = fs::set_permissions(path, permissions) {
            debug!(path = %path.display(), error = %e, "Cannot change permissions");
        }
    }
}
