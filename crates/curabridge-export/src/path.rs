//! Output path resolution for exported STL files.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::lifecycle::ensure_export_dir;

/// Timestamp suffix format, second precision.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name used when an object name sanitizes to nothing.
const UNNAMED: &str = "unnamed";

/// Resolve the STL path for an export.
///
/// A saved document reuses its file stem (`{dir}/{stem}.stl`), so repeated
/// exports of the same document overwrite one file. Without a document the
/// object name and the current local time are used
/// (`{dir}/{name}_{YYYYMMDD_HHMMSS}.stl`).
///
/// Creates `export_dir` if needed; that is the only failure.
pub fn resolve_export_path(
    document_path: Option<&Path>,
    object_name: &str,
    export_dir: &Path,
) -> std::io::Result<PathBuf> {
    resolve_export_path_at(
        document_path,
        object_name,
        export_dir,
        Local::now().naive_local(),
    )
}

/// [`resolve_export_path`] with an explicit clock reading.
pub fn resolve_export_path_at(
    document_path: Option<&Path>,
    object_name: &str,
    export_dir: &Path,
    now: NaiveDateTime,
) -> std::io::Result<PathBuf> {
    ensure_export_dir(export_dir)?;

    if let Some(stem) = document_path.and_then(document_stem) {
        return Ok(export_dir.join(format!("{stem}.stl")));
    }

    let safe = sanitize_object_name(object_name);
    let ts = now.format(TIMESTAMP_FORMAT);
    Ok(export_dir.join(format!("{safe}_{ts}.stl")))
}

fn document_stem(path: &Path) -> Option<String> {
    if path.as_os_str().is_empty() {
        return None;
    }
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}

/// Make an object name safe for any filesystem.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`. The length in
/// characters is kept, so safe prefixes of the input survive unchanged.
pub fn sanitize_object_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if sanitized.is_empty() {
        UNNAMED.to_string()
    } else {
        sanitized
    }
}
