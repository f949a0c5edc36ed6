//! Error types for scene loading and STL export.

use std::path::PathBuf;

use curabridge_core::error::{BridgeError, ErrorKind};
use thiserror::Error;

/// Errors from reading a scene or selecting objects in it.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Scene file not found.
    #[error("scene file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Malformed OBJ content.
    #[error("invalid OBJ at line {line}: {message}")]
    InvalidObj {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        message: String,
    },

    /// A face references a vertex that does not exist.
    #[error("face at line {line} references vertex {index}, but only {count} are defined")]
    VertexOutOfRange {
        /// 1-based line number.
        line: usize,
        /// Index as written in the file.
        index: i64,
        /// Number of vertices defined so far.
        count: usize,
    },

    /// An object was requested by name but the scene has none by that name.
    #[error("no object named '{name}' in scene")]
    UnknownObject {
        /// Requested name.
        name: String,
    },

    /// The selection holds no mesh object.
    #[error("Select a mesh object to export.")]
    NoMeshSelected,

    /// I/O error while reading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the mesh exporter.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Forward and up axes point along the same line.
    #[error("forward axis {forward} and up axis {up} are collinear")]
    CollinearAxes {
        /// Forward axis label.
        forward: String,
        /// Up axis label.
        up: String,
    },

    /// Nothing to write.
    #[error("selection contains no triangles")]
    NoTriangles,

    /// Binary STL stores the facet count as u32.
    #[error("{count} triangles exceed the binary STL limit")]
    TooManyTriangles {
        /// Triangle count.
        count: usize,
    },

    /// I/O error while writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SceneError> for BridgeError {
    fn from(err: SceneError) -> Self {
        let kind = match &err {
            SceneError::UnknownObject { .. } | SceneError::NoMeshSelected => ErrorKind::Selection,
            SceneError::InvalidObj { .. } | SceneError::VertexOutOfRange { .. } => {
                ErrorKind::Parse
            }
            SceneError::FileNotFound { .. } | SceneError::Io(_) => ErrorKind::Io,
        };
        BridgeError::with_source(kind, err.to_string(), err)
    }
}

impl From<ExportError> for BridgeError {
    fn from(err: ExportError) -> Self {
        BridgeError::with_source(ErrorKind::Export, format!("STL export failed: {err}"), err)
    }
}
