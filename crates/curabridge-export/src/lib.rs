//! # Cura Bridge Export
//!
//! Everything that happens before the slicer is started: reading the scene,
//! picking the selection, resolving the output path inside the scratch
//! export directory and writing the STL file.
//!
//! ## Export directory
//!
//! The export directory only ever holds the most recent STL. It is wiped and
//! recreated before each export and by the `clean` command, so repeated
//! exports of the same document can safely reuse one file name.

pub mod error;
pub mod exporter;
pub mod lifecycle;
pub mod path;
pub mod scene;

pub use error::{ExportError, SceneError};
pub use exporter::{ExportSummary, MeshExporter, StlExporter};
pub use lifecycle::{ensure_export_dir, reset_export_dir, wipe_export_dir};
pub use path::{resolve_export_path, sanitize_object_name};
pub use scene::{Scene, SceneObject, Selection};
