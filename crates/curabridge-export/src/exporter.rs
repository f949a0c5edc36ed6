//! STL export of selected scene objects.
//!
//! # Binary Format
//!
//! ```text
//! UINT8[80]    – Header
//! UINT32       – Number of triangles
//! foreach triangle
//!     REAL32[3] – Normal vector
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute byte count (0)
//! end
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use curabridge_core::config::export::ExportSettings;
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ExportError;
use crate::scene::{Scene, SceneObject};

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Text placed at the start of binary headers.
const HEADER_TEXT: &[u8] = b"Binary STL written by Cura Bridge";

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    /// Written file.
    pub path: PathBuf,
    /// Number of facets written.
    pub triangles: usize,
    /// Number of objects exported.
    pub objects: usize,
    /// File size in bytes.
    pub bytes: u64,
    /// Whether the file is ASCII STL.
    pub ascii: bool,
    /// Effective scale applied to coordinates.
    pub effective_scale: f64,
}

/// Writes the selected objects of a scene to an STL file.
pub trait MeshExporter {
    /// Export `objects` of `scene` to `path`.
    fn export(
        &self,
        scene: &Scene,
        objects: &[&SceneObject],
        path: &Path,
        settings: &ExportSettings,
    ) -> Result<ExportSummary, ExportError>;
}

/// Built-in STL writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StlExporter;

impl StlExporter {
    /// Create a new exporter.
    pub fn new() -> Self {
        Self
    }
}

impl MeshExporter for StlExporter {
    fn export(
        &self,
        scene: &Scene,
        objects: &[&SceneObject],
        path: &Path,
        settings: &ExportSettings,
    ) -> Result<ExportSummary, ExportError> {
        let rotation = axis_conversion(settings)?;
        let effective_scale = if settings.use_scene_unit {
            settings.scale * scene.unit_scale
        } else {
            settings.scale
        };

        // OBJ sources have no modifier stack, so evaluated geometry is the base mesh.
        debug!(
            apply_modifiers = settings.apply_modifiers,
            "Using base geometry"
        );

        let transform = rotation * effective_scale;
        let meshes: Vec<&SceneObject> = objects.iter().copied().filter(|o| o.is_mesh()).collect();
        let triangles: Vec<[Vector3<f64>; 3]> = meshes
            .iter()
            .flat_map(|object| object.faces.iter())
            .map(|&[a, b, c]| {
                [a, b, c].map(|i| transform * scene.vertices[i as usize].coords)
            })
            .collect();

        if triangles.is_empty() {
            return Err(ExportError::NoTriangles);
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        if settings.ascii {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "mesh".to_string());
            write_ascii(&mut writer, &name, &triangles)?;
        } else {
            write_binary(&mut writer, &triangles)?;
        }
        writer.flush()?;
        drop(writer);

        let bytes = std::fs::metadata(path)?.len();

        info!(
            path = %path.display(),
            triangles = triangles.len(),
            objects = meshes.len(),
            ascii = settings.ascii,
            scale = effective_scale,
            "STL exported"
        );

        Ok(ExportSummary {
            path: path.to_path_buf(),
            triangles: triangles.len(),
            objects: meshes.len(),
            bytes,
            ascii: settings.ascii,
            effective_scale,
        })
    }
}

/// Rotation taking scene axes (forward +Y, up +Z) to the requested axes.
fn axis_conversion(settings: &ExportSettings) -> Result<Matrix3<f64>, ExportError> {
    if settings.forward_axis.is_collinear_with(settings.up_axis) {
        return Err(ExportError::CollinearAxes {
            forward: settings.forward_axis.to_string(),
            up: settings.up_axis.to_string(),
        });
    }

    let forward = Vector3::from(settings.forward_axis.unit());
    let up = Vector3::from(settings.up_axis.unit());
    let right = forward.cross(&up);
    Ok(Matrix3::from_columns(&[right, forward, up]))
}

fn facet_normal(tri: &[Vector3<f64>; 3]) -> Vector3<f64> {
    let normal = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
    let len = normal.norm();
    if len > f64::EPSILON {
        normal / len
    } else {
        Vector3::zeros()
    }
}

fn write_binary<W: Write>(writer: &mut W, triangles: &[[Vector3<f64>; 3]]) -> Result<(), ExportError> {
    let count = u32::try_from(triangles.len()).map_err(|_| ExportError::TooManyTriangles {
        count: triangles.len(),
    })?;

    let mut header = [b' '; HEADER_SIZE];
    header[..HEADER_TEXT.len()].copy_from_slice(HEADER_TEXT);
    writer.write_all(&header)?;
    writer.write_all(&count.to_le_bytes())?;

    for tri in triangles {
        write_vector_binary(writer, &facet_normal(tri))?;
        for v in tri {
            write_vector_binary(writer, v)?;
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn write_vector_binary<W: Write>(writer: &mut W, v: &Vector3<f64>) -> Result<(), ExportError> {
    writer.write_all(&(v.x as f32).to_le_bytes())?;
    writer.write_all(&(v.y as f32).to_le_bytes())?;
    writer.write_all(&(v.z as f32).to_le_bytes())?;
    Ok(())
}

fn write_ascii<W: Write>(
    writer: &mut W,
    name: &str,
    triangles: &[[Vector3<f64>; 3]],
) -> Result<(), ExportError> {
    writeln!(writer, "solid {name}")?;
    for tri in triangles {
        let n = facet_normal(tri);
        writeln!(writer, "  facet normal {:.6e} {:.6e} {:.6e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for v in tri {
            writeln!(writer, "      vertex {:.6e} {:.6e} {:.6e}", v.x, v.y, v.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {name}")?;
    Ok(())
}
