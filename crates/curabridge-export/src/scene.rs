//! Scene source: named mesh objects read from Wavefront OBJ.
//!
//! `o` lines start objects. `g` lines start objects only in files that never
//! use `o`. Polygons are fan-triangulated. An object that ends up without
//! faces (points, lines, empty groups) is kept but is not a mesh.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use nalgebra::Point3;

use crate::error::SceneError;

/// Fallback name for geometry that appears before any `o` line.
const DEFAULT_OBJECT_NAME: &str = "Object";

/// One named object in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// Object name as written in the source.
    pub name: String,
    /// Triangles as indices into [`Scene::vertices`].
    pub faces: Vec<[u32; 3]>,
}

impl SceneObject {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            faces: Vec::new(),
        }
    }

    /// Whether this object carries mesh geometry.
    pub fn is_mesh(&self) -> bool {
        !self.faces.is_empty()
    }
}

/// A loaded scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Shared vertex pool.
    pub vertices: Vec<Point3<f64>>,
    /// Objects in file order.
    pub objects: Vec<SceneObject>,
    /// Scene unit scale applied when exporting with scene units.
    pub unit_scale: f64,
    /// File the scene was read from; `None` for stdin.
    pub source: Option<PathBuf>,
}

/// Objects picked for export.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    objects: Vec<&'a SceneObject>,
}

impl<'a> Selection<'a> {
    /// Selected mesh objects.
    pub fn meshes(&self) -> impl Iterator<Item = &'a SceneObject> + '_ {
        self.objects.iter().copied().filter(|o| o.is_mesh())
    }

    /// The object whose name identifies an unsaved export.
    pub fn active(&self) -> Option<&'a SceneObject> {
        self.meshes().next()
    }

    /// Every selected object, mesh or not.
    pub fn objects(&self) -> &[&'a SceneObject] {
        &self.objects
    }
}

impl Scene {
    /// Read a scene from an OBJ file.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SceneError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                SceneError::Io(e)
            }
        })?;

        let default_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_OBJECT_NAME.to_string());

        let mut scene = Self::from_obj_reader(BufReader::new(file), &default_name)?;
        scene.source = Some(path.to_path_buf());
        Ok(scene)
    }

    /// Parse OBJ text. Unnamed leading geometry goes into `default_name`.
    pub fn from_obj_reader<R: BufRead>(reader: R, default_name: &str) -> Result<Self, SceneError> {
        let mut vertices: Vec<Point3<f64>> = Vec::new();
        let mut objects: Vec<SceneObject> = Vec::new();
        let mut uses_o = false;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };

            match keyword {
                "v" => vertices.push(parse_vertex(parts, line_no)?),
                "o" => {
                    uses_o = true;
                    objects.push(SceneObject::new(object_name(line, default_name)));
                }
                "g" if !uses_o => {
                    objects.push(SceneObject::new(object_name(line, default_name)));
                }
                "f" => {
                    let corners = parts
                        .map(|token| resolve_index(token, vertices.len(), line_no))
                        .collect::<Result<Vec<u32>, SceneError>>()?;
                    if corners.len() < 3 {
                        return Err(SceneError::InvalidObj {
                            line: line_no,
                            message: format!("face needs 3 vertices, got {}", corners.len()),
                        });
                    }

                    if objects.is_empty() {
                        objects.push(SceneObject::new(default_name));
                    }
                    let Some(target) = objects.last_mut() else {
                        continue;
                    };
                    for i in 1..corners.len() - 1 {
                        target.faces.push([corners[0], corners[i], corners[i + 1]]);
                    }
                }
                _ => {}
            }
        }

        Ok(Self {
            vertices,
            objects,
            unit_scale: 1.0,
            source: None,
        })
    }

    /// Find an object by exact name.
    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Select objects by name, or everything when `names` is empty.
    ///
    /// Fails when a name is unknown or when no selected object is a mesh.
    pub fn select(&self, names: &[String]) -> Result<Selection<'_>, SceneError> {
        let objects = if names.is_empty() {
            self.objects.iter().collect::<Vec<_>>()
        } else {
            names
                .iter()
                .map(|name| {
                    self.object(name).ok_or_else(|| SceneError::UnknownObject {
                        name: name.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let selection = Selection { objects };
        if selection.active().is_none() {
            return Err(SceneError::NoMeshSelected);
        }
        Ok(selection)
    }
}

fn object_name(line: &str, default_name: &str) -> String {
    let name = line[1..].trim();
    if name.is_empty() {
        default_name.to_string()
    } else {
        name.to_string()
    }
}

fn parse_vertex<'a>(
    parts: impl Iterator<Item = &'a str>,
    line_no: usize,
) -> Result<Point3<f64>, SceneError> {
    let coords = parts
        .take(3)
        .map(|t| {
            t.parse::<f64>().map_err(|_| SceneError::InvalidObj {
                line: line_no,
                message: format!("invalid coordinate '{t}'"),
            })
        })
        .collect::<Result<Vec<f64>, SceneError>>()?;

    match coords.as_slice() {
        [x, y, z] => Ok(Point3::new(*x, *y, *z)),
        _ => Err(SceneError::InvalidObj {
            line: line_no,
            message: "vertex needs 3 coordinates".to_string(),
        }),
    }
}

/// Resolve a face token (`v`, `v/vt`, `v//vn`, `v/vt/vn`) to a 0-based index.
fn resolve_index(token: &str, count: usize, line_no: usize) -> Result<u32, SceneError> {
    let raw = token.split('/').next().unwrap_or(token);
    let index: i64 = raw.parse().map_err(|_| SceneError::InvalidObj {
        line: line_no,
        message: format!("invalid face index '{token}'"),
    })?;

    let resolved = match index {
        i if i > 0 => i - 1,
        i if i < 0 => count as i64 + i,
        _ => -1,
    };

    if resolved < 0 || resolved >= count as i64 || resolved > u32::MAX as i64 {
        return Err(SceneError::VertexOutOfRange {
            line: line_no,
            index,
            count,
        });
    }
    Ok(resolved as u32)
}
