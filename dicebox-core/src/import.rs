/// Model import: file formats in, standardized indexed mesh out
use std::path::{Path, PathBuf};

use nalgebra::{Point3, Vector2, Vector3};

use crate::dedup::{MeshBuilder, VertexIdentity};
use crate::error::{AttributeKind, ImportError, ImportResult, MEMORY_SOURCE};
use crate::geometry::{Material, Mesh, Vertex};
use crate::obj::{self, MtlEntry, ObjDocument, ObjParseError};
use crate::stl::{self, Facet};

/// One triangle corner referring into the attribute arrays of a [`RawModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    pub position: usize,
    pub normal: Option<usize>,
    pub tex_coord: Option<usize>,
    pub material: Option<usize>,
}

impl Corner {
    pub fn at(position: usize) -> Self {
        Self {
            position,
            normal: None,
            tex_coord: None,
            material: None,
        }
    }
}

/// Attribute arrays plus a triangle-corner stream, as read from a source
#[derive(Debug, Clone, Default)]
pub struct RawModel {
    pub positions: Vec<Point3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub tex_coords: Vec<Vector2<f32>>,
    pub materials: Vec<Material>,
    pub diffuse_texture: Option<PathBuf>,
    pub corners: Vec<Corner>,
}

impl RawModel {
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.corners.iter().any(|corner| corner.normal.is_some())
    }

    pub fn has_tex_coords(&self) -> bool {
        !self.tex_coords.is_empty() && self.corners.iter().any(|corner| corner.tex_coord.is_some())
    }

    /// Resolve every corner into a vertex and deduplicate.
    ///
    /// Fails without producing a mesh if any corner points outside its array.
    pub fn to_mesh(&self, identity: VertexIdentity, path: &Path) -> ImportResult<Mesh> {
        if self.corners.len() % 3 != 0 {
            return Err(ImportError::IncompleteTriangle {
                path: path.to_path_buf(),
                corners: self.corners.len(),
            });
        }

        let out_of_range = |kind, index, len| ImportError::IndexOutOfRange {
            path: path.to_path_buf(),
            kind,
            index,
            len,
        };
        let fetch = |kind, index: Option<usize>, len: usize| match index {
            Some(index) if index >= len => Err(out_of_range(kind, index, len)),
            other => Ok(other),
        };

        let mut builder = MeshBuilder::with_capacity(identity, self.corners.len());
        for corner in &self.corners {
            let position = *self
                .positions
                .get(corner.position)
                .ok_or_else(|| out_of_range(AttributeKind::Position, corner.position, self.positions.len()))?;
            let normal = fetch(AttributeKind::Normal, corner.normal, self.normals.len())?
                .map_or_else(|| Vector3::zeros(), |index| self.normals[index]);
            let tex_coord = fetch(AttributeKind::TexCoord, corner.tex_coord, self.tex_coords.len())?
                .map_or_else(|| Vector2::zeros(), |index| self.tex_coords[index]);
            let material = fetch(AttributeKind::Material, corner.material, self.materials.len())?
                .map_or_else(Material::default, |index| self.materials[index]);

            builder.push(Vertex {
                position,
                normal,
                tex_coord,
                material,
            });
        }

        // Whole triangles were checked above.
        builder.build().ok_or_else(|| ImportError::IncompleteTriangle {
            path: path.to_path_buf(),
            corners: self.corners.len(),
        })
    }

    /// Build from a parsed OBJ document and the materials its libraries
    /// declare. Texture paths are resolved against `base_dir`.
    pub fn from_obj(doc: ObjDocument, libraries: &[MtlEntry], base_dir: &Path) -> Self {
        let materials = doc
            .material_names
            .iter()
            .map(|name| match libraries.iter().find(|entry| &entry.name == name) {
                Some(entry) => entry.material,
                None => {
                    log::warn!("Material `{}` is not defined, using the default", name);
                    Material::default()
                }
            })
            .collect();

        let diffuse_texture = libraries
            .iter()
            .filter(|entry| doc.material_names.contains(&entry.name))
            .find_map(|entry| entry.diffuse_map.as_ref())
            .map(|map| base_dir.join(map));

        let corners = doc
            .faces
            .iter()
            .flat_map(|face| {
                face.triangles().flat_map(move |triangle| {
                    triangle.map(|corner| Corner {
                        position: corner.position,
                        normal: corner.normal,
                        tex_coord: corner.tex_coord,
                        material: face.material,
                    })
                })
            })
            .collect();

        Self {
            positions: doc.positions,
            normals: doc.normals,
            tex_coords: doc.tex_coords,
            materials,
            diffuse_texture,
            corners,
        }
    }

    /// Every facet gets three fresh positions; deduplication merges them
    pub fn from_facets(facets: &[Facet]) -> Self {
        let mut raw = Self::default();
        for facet in facets {
            let normal = facet.has_normal().then(|| {
                raw.normals.push(facet.normal);
                raw.normals.len() - 1
            });
            for vertex in facet.vertices {
                raw.positions.push(vertex);
                raw.corners.push(Corner {
                    normal,
                    ..Corner::at(raw.positions.len() - 1)
                });
            }
        }
        raw
    }

    /// A cube with per-face normals, centered on the origin
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let mut raw = Self::default();
        for z in [-half, half] {
            for y in [-half, half] {
                for x in [-half, half] {
                    raw.positions.push(Point3::new(x, y, z));
                }
            }
        }

        // Corner positions are bit patterns: 1 = +x, 2 = +y, 4 = +z.
        let faces: [(Vector3<f32>, [usize; 4]); 6] = [
            (Vector3::new(0.0, 0.0, 1.0), [4, 5, 7, 6]),  // Front face
            (Vector3::new(0.0, 0.0, -1.0), [0, 2, 3, 1]), // Back face
            (Vector3::new(0.0, 1.0, 0.0), [2, 6, 7, 3]),  // Top face
            (Vector3::new(0.0, -1.0, 0.0), [0, 1, 5, 4]), // Bottom face
            (Vector3::new(1.0, 0.0, 0.0), [1, 3, 7, 5]),  // Right face
            (Vector3::new(-1.0, 0.0, 0.0), [0, 4, 6, 2]), // Left face
        ];
        for (normal, [a, b, c, d]) in faces {
            raw.normals.push(normal);
            let normal = Some(raw.normals.len() - 1);
            for position in [a, b, c, a, c, d] {
                raw.corners.push(Corner {
                    normal,
                    ..Corner::at(position)
                });
            }
        }
        raw
    }
}

/// Knobs for [`load_model`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportOptions {
    /// Center the model and scale its bounding-box diagonal to 2
    pub standardize: bool,
    pub identity: VertexIdentity,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            standardize: true,
            identity: VertexIdentity::Attributes,
        }
    }
}

/// A fully imported model, ready to be drawn once per die
#[derive(Debug, Clone)]
pub struct Model {
    pub mesh: Mesh,
    pub has_normals: bool,
    pub has_tex_coords: bool,
    pub diffuse_texture: Option<PathBuf>,
    pub source: PathBuf,
}

impl Model {
    /// Run dedup, standardization and normal synthesis on a raw model
    pub fn from_raw(raw: &RawModel, source: PathBuf, options: &ImportOptions) -> ImportResult<Self> {
        let mut mesh = raw.to_mesh(options.identity, &source)?;
        if options.standardize {
            mesh.standardize();
        }

        let has_normals = raw.has_normals();
        if !has_normals {
            let degenerate = mesh.compute_normals();
            if degenerate > 0 {
                log::warn!(
                    "{} vertices of {} only touch zero-area triangles and have no normal",
                    degenerate,
                    source.display()
                );
            }
        }

        log::info!(
            "Loaded {}: {} corners -> {} vertices, {} triangles",
            source.display(),
            raw.corners.len(),
            mesh.vertices().len(),
            mesh.triangle_count()
        );

        Ok(Self {
            mesh,
            has_normals,
            has_tex_coords: raw.has_tex_coords(),
            diffuse_texture: raw.diffuse_texture.clone(),
            source,
        })
    }

    /// The built-in die used when no model file is given
    pub fn cube() -> Self {
        let raw = RawModel::cube(2.0);
        let mut mesh = match raw.to_mesh(VertexIdentity::Attributes, Path::new(MEMORY_SOURCE)) {
            Ok(mesh) => mesh,
            Err(_) => Mesh::new(),
        };
        mesh.standardize();
        Self {
            mesh,
            has_normals: true,
            has_tex_coords: false,
            diffuse_texture: None,
            source: PathBuf::from(MEMORY_SOURCE),
        }
    }

    /// Import OBJ text held in memory. Material libraries are not resolved.
    pub fn from_obj_str(text: &str, options: &ImportOptions) -> ImportResult<Self> {
        let source = PathBuf::from(MEMORY_SOURCE);
        let doc = obj::parse_obj(text).map_err(|err| parse_error(&source, err))?;
        let raw = RawModel::from_obj(doc, &[], Path::new(""));
        Self::from_raw(&raw, source, options)
    }

    /// Import binary or ASCII STL bytes held in memory
    pub fn from_stl_bytes(data: &[u8], options: &ImportOptions) -> ImportResult<Self> {
        let source = PathBuf::from(MEMORY_SOURCE);
        let facets = stl::parse_stl(data).map_err(|err| ImportError::Stl {
            path: source.clone(),
            message: err.to_string(),
        })?;
        Self::from_raw(&RawModel::from_facets(&facets), source, options)
    }
}

/// Load a model file, picking the format from its extension.
///
/// The result is all or nothing: any failure leaves no partial model behind.
pub fn load_model(path: &Path, options: &ImportOptions) -> ImportResult<Model> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let raw = match extension.as_deref() {
        Some("obj") => read_obj(path)?,
        Some("stl") => {
            let data = std::fs::read(path).map_err(|source| io_error(path, source))?;
            let facets = stl::parse_stl(&data).map_err(|err| ImportError::Stl {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
            RawModel::from_facets(&facets)
        }
        _ => {
            return Err(ImportError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    Model::from_raw(&raw, path.to_path_buf(), options)
}

fn read_obj(path: &Path) -> ImportResult<RawModel> {
    let text = std::fs::read_to_string(path).map_err(|source| io_error(path, source))?;
    let doc = obj::parse_obj(&text).map_err(|err| parse_error(path, err))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

    let mut libraries = Vec::new();
    for lib in &doc.material_libs {
        let lib_path = base_dir.join(lib);
        // A missing material library only costs the colors.
        match std::fs::read_to_string(&lib_path) {
            Ok(text) => {
                let entries = obj::parse_mtl(&text).map_err(|err| parse_error(&lib_path, err))?;
                libraries.extend(entries);
            }
            Err(err) => log::warn!("Material library {} unavailable: {}", lib_path.display(), err),
        }
    }

    Ok(RawModel::from_obj(doc, &libraries, base_dir))
}

fn io_error(path: &Path, source: std::io::Error) -> ImportError {
    ImportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn parse_error(path: &Path, err: ObjParseError) -> ImportError {
    ImportError::Parse {
        path: path.to_path_buf(),
        line: err.line,
        message: err.message,
    }
}
