/// Geometry primitives for 3D rendering
use nalgebra::{Point3, Vector2, Vector3, Vector4};

/// Phong material channels carried by every vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Vector4<f32>,
    pub diffuse: Vector4<f32>,
    pub specular: Vector4<f32>,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vector4::new(0.1, 0.1, 0.1, 1.0),
            diffuse: Vector4::new(0.7, 0.7, 0.7, 1.0),
            specular: Vector4::new(1.0, 1.0, 1.0, 1.0),
            shininess: 25.0,
        }
    }
}

/// A 3D vertex with position, normal, texture coordinate and material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub tex_coord: Vector2<f32>,
    pub material: Material,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
            tex_coord: Vector2::zeros(),
            material: Material::default(),
        }
    }

    /// Position, normal and texture coordinate interleaved for a vertex buffer
    pub fn interleaved(&self) -> [f32; 8] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.normal.x,
            self.normal.y,
            self.normal.z,
            self.tex_coord.x,
            self.tex_coord.y,
        ]
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn diagonal(&self) -> f32 {
        (self.max - self.min).norm()
    }
}

/// An indexed triangle mesh.
///
/// Every index is in bounds of `vertices` and the index count is a multiple
/// of 3. Meshes are built by [`MeshBuilder`](crate::dedup::MeshBuilder), which
/// upholds both.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        debug_assert!(indices.len() % 3 == 0);
        debug_assert!(indices.iter().all(|&index| (index as usize) < vertices.len()));
        Self { vertices, indices }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate triangles as vertex triplets in winding order
    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.vertices.first()?.position;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for vertex in &self.vertices[1..] {
            bounds.min = bounds.min.inf(&vertex.position);
            bounds.max = bounds.max.sup(&vertex.position);
        }
        Some(bounds)
    }

    /// Center the mesh on the origin and scale it so the bounding-box
    /// diagonal is 2.
    ///
    /// An empty mesh is left alone. A mesh whose vertices all coincide is only
    /// centered.
    pub fn standardize(&mut self) {
        let Some(bounds) = self.bounds() else {
            return;
        };
        let center = bounds.center();
        let diagonal = bounds.diagonal();
        let scaling = if diagonal > 0.0 { 2.0 / diagonal } else { 1.0 };

        for vertex in &mut self.vertices {
            vertex.position = Point3::from((vertex.position - center) * scaling);
        }
    }

    /// Replace every vertex normal with the normalized sum of the raw
    /// (area-weighted) face normals of the triangles that use it.
    ///
    /// A vertex that only touches zero-area triangles sums to a zero vector,
    /// and normalizing it yields NaN. Returns how many such vertices exist.
    pub fn compute_normals(&mut self) -> usize {
        for vertex in &mut self.vertices {
            vertex.normal = Vector3::zeros();
        }

        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let v0 = self.vertices[a].position;
            let v1 = self.vertices[b].position;
            let v2 = self.vertices[c].position;
            let normal = (v1 - v0).cross(&(v2 - v0));

            self.vertices[a].normal += normal;
            self.vertices[b].normal += normal;
            self.vertices[c].normal += normal;
        }

        let mut degenerate = 0;
        for vertex in &mut self.vertices {
            if vertex.normal.norm_squared() == 0.0 {
                degenerate += 1;
            }
            vertex.normal = vertex.normal.normalize();
        }
        degenerate
    }
}

/// Face normal of a triangle, normalized
pub fn face_normal(triangle: [&Vertex; 3]) -> Vector3<f32> {
    let edge1 = triangle[1].position - triangle[0].position;
    let edge2 = triangle[2].position - triangle[0].position;

    edge1.cross(&edge2).normalize()
}
