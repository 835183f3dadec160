/// Vertex deduplication: triangle soup in, indexed mesh out
use ahash::AHashMap;

use crate::geometry::{Mesh, Vertex};

/// Grid step floats are snapped to before comparison
pub const KEY_QUANTUM: f64 = 1e-6;

/// Which vertex attributes decide whether two corners are the same vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexIdentity {
    /// Only the position; the first corner seen keeps its other attributes
    Position,
    /// Position, normal, texture coordinate and material channels
    #[default]
    Attributes,
}

const ATTRIBUTE_COUNT: usize = 3 + 3 + 2 + 4 * 3 + 1;

/// Hashable identity of a vertex.
///
/// Every float is snapped to a [`KEY_QUANTUM`] grid, and both `Hash` and `Eq`
/// work on the snapped integers, so equal keys always hash equally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexKey([i64; ATTRIBUTE_COUNT]);

impl VertexKey {
    pub fn new(vertex: &Vertex, identity: VertexIdentity) -> Self {
        let mut key = [0i64; ATTRIBUTE_COUNT];
        let position = vertex.position.coords.iter();
        match identity {
            VertexIdentity::Position => fill(&mut key, position),
            VertexIdentity::Attributes => {
                let material = &vertex.material;
                fill(
                    &mut key,
                    position
                        .chain(vertex.normal.iter())
                        .chain(vertex.tex_coord.iter())
                        .chain(material.ambient.iter())
                        .chain(material.diffuse.iter())
                        .chain(material.specular.iter())
                        .chain(std::iter::once(&material.shininess)),
                );
            }
        }
        Self(key)
    }
}

fn fill<'a>(key: &mut [i64], values: impl Iterator<Item = &'a f32>) {
    for (slot, &value) in key.iter_mut().zip(values) {
        *slot = quantize(value);
    }
}

fn quantize(value: f32) -> i64 {
    // `as` saturates, and maps NaN to 0; -0.0 and 0.0 share a cell.
    (value as f64 / KEY_QUANTUM).round() as i64
}

/// Accumulates corners into a deduplicated vertex buffer and index buffer
#[derive(Debug)]
pub struct MeshBuilder {
    identity: VertexIdentity,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    lookup: AHashMap<VertexKey, u32>,
}

impl MeshBuilder {
    pub fn new(identity: VertexIdentity) -> Self {
        Self::with_capacity(identity, 0)
    }

    pub fn with_capacity(identity: VertexIdentity, corners: usize) -> Self {
        Self {
            identity,
            vertices: Vec::new(),
            indices: Vec::with_capacity(corners),
            lookup: AHashMap::new(),
        }
    }

    /// Add one triangle corner and return the index it resolved to
    pub fn push(&mut self, vertex: Vertex) -> u32 {
        let key = VertexKey::new(&vertex, self.identity);
        let next = self.vertices.len() as u32;
        let index = *self.lookup.entry(key).or_insert_with(|| next);
        if index == next {
            self.vertices.push(vertex);
        }
        self.indices.push(index);
        index
    }

    pub fn corner_count(&self) -> usize {
        self.indices.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Finish the mesh. Returns `None` when the corners do not form whole
    /// triangles.
    pub fn build(self) -> Option<Mesh> {
        if self.indices.len() % 3 != 0 {
            return None;
        }
        Some(Mesh::from_parts(self.vertices, self.indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Material;
    use nalgebra::Vector4;

    fn corner(x: f32, y: f32, z: f32) -> Vertex {
        Vertex::new(x, y, z, 0.0, 0.0, 1.0)
    }

    #[test]
    fn test_shared_corners_share_an_index() {
        let mut builder = MeshBuilder::new(VertexIdentity::Attributes);
        for vertex in [
            corner(0.0, 0.0, 0.0),
            corner(1.0, 0.0, 0.0),
            corner(1.0, 1.0, 0.0),
            corner(0.0, 0.0, 0.0),
            corner(1.0, 1.0, 0.0),
            corner(0.0, 1.0, 0.0),
        ] {
            builder.push(vertex);
        }
        let mesh = builder.build().unwrap();
        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.indices(), &[0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_tiny_float_noise_collapses() {
        let mut builder = MeshBuilder::new(VertexIdentity::Attributes);
        let a = builder.push(corner(0.25, 0.5, 0.75));
        let b = builder.push(corner(0.25 + 2e-7, 0.5, 0.75 - 2e-7));
        assert_eq!(a, b);
        assert_eq!(builder.vertex_count(), 1);
    }

    #[test]
    fn test_negative_zero_matches_zero() {
        let mut builder = MeshBuilder::new(VertexIdentity::Attributes);
        let a = builder.push(corner(0.0, 1.0, 0.0));
        let b = builder.push(corner(-0.0, 1.0, -0.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_controls_what_counts() {
        let mut red = corner(1.0, 2.0, 3.0);
        red.material = Material {
            diffuse: Vector4::new(1.0, 0.0, 0.0, 1.0),
            ..Material::default()
        };
        let plain = corner(1.0, 2.0, 3.0);

        let mut by_attributes = MeshBuilder::new(VertexIdentity::Attributes);
        by_attributes.push(plain);
        by_attributes.push(red);
        assert_eq!(by_attributes.vertex_count(), 2);

        let mut by_position = MeshBuilder::new(VertexIdentity::Position);
        by_position.push(plain);
        by_position.push(red);
        assert_eq!(by_position.vertex_count(), 1);
        assert_eq!(by_position.corner_count(), 2);
    }

    #[test]
    fn test_incomplete_triangle_is_rejected() {
        let mut builder = MeshBuilder::new(VertexIdentity::Attributes);
        builder.push(corner(0.0, 0.0, 0.0));
        builder.push(corner(1.0, 0.0, 0.0));
        assert!(builder.build().is_none());
    }
}
