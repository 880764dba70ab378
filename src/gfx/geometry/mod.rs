//! Procedural meshes for everything in the scene except the imported model
//!
//! ```rust
//! use snowlight::gfx::geometry::{generate_box, generate_plane, generate_sphere};
//!
//! let cube = generate_box(0.5, 0.5, 0.5);
//! let ball = generate_sphere(0.25, 32, 32);
//! let floor = generate_plane(10.0, 10.0, 1, 1);
//! assert_eq!(cube.triangle_count(), 12);
//! assert!(ball.vertex_count() > floor.vertex_count());
//! ```
//!
//! Texture coordinates have `v = 0` on the top row of the image.

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Separate attribute streams of a generated mesh, CCW winding
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    pub vertices: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaved vertices; missing normals point up, missing UVs are zero
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex3D {
                position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coords: self.tex_coords.get(i).copied().unwrap_or_default(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_vertices_fills_missing_attributes() {
        let data = GeometryData {
            vertices: vec![[1.0, 2.0, 3.0]],
            ..Default::default()
        };
        let vertices = data.to_vertices();
        assert_eq!(vertices.len(), 1);
        assert_eq!(vertices[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(vertices[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[0].tex_coords, [0.0, 0.0]);
    }
}
