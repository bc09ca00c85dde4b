//! Indexed triangle meshes and a few shape generators.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

/// Interleaved vertex as uploaded to the point buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// CPU-side geometry. Vertices, normals and texture coordinates are
/// parallel arrays; missing normals or coordinates upload as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Interleaves the attribute arrays.
    pub fn vertex_data(&self) -> Vec<Vertex> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex {
                position: position.to_array(),
                normal: self.normals.get(i).copied().unwrap_or(Vec3::ZERO).to_array(),
                uv: self.tex_coords.get(i).copied().unwrap_or(Vec2::ZERO).to_array(),
            })
            .collect()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// A single triangle facing +Z.
    pub fn triangle() -> Self {
        Self {
            vertices: vec![
                Vec3::new(-0.5, -0.5, 0.0),
                Vec3::new(0.5, -0.5, 0.0),
                Vec3::new(0.0, 0.5, 0.0),
            ],
            normals: vec![Vec3::Z; 3],
            tex_coords: vec![Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0), Vec2::new(0.5, 0.0)],
            indices: vec![0, 1, 2],
        }
    }

    /// An axis-aligned cube centered on the origin, four vertices per face.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let faces = [
            (Vec3::X, Vec3::Y),
            (Vec3::NEG_X, Vec3::Y),
            (Vec3::Y, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::Z),
            (Vec3::Z, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y),
        ];
        let mut mesh = Self::default();
        for (normal, up) in faces {
            let right = up.cross(normal);
            let base = mesh.vertices.len() as u32;
            for (u, v) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                mesh.vertices.push((normal + right * u + up * v) * h);
                mesh.normals.push(normal);
                mesh.tex_coords.push(Vec2::new((u + 1.0) / 2.0, (1.0 - v) / 2.0));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// A UV sphere with `segments` slices around the equator and `rings`
    /// stacks from pole to pole.
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut mesh = Self::default();
        for ring in 0..=rings {
            let theta = ring as f32 * PI / rings as f32;
            for segment in 0..=segments {
                let phi = segment as f32 * 2.0 * PI / segments as f32;
                let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                mesh.vertices.push(normal * radius);
                mesh.normals.push(normal);
                mesh.tex_coords.push(Vec2::new(
                    segment as f32 / segments as f32,
                    ring as f32 / rings as f32,
                ));
            }
        }
        for ring in 0..rings {
            for segment in 0..segments {
                let current = ring * (segments + 1) + segment;
                let next = current + segments + 1;
                mesh.indices.extend_from_slice(&[
                    current,
                    next,
                    current + 1,
                    current + 1,
                    next,
                    next + 1,
                ]);
            }
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn test_missing_attributes_default_to_zero() {
        let mesh = Mesh {
            vertices: vec![Vec3::ONE, Vec3::X],
            normals: vec![Vec3::Y],
            ..Mesh::default()
        };
        let data = mesh.vertex_data();
        assert_eq!(data[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(data[1].normal, [0.0; 3]);
        assert_eq!(data[1].uv, [0.0; 2]);
    }

    #[test]
    fn test_cube_faces_point_outwards() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.index_count(), 36);
        for (position, normal) in cube.vertices.iter().zip(&cube.normals) {
            assert!((position.dot(*normal) - 1.0).abs() < 1e-6);
        }
        for triangle in cube.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| cube.vertices[triangle[i] as usize]);
            let face_normal = (b - a).cross(c - a).normalize();
            assert!(face_normal.abs_diff_eq(cube.normals[triangle[0] as usize], 1e-6));
        }
    }

    #[test]
    fn test_sphere_counts() {
        let sphere = Mesh::sphere(1.0, 8, 4);
        assert_eq!(sphere.vertices.len(), 9 * 5);
        assert_eq!(sphere.indices.len(), 8 * 4 * 6);
        assert!(sphere.indices.iter().all(|&i| (i as usize) < sphere.vertices.len()));
    }
}
