//! Mesh geometry (CPU side).
//!
//! Meshes are plain vertex/index data with a stable identity; the renderer
//! uploads and caches the matching GPU buffers by id. Two procedural
//! generators (sphere, plane) cover the demo scene and tests without an
//! asset pipeline.

use std::f32::consts::PI;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

/// Interleaved vertex: position, normal, uv.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];

    #[must_use]
    pub const fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[derive(Debug)]
struct MeshInner {
    id: u64,
    label: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

/// Shared mesh handle. Cheap to clone; identity-keyed.
#[derive(Debug, Clone)]
pub struct Mesh(Arc<MeshInner>);

impl Mesh {
    #[must_use]
    pub fn from_raw(label: &str, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self(Arc::new(MeshInner {
            id: NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed),
            label: label.to_string(),
            vertices,
            indices,
        }))
    }

    /// UV sphere.
    #[must_use]
    pub fn sphere(label: &str, radius: f32, segments: u32) -> Self {
        let (vertices, indices) = sphere_data(radius, segments.max(3), (segments / 2).max(2));
        Self::from_raw(label, vertices, indices)
    }

    /// Axis-aligned plane in the XY plane, facing +Z.
    #[must_use]
    pub fn plane(label: &str, width: f32, height: f32) -> Self {
        let (vertices, indices) = plane_data(width, height);
        Self::from_raw(label, vertices, indices)
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.0.label
    }

    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.0.vertices
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.0.indices
    }

    #[inline]
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.0.indices.len() as u32
    }
}

impl PartialEq for Mesh {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

fn sphere_data(radius: f32, width_segments: u32, height_segments: u32) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for y in 0..=height_segments {
        let v_ratio = y as f32 / height_segments as f32;
        let theta = v_ratio * PI;

        let py = -radius * theta.cos();
        let ring_radius = radius * theta.sin();

        for x in 0..=width_segments {
            let u_ratio = x as f32 / width_segments as f32;
            let phi = u_ratio * 2.0 * PI;

            let px = -ring_radius * phi.cos();
            let pz = ring_radius * phi.sin();

            vertices.push(Vertex {
                position: [px, py, pz],
                normal: [px / radius, py / radius, pz / radius],
                uv: [u_ratio, 1.0 - v_ratio],
            });
        }
    }

    let stride = width_segments + 1;
    for y in 0..height_segments {
        for x in 0..width_segments {
            let a = y * stride + x;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    (vertices, indices)
}

fn plane_data(width: f32, height: f32) -> (Vec<Vertex>, Vec<u32>) {
    let w = width / 2.0;
    let h = height / 2.0;
    let vertices = vec![
        Vertex { position: [-w, -h, 0.0], normal: [0.0, 0.0, 1.0], uv: [0.0, 1.0] },
        Vertex { position: [w, -h, 0.0], normal: [0.0, 0.0, 1.0], uv: [1.0, 1.0] },
        Vertex { position: [w, h, 0.0], normal: [0.0, 0.0, 1.0], uv: [1.0, 0.0] },
        Vertex { position: [-w, h, 0.0], normal: [0.0, 0.0, 1.0], uv: [0.0, 0.0] },
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_interleaved_32_bytes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn sphere_normals_are_unit_length() {
        let mesh = Mesh::sphere("test", 2.0, 8);
        for v in mesh.vertices() {
            let n = glam::Vec3::from_array(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-4, "non-unit normal {n:?}");
        }
    }

    #[test]
    fn sphere_index_count_matches_quad_grid() {
        let mesh = Mesh::sphere("test", 1.0, 8);
        assert_eq!(mesh.index_count(), 8 * 4 * 6);
    }
}
