//! GPU mesh cache.
//!
//! Uploads CPU-side [`Mesh`] data once and serves vertex/index buffers by
//! mesh identity. Meshes never change after creation, so there is no
//! version tracking here.

use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use crate::resources::geometry::Mesh;

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Default)]
pub struct GeometryCache {
    meshes: FxHashMap<u64, GpuMesh>,
}

impl GeometryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads the mesh if it is not resident yet.
    pub fn ensure(&mut self, device: &wgpu::Device, mesh: &Mesh) {
        if self.meshes.contains_key(&mesh.id()) {
            return;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertices", mesh.label())),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Indices", mesh.label())),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.meshes.insert(
            mesh.id(),
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: mesh.index_count(),
            },
        );
    }

    #[must_use]
    pub fn get(&self, mesh_id: u64) -> Option<&GpuMesh> {
        self.meshes.get(&mesh_id)
    }

    #[must_use]
    pub fn resident_count(&self) -> usize {
        self.meshes.len()
    }
}
