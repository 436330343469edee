//! Texture handles and environment maps.
//!
//! [`TextureHandle`] is the opaque reference the rest of the renderer deals
//! in: a device-resident texture plus a stable identity. Setting a handle on
//! a uniform slot never transfers ownership of the underlying resource.
//!
//! [`EnvironmentMap`] is the CPU-side input to the lighting provider: either
//! six square cube faces (fixed +X,−X,+Y,−Y,+Z,−Z order) or an
//! equirectangular panorama, both as linear-light RGB floats. The CPU copy
//! exists because spherical-harmonic projection reads texels directly;
//! [`EnvironmentMap::upload`] creates the matching GPU texture.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;
use half::f16;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

fn next_texture_id() -> u64 {
    NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed)
}

// ============================================================================
// TextureHandle
// ============================================================================

#[derive(Debug)]
struct TextureInner {
    id: u64,
    label: String,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Opaque reference to a device-resident texture.
///
/// Cheap to clone; equality and hashing use the stable id, not resource
/// contents.
#[derive(Debug, Clone)]
pub struct TextureHandle(Arc<TextureInner>);

impl TextureHandle {
    /// Wraps an already-created device texture.
    #[must_use]
    pub fn from_texture(label: &str, texture: wgpu::Texture, view: wgpu::TextureView) -> Self {
        Self(Arc::new(TextureInner {
            id: next_texture_id(),
            label: label.to_string(),
            texture,
            view,
        }))
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
    pub fn texture(&self) -> &wgpu::Texture {
        &self.0.texture
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.0.view
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.0.texture.width(), self.0.texture.height())
    }
}

impl PartialEq for TextureHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TextureHandle {}

impl std::hash::Hash for TextureHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

// ============================================================================
// Cube faces
// ============================================================================

/// Cube-map face, in upload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum CubeFace {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        Self::PosX,
        Self::NegX,
        Self::PosY,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    /// World-space direction through face coordinates `(u, v)` in `[-1, 1]`,
    /// `v` growing downward in texel space.
    #[must_use]
    pub fn direction(self, u: f32, v: f32) -> Vec3 {
        match self {
            Self::PosX => Vec3::new(1.0, -v, -u),
            Self::NegX => Vec3::new(-1.0, -v, u),
            Self::PosY => Vec3::new(u, 1.0, v),
            Self::NegY => Vec3::new(u, -1.0, -v),
            Self::PosZ => Vec3::new(u, -v, 1.0),
            Self::NegZ => Vec3::new(-u, -v, -1.0),
        }
        .normalize()
    }
}

// ============================================================================
// EnvironmentMap
// ============================================================================

/// CPU-side cube map: six square faces of linear RGB texels.
#[derive(Debug, Clone)]
pub struct CubeMap {
    id: u64,
    size: u32,
    faces: [Vec<Vec3>; 6],
}

/// CPU-side equirectangular panorama of linear RGB texels.
#[derive(Debug, Clone)]
pub struct Panorama {
    id: u64,
    width: u32,
    height: u32,
    texels: Vec<Vec3>,
}

/// Environment-lighting input: cube map or equirectangular panorama.
///
/// Both variants feed the same `LightingState` contract.
#[derive(Debug, Clone)]
pub enum EnvironmentMap {
    Cube(CubeMap),
    Equirect(Panorama),
}

impl CubeMap {
    /// Builds a cube map from six face buffers in +X,−X,+Y,−Y,+Z,−Z order.
    ///
    /// Each face must hold exactly `size * size` texels.
    #[must_use]
    pub fn from_faces(size: u32, faces: [Vec<Vec3>; 6]) -> Self {
        for face in &faces {
            assert_eq!(face.len(), (size * size) as usize, "cube face texel count");
        }
        Self {
            id: next_texture_id(),
            size,
            faces,
        }
    }

    /// Uniform single-color cube (test probes, fallback environments).
    #[must_use]
    pub fn solid(size: u32, color: Vec3) -> Self {
        let texels = vec![color; (size * size) as usize];
        Self::from_faces(size, std::array::from_fn(|_| texels.clone()))
    }

    /// Procedural sky→ground gradient, vertical in world space.
    #[must_use]
    pub fn gradient(size: u32, sky: Vec3, ground: Vec3) -> Self {
        let mut faces: [Vec<Vec3>; 6] = std::array::from_fn(|_| Vec::new());
        for face in CubeFace::ALL {
            let mut texels = Vec::with_capacity((size * size) as usize);
            for y in 0..size {
                for x in 0..size {
                    let u = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                    let v = (y as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                    let dir = face.direction(u, v);
                    let t = dir.y * 0.5 + 0.5;
                    texels.push(ground.lerp(sky, t));
                }
            }
            faces[face as usize] = texels;
        }
        Self {
            id: next_texture_id(),
            size,
            faces,
        }
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    #[must_use]
    pub fn face(&self, face: CubeFace) -> &[Vec3] {
        &self.faces[face as usize]
    }

    #[inline]
    #[must_use]
    pub fn texel(&self, face: CubeFace, x: u32, y: u32) -> Vec3 {
        self.faces[face as usize][(y * self.size + x) as usize]
    }
}

impl Panorama {
    /// Builds a panorama from a row-major texel buffer.
    #[must_use]
    pub fn from_texels(width: u32, height: u32, texels: Vec<Vec3>) -> Self {
        assert_eq!(texels.len(), (width * height) as usize, "panorama texel count");
        Self {
            id: next_texture_id(),
            width,
            height,
            texels,
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn texel(&self, x: u32, y: u32) -> Vec3 {
        self.texels[(y * self.width + x) as usize]
    }
}

impl EnvironmentMap {
    /// Identity of the map. The lighting provider keys its SH cache on this,
    /// not on texel contents.
    #[must_use]
    pub fn id(&self) -> u64 {
        match self {
            Self::Cube(cube) => cube.id,
            Self::Equirect(pano) => pano.id,
        }
    }

    /// Largest texel dimension, reported to the shading contract
    /// (`env_texture_size`).
    #[must_use]
    pub fn texel_size(&self) -> (u32, u32) {
        match self {
            Self::Cube(cube) => (cube.size, cube.size),
            Self::Equirect(pano) => (pano.width, pano.height),
        }
    }

    /// Uploads the map as a device texture (`Rgba16Float`).
    ///
    /// Cube maps become cube textures; panoramas become 2D textures. The
    /// texels are converted to half floats on the way up.
    #[must_use]
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> TextureHandle {
        match self {
            Self::Cube(cube) => {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("Environment Cube"),
                    size: wgpu::Extent3d {
                        width: cube.size,
                        height: cube.size,
                        depth_or_array_layers: 6,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba16Float,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                });

                for face in CubeFace::ALL {
                    write_face(
                        queue,
                        &texture,
                        face as u32,
                        cube.size,
                        cube.size,
                        cube.face(face),
                    );
                }

                let view = texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("Environment Cube View"),
                    dimension: Some(wgpu::TextureViewDimension::Cube),
                    ..Default::default()
                });
                TextureHandle::from_texture("Environment Cube", texture, view)
            }
            Self::Equirect(pano) => {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("Environment Panorama"),
                    size: wgpu::Extent3d {
                        width: pano.width,
                        height: pano.height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba16Float,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                });

                write_face(queue, &texture, 0, pano.width, pano.height, &pano.texels);

                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                TextureHandle::from_texture("Environment Panorama", texture, view)
            }
        }
    }
}

fn write_face(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    layer: u32,
    width: u32,
    height: u32,
    texels: &[Vec3],
) {
    let mut data: Vec<u16> = Vec::with_capacity(texels.len() * 4);
    for texel in texels {
        data.push(f16::from_f32(texel.x).to_bits());
        data.push(f16::from_f32(texel.y).to_bits());
        data.push(f16::from_f32(texel.z).to_bits());
        data.push(f16::ONE.to_bits());
    }

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&data),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 8),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_directions_are_unit_and_axis_aligned_at_center() {
        for face in CubeFace::ALL {
            let dir = face.direction(0.0, 0.0);
            assert!((dir.length() - 1.0).abs() < 1e-6);
        }
        assert_eq!(CubeFace::PosX.direction(0.0, 0.0), Vec3::X);
        assert_eq!(CubeFace::NegY.direction(0.0, 0.0), Vec3::NEG_Y);
    }

    #[test]
    fn environment_ids_are_distinct_per_map() {
        let a = EnvironmentMap::Cube(CubeMap::solid(4, Vec3::ONE));
        let b = EnvironmentMap::Cube(CubeMap::solid(4, Vec3::ONE));
        assert_ne!(a.id(), b.id());
    }
}
