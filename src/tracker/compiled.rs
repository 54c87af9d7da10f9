//! Compiled scene record: device buffers owned per source-scene identity

use crate::collector::Bundle;
use crate::device::{DeviceBuffer, DeviceContext};
use crate::gpu::{GpuCamera, GpuLight, GpuMaterial, GpuShape, GpuTexture, GpuVertex, GpuVolume};
use crate::intersect::ShapeHandle;
use crate::scene::{CameraType, MaterialHandle, TextureId};

/// Pooled geometry buffers; always rebuilt together by the shape pass
pub struct GeometryBuffers<D: DeviceContext> {
    pub vertices: D::Buffer<GpuVertex>,
    pub normals: D::Buffer<GpuVertex>,
    pub uvs: D::Buffer<[f32; 2]>,
    pub indices: D::Buffer<u32>,
    /// One fixed-layout record per shape in partition order.
    pub shapes: D::Buffer<GpuShape>,
    /// Primitive-to-material index map; -1 for excluded meshes.
    pub material_ids: D::Buffer<i32>,
}

impl<D: DeviceContext> std::fmt::Debug for GeometryBuffers<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryBuffers")
            .field("vertices_len", &self.vertices.len())
            .field("normals_len", &self.normals.len())
            .field("uvs_len", &self.uvs.len())
            .field("indices_len", &self.indices.len())
            .field("shapes_len", &self.shapes.len())
            .field("material_ids_len", &self.material_ids.len())
            .finish()
    }
}

/// Texture headers plus the shared payload blob
pub struct TextureBuffers<D: DeviceContext> {
    pub headers: D::Buffer<GpuTexture>,
    pub data: D::Buffer<u8>,
}

impl<D: DeviceContext> std::fmt::Debug for TextureBuffers<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureBuffers")
            .field("headers_len", &self.headers.len())
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// Device-resident translation of one source scene.
///
/// Owned by the compiler's cache; buffers created by the first full rebuild
/// and selectively replaced by later incremental passes. The lights,
/// materials and texture buffers only ever grow; `num_lights` bounds the
/// valid prefix of the lights buffer.
pub struct CompiledScene<D: DeviceContext> {
    pub camera: Option<D::Buffer<GpuCamera>>,
    pub camera_type: CameraType,
    pub geometry: Option<GeometryBuffers<D>>,
    pub materials: Option<D::Buffer<GpuMaterial>>,
    pub textures: Option<TextureBuffers<D>>,
    pub lights: Option<D::Buffer<GpuLight>>,
    pub num_lights: u32,
    /// Lights-buffer index of the last IBL light, or -1.
    pub envmap_idx: i32,
    pub volumes: Option<D::Buffer<GpuVolume>>,
    /// Every acceleration-structure handle this scene owns, in id order.
    pub isect_shapes: Vec<ShapeHandle>,
    /// The subset of `isect_shapes` attached for primary visibility.
    pub visible_shapes: Vec<ShapeHandle>,
    /// Snapshot of the material collector at the last material pass.
    pub material_bundle: Option<Bundle<MaterialHandle>>,
    /// Snapshot of the texture collector at the last texture pass.
    pub texture_bundle: Option<Bundle<TextureId>>,
}

impl<D: DeviceContext> std::fmt::Debug for CompiledScene<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledScene")
            .field("camera_present", &self.camera.is_some())
            .field("camera_type", &self.camera_type)
            .field("geometry", &self.geometry)
            .field("materials_present", &self.materials.is_some())
            .field("textures", &self.textures)
            .field("lights_present", &self.lights.is_some())
            .field("num_lights", &self.num_lights)
            .field("envmap_idx", &self.envmap_idx)
            .field("volumes_present", &self.volumes.is_some())
            .field("isect_shapes", &self.isect_shapes)
            .field("visible_shapes", &self.visible_shapes)
            .field("material_bundle", &self.material_bundle)
            .field("texture_bundle", &self.texture_bundle)
            .finish()
    }
}

impl<D: DeviceContext> Default for CompiledScene<D> {
    fn default() -> Self {
        Self {
            camera: None,
            camera_type: CameraType::Default,
            geometry: None,
            materials: None,
            textures: None,
            lights: None,
            num_lights: 0,
            envmap_idx: -1,
            volumes: None,
            isect_shapes: Vec::new(),
            visible_shapes: Vec::new(),
            material_bundle: None,
            texture_bundle: None,
        }
    }
}
