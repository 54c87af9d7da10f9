//! Fixed-layout device records
//!
//! Field order and types of every struct in this module are a compatibility
//! boundary with the kernels; layout tests below pin sizes and offsets.
//! Indices stored in records are 0-based positions in their respective
//! buffers, or -1 for "absent".

use bytemuck::{Pod, Zeroable};

/// Position or normal entry in the pooled vertex buffers (16-byte texel)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub _pad: f32,
}

impl From<glam::Vec3> for GpuVertex {
    fn from(v: glam::Vec3) -> Self {
        Self {
            position: v.to_array(),
            _pad: 0.0,
        }
    }
}

/// Shape record: geometry ranges in the pooled buffers plus per-shape state
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct GpuShape {
    pub num_prims: i32,
    pub start_vtx: i32,
    pub start_idx: i32,
    pub start_material_idx: i32,
    /// Row-major rows of the object-to-world transform.
    pub transform: [[f32; 4]; 4],
    pub linear_velocity: [f32; 4],
    pub angular_velocity: [f32; 4],
}

/// Material record
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    pub kx: [f32; 4],
    pub bxdf: i32,
    pub kx_map_idx: i32,
    pub normal_map_idx: i32,
    pub ns_map_idx: i32,
    pub ns: f32,
    pub ni: f32,
    pub fresnel: f32,
    pub bump_flag: i32,
    pub brdf_base_idx: i32,
    pub brdf_top_idx: i32,
    pub _pad: [i32; 2],
}

impl GpuMaterial {
    pub const BXDF_ZERO: i32 = 0;
    pub const BXDF_LAMBERT: i32 = 1;
    pub const BXDF_IDEAL_REFLECT: i32 = 2;
    pub const BXDF_IDEAL_REFRACT: i32 = 3;
    pub const BXDF_EMISSIVE: i32 = 4;
    pub const BXDF_PASSTHROUGH: i32 = 5;
    pub const BXDF_TRANSLUCENT: i32 = 6;
    pub const BXDF_MICROFACET_BECKMANN: i32 = 7;
    pub const BXDF_MICROFACET_GGX: i32 = 8;
    pub const BXDF_MICROFACET_REFRACTION_GGX: i32 = 9;
    pub const BXDF_MICROFACET_REFRACTION_BECKMANN: i32 = 10;
    pub const BXDF_MIX: i32 = 11;
    pub const BXDF_LAYERED: i32 = 12;
    pub const BXDF_FRESNEL_BLEND: i32 = 13;
}

/// Light record
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub intensity: [f32; 4],
    pub kind: i32,
    pub shape_idx: i32,
    pub prim_idx: i32,
    pub multiplier: f32,
    pub tex: i32,
    pub tex_diffuse: i32,
    pub inner_angle: f32,
    pub outer_angle: f32,
}

impl GpuLight {
    pub const KIND_POINT: i32 = 0;
    pub const KIND_DIRECTIONAL: i32 = 1;
    pub const KIND_SPOT: i32 = 2;
    pub const KIND_IBL: i32 = 3;
    pub const KIND_AREA: i32 = 4;
}

/// Texture header; payload bytes live in the texture-data blob
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuTexture {
    pub width: i32,
    pub height: i32,
    pub format: i32,
    pub data_offset: i32,
}

impl GpuTexture {
    pub const FORMAT_RGBA8: i32 = 0;
    pub const FORMAT_RGBA16: i32 = 1;
    pub const FORMAT_RGBA32: i32 = 2;
}

/// Camera record
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuCamera {
    pub forward: [f32; 4],
    pub up: [f32; 4],
    pub right: [f32; 4],
    pub position: [f32; 4],
    pub sensor_size: [f32; 2],
    pub depth_range: [f32; 2],
    pub aperture: f32,
    pub aspect_ratio: f32,
    pub focal_length: f32,
    pub focus_distance: f32,
}

/// Volume record; a single default entry is written per scene
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuVolume {
    pub kind: i32,
    pub phase: i32,
    pub data_offset: i32,
    pub extra: i32,
    pub sigma_a: [f32; 4],
    pub sigma_s: [f32; 4],
    pub sigma_e: [f32; 4],
}

impl GpuVolume {
    pub const KIND_HOMOGENEOUS: i32 = 1;
    pub const PHASE_UNIFORM: i32 = 0;

    /// The ambient volume every compiled scene starts with.
    pub fn default_homogeneous() -> Self {
        Self {
            kind: Self::KIND_HOMOGENEOUS,
            phase: Self::PHASE_UNIFORM,
            data_offset: 0,
            extra: 0,
            sigma_a: [0.09, 0.09, 0.09, 0.0],
            sigma_s: [0.1, 0.1, 0.1, 0.0],
            sigma_e: [0.0, 0.0, 0.0, 0.0],
        }
    }
}
