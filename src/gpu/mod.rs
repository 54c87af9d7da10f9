//! On-device record layouts shared with the ray-tracing kernels

pub mod types;

pub use types::{
    GpuCamera, GpuLight, GpuMaterial, GpuShape, GpuTexture, GpuVertex, GpuVolume,
};
