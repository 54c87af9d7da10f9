//! Intersection-engine interface
//!
//! The compiler mirrors the current shape partition into an external
//! intersection engine through this trait: triangle-mesh and instance
//! handles are created, given transforms and ids, attached for visibility
//! and committed. Handles are opaque; deletion is only legal after detach.

pub mod null;

pub use null::NullIntersector;

use crate::error::CompileResult;
use glam::{Mat4, Vec3};

/// Opaque reference to a geometry or instance registered with the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub(crate) u64);

/// Triangle-mesh geometry description.
///
/// Vertices are tightly packed `Vec3` (3x f32 stride); indices are a flat
/// triangle list with no face-size array, so every index triple is one
/// primitive.
#[derive(Debug, Clone, Copy)]
pub struct TriangleMeshDesc<'a> {
    pub vertices: &'a [Vec3],
    pub indices: &'a [u32],
}

impl TriangleMeshDesc<'_> {
    pub fn num_prims(&self) -> usize {
        self.indices.len() / 3
    }
}

/// External intersection engine surface consumed by the compiler
pub trait Intersector {
    /// Engine configuration option (acceleration structure type, builder).
    fn set_option(&mut self, key: &str, value: &str);

    fn create_triangle_mesh(&mut self, desc: TriangleMeshDesc<'_>) -> CompileResult<ShapeHandle>;

    /// Create an instance sharing the base mesh's geometry.
    fn create_instance(&mut self, base: ShapeHandle) -> CompileResult<ShapeHandle>;

    fn set_transform(&mut self, shape: ShapeHandle, transform: Mat4, inverse: Mat4);

    fn set_id(&mut self, shape: ShapeHandle, id: u32);

    /// Attach a shape for primary visibility.
    fn attach(&mut self, shape: ShapeHandle);

    fn detach(&mut self, shape: ShapeHandle);

    fn detach_all(&mut self);

    fn delete(&mut self, shape: ShapeHandle);

    /// Rebuild acceleration structures over the attached set.
    fn commit(&mut self) -> CompileResult<()>;
}
