//! State-mirroring intersection engine
//!
//! Performs no intersection work; it tracks handle lifetimes, attach state
//! and operation counts. Backs headless operation and the compiler's test
//! suite.

use super::{Intersector, ShapeHandle, TriangleMeshDesc};
use crate::error::{CompileError, CompileResult};
use glam::Mat4;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct NullShape {
    id: u32,
    transform: Mat4,
    /// Base handle for instances, None for meshes.
    base: Option<ShapeHandle>,
    num_prims: usize,
}

/// Operation counters accumulated over the engine's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullStats {
    pub meshes_created: u64,
    pub instances_created: u64,
    pub attaches: u64,
    pub detaches: u64,
    pub deletes: u64,
    pub commits: u64,
}

/// No-op intersection engine with full state tracking
#[derive(Debug, Default)]
pub struct NullIntersector {
    shapes: HashMap<ShapeHandle, NullShape>,
    attached: HashSet<ShapeHandle>,
    options: HashMap<String, String>,
    next_handle: u64,
    stats: NullStats,
}

impl NullIntersector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> NullStats {
        self.stats
    }

    /// Handles currently alive in the engine.
    pub fn num_shapes(&self) -> usize {
        self.shapes.len()
    }

    /// Handles currently attached for visibility.
    pub fn attached(&self) -> &HashSet<ShapeHandle> {
        &self.attached
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Engine-assigned id of a live shape.
    pub fn shape_id(&self, handle: ShapeHandle) -> Option<u32> {
        self.shapes.get(&handle).map(|s| s.id)
    }

    pub fn shape_transform(&self, handle: ShapeHandle) -> Option<Mat4> {
        self.shapes.get(&handle).map(|s| s.transform)
    }

    fn alloc(&mut self, shape: NullShape) -> ShapeHandle {
        self.next_handle += 1;
        let handle = ShapeHandle(self.next_handle);
        self.shapes.insert(handle, shape);
        handle
    }
}

impl Intersector for NullIntersector {
    fn set_option(&mut self, key: &str, value: &str) {
        self.options.insert(key.to_string(), value.to_string());
    }

    fn create_triangle_mesh(&mut self, desc: TriangleMeshDesc<'_>) -> CompileResult<ShapeHandle> {
        if desc.indices.len() % 3 != 0 {
            return Err(CompileError::intersector(
                "triangle mesh index count is not a multiple of 3",
            ));
        }
        self.stats.meshes_created += 1;
        let num_prims = desc.num_prims();
        Ok(self.alloc(NullShape {
            id: 0,
            transform: Mat4::IDENTITY,
            base: None,
            num_prims,
        }))
    }

    fn create_instance(&mut self, base: ShapeHandle) -> CompileResult<ShapeHandle> {
        let base_prims = self
            .shapes
            .get(&base)
            .ok_or_else(|| CompileError::intersector("instance base handle is not alive"))?
            .num_prims;
        self.stats.instances_created += 1;
        Ok(self.alloc(NullShape {
            id: 0,
            transform: Mat4::IDENTITY,
            base: Some(base),
            num_prims: base_prims,
        }))
    }

    fn set_transform(&mut self, shape: ShapeHandle, transform: Mat4, _inverse: Mat4) {
        if let Some(s) = self.shapes.get_mut(&shape) {
            s.transform = transform;
        }
    }

    fn set_id(&mut self, shape: ShapeHandle, id: u32) {
        if let Some(s) = self.shapes.get_mut(&shape) {
            s.id = id;
        }
    }

    fn attach(&mut self, shape: ShapeHandle) {
        if self.shapes.contains_key(&shape) && self.attached.insert(shape) {
            self.stats.attaches += 1;
        }
    }

    fn detach(&mut self, shape: ShapeHandle) {
        if self.attached.remove(&shape) {
            self.stats.detaches += 1;
        }
    }

    fn detach_all(&mut self) {
        self.stats.detaches += self.attached.len() as u64;
        self.attached.clear();
    }

    fn delete(&mut self, shape: ShapeHandle) {
        debug_assert!(
            !self.attached.contains(&shape),
            "deleting an attached shape"
        );
        self.attached.remove(&shape);
        if self.shapes.remove(&shape).is_some() {
            self.stats.deletes += 1;
        }
    }

    fn commit(&mut self) -> CompileResult<()> {
        self.stats.commits += 1;
        Ok(())
    }
}
