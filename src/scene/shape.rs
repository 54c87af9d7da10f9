//! Shapes: triangle meshes and instances of them
//!
//! A mesh owns its geometry arrays; an instance borrows a base mesh's
//! geometry but carries its own transform and material assignment.

use super::{MaterialId, ShapeId};
use glam::{Mat4, Vec2, Vec3};

/// Triangle mesh with non-indexed attribute arrays and a triangle index list
#[derive(Debug, Clone)]
pub struct Mesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    indices: Vec<u32>,
    transform: Mat4,
    material: Option<MaterialId>,
    dirty: bool,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, uvs: Vec<Vec2>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals,
            uvs,
            indices,
            transform: Mat4::IDENTITY,
            material: None,
            dirty: true,
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn num_normals(&self) -> usize {
        self.normals.len()
    }

    pub fn num_uvs(&self) -> usize {
        self.uvs.len()
    }

    pub fn num_indices(&self) -> usize {
        self.indices.len()
    }

    /// Triangle count; every index triple is one primitive.
    pub fn num_prims(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.dirty = true;
    }

    pub fn material(&self) -> Option<MaterialId> {
        self.material
    }

    pub fn set_material(&mut self, material: Option<MaterialId>) {
        self.material = material;
        self.dirty = true;
    }
}

/// Instance of a base mesh with its own transform and material
#[derive(Debug, Clone)]
pub struct Instance {
    base: ShapeId,
    transform: Mat4,
    material: Option<MaterialId>,
    dirty: bool,
}

impl Instance {
    pub fn new(base: ShapeId, transform: Mat4) -> Self {
        Self {
            base,
            transform,
            material: None,
            dirty: true,
        }
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    /// Id of the base mesh whose geometry this instance shares.
    pub fn base(&self) -> ShapeId {
        self.base
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.dirty = true;
    }

    pub fn material(&self) -> Option<MaterialId> {
        self.material
    }

    pub fn set_material(&mut self, material: Option<MaterialId>) {
        self.material = material;
        self.dirty = true;
    }
}

/// A scene shape: either a mesh or an instance of one
#[derive(Debug, Clone)]
pub enum Shape {
    Mesh(Mesh),
    Instance(Instance),
}

impl Shape {
    pub fn is_instance(&self) -> bool {
        matches!(self, Shape::Instance(_))
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match self {
            Shape::Mesh(mesh) => Some(mesh),
            Shape::Instance(_) => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Shape::Mesh(_) => None,
            Shape::Instance(instance) => Some(instance),
        }
    }

    pub fn transform(&self) -> Mat4 {
        match self {
            Shape::Mesh(mesh) => mesh.transform(),
            Shape::Instance(instance) => instance.transform(),
        }
    }

    pub fn material(&self) -> Option<MaterialId> {
        match self {
            Shape::Mesh(mesh) => mesh.material(),
            Shape::Instance(instance) => instance.material(),
        }
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        match self {
            Shape::Mesh(mesh) => mesh.set_transform(transform),
            Shape::Instance(instance) => instance.set_transform(transform),
        }
    }

    pub fn set_material(&mut self, material: Option<MaterialId>) {
        match self {
            Shape::Mesh(mesh) => mesh.set_material(material),
            Shape::Instance(instance) => instance.set_material(material),
        }
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            Shape::Mesh(mesh) => mesh.dirty,
            Shape::Instance(instance) => instance.dirty,
        }
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        match self {
            Shape::Mesh(mesh) => mesh.dirty = dirty,
            Shape::Instance(instance) => instance.dirty = dirty,
        }
    }
}
