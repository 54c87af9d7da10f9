//! Host-side scene description consumed by the compiler
//!
//! The scene owns typed arenas of shapes, materials, textures and lights,
//! plus an optional camera. Entities carry individual dirty bits; the scene
//! itself carries coarse dirty flags for the camera/light/shape families.
//! The compiler reads everything through ids and clears dirty state after a
//! successful translation.

pub mod camera;
pub mod light;
pub mod material;
pub mod shape;
pub mod texture;

pub use camera::{CameraType, PerspectiveCamera};
pub use light::{Light, LightKind};
pub use material::{BlendKind, Bxdf, Material, MaterialHandle, MaterialInput, MaterialKind};
pub use shape::{Instance, Mesh, Shape};
pub use texture::{Texture, TextureFormat};

use crate::error::{CompileError, CompileResult};
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a shape slot in the scene arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub(crate) u32);

/// Unique identifier for a material slot in the scene arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub(crate) u32);

/// Unique identifier for a texture slot in the scene arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) u32);

/// Unique identifier for a light slot in the scene arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub(crate) u32);

/// Process-wide scene identity; the compiler's cache key.
///
/// Two scenes never share an id, even if their contents are identical, so
/// discarding and recreating a scene always produces a fresh cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(u64);

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Coarse per-family dirty flags on the scene
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    pub camera: bool,
    pub lights: bool,
    pub shapes: bool,
}

impl DirtyFlags {
    pub const SHAPES: DirtyFlags = DirtyFlags {
        camera: false,
        lights: false,
        shapes: true,
    };

    pub fn is_empty(&self) -> bool {
        !(self.camera || self.lights || self.shapes)
    }
}

/// The source scene: arenas of entities plus the attached-shape list
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    shapes: Vec<Shape>,
    /// Shapes in scene iteration order; registered-but-unattached meshes
    /// are not listed here (instance bases may live only in the arena).
    shape_list: Vec<ShapeId>,
    materials: Vec<Material>,
    textures: Vec<Texture>,
    lights: Vec<Light>,
    camera: Option<PerspectiveCamera>,
    dirty: DirtyFlags,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            id: SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed)),
            shapes: Vec::new(),
            shape_list: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
            lights: Vec::new(),
            camera: None,
            dirty: DirtyFlags::default(),
        }
    }

    /// Cache identity of this scene.
    pub fn id(&self) -> SceneId {
        self.id
    }

    // ---------- shapes ----------

    /// Register a mesh in the arena without attaching it to the scene.
    /// A registered mesh becomes visible only via [`Scene::attach_shape`],
    /// but can serve as an instance base either way.
    pub fn register_mesh(&mut self, mesh: Mesh) -> ShapeId {
        let id = ShapeId(self.shapes.len() as u32);
        self.shapes.push(Shape::Mesh(mesh));
        id
    }

    /// Register an instance of a previously registered mesh.
    pub fn register_instance(&mut self, instance: Instance) -> CompileResult<ShapeId> {
        match self.shapes.get(instance.base().0 as usize) {
            Some(Shape::Mesh(_)) => {}
            Some(Shape::Instance(_)) => {
                return Err(CompileError::Scene(
                    "instance base must be a mesh".to_string(),
                ))
            }
            None => {
                return Err(CompileError::Scene(
                    "instance references an unknown shape".to_string(),
                ))
            }
        }
        let id = ShapeId(self.shapes.len() as u32);
        self.shapes.push(Shape::Instance(instance));
        Ok(id)
    }

    /// Append a registered shape to the scene's iteration list.
    pub fn attach_shape(&mut self, id: ShapeId) {
        if !self.shape_list.contains(&id) {
            self.shape_list.push(id);
            self.dirty.shapes = true;
        }
    }

    /// Register and attach in one step.
    pub fn add_mesh(&mut self, mesh: Mesh) -> ShapeId {
        let id = self.register_mesh(mesh);
        self.attach_shape(id);
        id
    }

    pub fn shape(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.0 as usize]
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> &mut Shape {
        &mut self.shapes[id.0 as usize]
    }

    /// The mesh behind a shape id, if that shape is a mesh.
    pub fn mesh(&self, id: ShapeId) -> Option<&Mesh> {
        self.shape(id).as_mesh()
    }

    /// Attached shapes in scene iteration order.
    pub fn shapes(&self) -> impl Iterator<Item = (ShapeId, &Shape)> + '_ {
        self.shape_list.iter().map(|&id| (id, self.shape(id)))
    }

    pub fn num_shapes(&self) -> usize {
        self.shape_list.len()
    }

    // ---------- materials ----------

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len() as u32);
        self.materials.push(material);
        id
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0 as usize]
    }

    pub fn material_mut(&mut self, id: MaterialId) -> &mut Material {
        &mut self.materials[id.0 as usize]
    }

    // ---------- textures ----------

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(texture);
        id
    }

    pub fn texture(&self, id: TextureId) -> &Texture {
        &self.textures[id.0 as usize]
    }

    pub fn texture_mut(&mut self, id: TextureId) -> &mut Texture {
        &mut self.textures[id.0 as usize]
    }

    // ---------- lights ----------

    pub fn add_light(&mut self, light: Light) -> LightId {
        let id = LightId(self.lights.len() as u32);
        self.lights.push(light);
        self.dirty.lights = true;
        id
    }

    pub fn light(&self, id: LightId) -> &Light {
        &self.lights[id.0 as usize]
    }

    pub fn light_mut(&mut self, id: LightId) -> &mut Light {
        &mut self.lights[id.0 as usize]
    }

    /// Lights in iteration (insertion) order.
    pub fn lights(&self) -> impl Iterator<Item = (LightId, &Light)> + '_ {
        self.lights
            .iter()
            .enumerate()
            .map(|(i, l)| (LightId(i as u32), l))
    }

    pub fn num_lights(&self) -> usize {
        self.lights.len()
    }

    // ---------- camera ----------

    pub fn set_camera(&mut self, camera: PerspectiveCamera) {
        self.camera = Some(camera);
        self.dirty.camera = true;
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut PerspectiveCamera> {
        self.camera.as_mut()
    }

    // ---------- dirty state ----------

    pub fn dirty_flags(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn set_dirty_flags(&mut self, flags: DirtyFlags) {
        self.dirty = flags;
    }

    pub fn clear_dirty_flags(&mut self) {
        self.dirty = DirtyFlags::default();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
