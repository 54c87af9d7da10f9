//! rayforge: scene compilation cache for ray-tracing kernels
//!
//! Translates a host-side scene graph (meshes, instances, materials,
//! textures, lights, camera) into flat device-resident buffers and keeps
//! them reconciled with incremental scene edits. The compiler walks
//! material/texture dependency graphs into dense indices, partitions shapes
//! into meshes, instance bases and instances sharing pooled vertex/index
//! buffers, and mirrors the visible set into an external intersection
//! engine.
//!
//! ```no_run
//! use glam::{Vec3, Vec4};
//! use rayforge::collector::Collector;
//! use rayforge::device::HostDevice;
//! use rayforge::intersect::NullIntersector;
//! use rayforge::scene::{Bxdf, Light, Material, Mesh, PerspectiveCamera, Scene};
//! use rayforge::tracker::SceneTracker;
//!
//! let mut tracker = SceneTracker::new(HostDevice::new(), NullIntersector::new());
//! let mut scene = Scene::new();
//!
//! let albedo = scene.add_material(
//!     Material::single(Bxdf::Lambert).with_input("albedo", Vec4::new(0.8, 0.2, 0.2, 1.0)),
//! );
//! let mesh = scene.add_mesh(Mesh::new(
//!     vec![Vec3::ZERO, Vec3::X, Vec3::Y],
//!     vec![Vec3::Z; 3],
//!     vec![],
//!     vec![0, 1, 2],
//! ));
//! scene.shape_mut(mesh).set_material(Some(albedo));
//! scene.add_light(Light::point(Vec3::new(0.0, 2.0, 0.0), Vec3::ONE));
//! scene.set_camera(PerspectiveCamera::look_at(Vec3::new(0.0, 1.0, 3.0), Vec3::ZERO, Vec3::Y));
//!
//! let mut mat_collector = Collector::new();
//! let mut tex_collector = Collector::new();
//! let compiled = tracker
//!     .compile_scene(&mut scene, &mut mat_collector, &mut tex_collector)
//!     .expect("compile");
//! assert_eq!(compiled.num_lights, 1);
//! ```

pub mod collector;
pub mod device;
pub mod error;
pub mod gpu;
pub mod intersect;
pub mod scene;
pub mod tracker;

pub use collector::{Bundle, Collector};
pub use error::{CompileError, CompileResult};
pub use tracker::{CompiledScene, SceneTracker};
