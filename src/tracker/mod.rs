//! Scene compiler
//!
//! Translates a source scene into a [`CompiledScene`] and keeps the two in
//! sync across edits. The first sight of a scene identity triggers a full
//! rebuild; later compiles consult the scene's dirty flags, per-entity
//! dirty bits and the collector bundles to decide which device buffers to
//! rebuild and whether the intersection engine must be refreshed.
//!
//! A tracker is single-threaded: one `compile_scene` call runs to
//! completion on the caller's thread, and its only suspension points are
//! the device waits at the end of each pass.

pub mod compiled;

mod bridge;
mod camera;
mod lights;
mod materials;
mod shapes;
mod textures;

pub use compiled::{CompiledScene, GeometryBuffers, TextureBuffers};

use crate::collector::Collector;
use crate::device::DeviceContext;
use crate::error::{CompileError, CompileResult};
use crate::intersect::Intersector;
use crate::scene::{Bxdf, Material, MaterialHandle, Scene, SceneId, TextureId};
use bridge::{reload_intersector, update_intersector};
use camera::update_camera;
use glam::{Vec3, Vec4};
use lights::update_lights;
use materials::update_materials;
use shapes::update_shapes;
use std::collections::HashMap;
use textures::update_textures;

pub(crate) fn float4(v: Vec3) -> [f32; 4] {
    [v.x, v.y, v.z, 0.0]
}

/// Compiles scenes into device-resident form and caches the result per
/// scene identity.
pub struct SceneTracker<D: DeviceContext, I: Intersector> {
    context: D,
    api: I,
    /// Substituted wherever a shape or instance has no material.
    default_material: Material,
    cache: HashMap<SceneId, CompiledScene<D>>,
    current_scene: Option<SceneId>,
}

impl<D: DeviceContext, I: Intersector> SceneTracker<D, I> {
    pub fn new(context: D, mut api: I) -> Self {
        api.set_option("acc.type", "fatbvh");
        api.set_option("bvh.builder", "sah");

        let default_material = Material::single(Bxdf::Lambert)
            .with_input("albedo", Vec4::new(0.5, 0.6, 0.5, 1.0));

        Self {
            context,
            api,
            default_material,
            cache: HashMap::new(),
            current_scene: None,
        }
    }

    pub fn context(&self) -> &D {
        &self.context
    }

    pub fn intersector(&self) -> &I {
        &self.api
    }

    pub fn default_material(&self) -> &Material {
        &self.default_material
    }

    /// The cached compiled record for a scene identity, if one exists.
    pub fn compiled_scene(&self, id: SceneId) -> Option<&CompiledScene<D>> {
        self.cache.get(&id)
    }

    /// Compile `scene`, reusing the cached record for its identity.
    ///
    /// Collects materials from shapes (transitively through material
    /// dependencies), then textures from materials and lights, and finally
    /// reconciles the cached device state with the scene's dirty set. On
    /// success every dirty bit in the scene is clear. On failure the cache
    /// keeps whatever state the pass reached; callers should discard the
    /// entry or retry.
    pub fn compile_scene(
        &mut self,
        scene: &mut Scene,
        mat_collector: &mut Collector<MaterialHandle>,
        tex_collector: &mut Collector<TextureId>,
    ) -> CompileResult<&CompiledScene<D>> {
        mat_collector.clear();
        tex_collector.clear();

        // Committing materials first establishes the index mapping the
        // texture expansion and every writer relies on.
        collect_materials(scene, &self.default_material, mat_collector);
        mat_collector.commit();

        collect_textures(scene, &self.default_material, mat_collector, tex_collector);
        tex_collector.commit();

        let id = scene.id();
        match self.cache.remove(&id) {
            None => {
                let mut out = CompiledScene::default();
                let built = self
                    .rebuild_full(scene, mat_collector, tex_collector, &mut out)
                    .and_then(|_| reload_intersector(&mut self.api, &out));
                if let Err(err) = built {
                    // Engine handles must not outlive the dropped entry.
                    self.release_handles(&mut out);
                    return Err(err);
                }

                self.current_scene = Some(id);
                scene.clear_dirty_flags();
                self.clear_material_dirty(scene, mat_collector);

                log::info!(
                    "compiled scene {:?}: {} shapes, {} materials, {} textures",
                    id,
                    scene.num_shapes(),
                    mat_collector.num_items(),
                    tex_collector.num_items()
                );
                self.cache.insert(id, out);
            }
            Some(mut out) => {
                let refreshed = self.refresh(scene, mat_collector, tex_collector, &mut out);
                self.cache.insert(id, out);
                refreshed?;
            }
        }

        Ok(&self.cache[&id])
    }

    fn rebuild_full(
        &mut self,
        scene: &mut Scene,
        mat_collector: &Collector<MaterialHandle>,
        tex_collector: &Collector<TextureId>,
        out: &mut CompiledScene<D>,
    ) -> CompileResult<()> {
        // A reused entry may still own engine handles.
        for handle in out.isect_shapes.drain(..) {
            self.api.delete(handle);
        }
        out.visible_shapes.clear();

        update_camera(&self.context, scene, out)?;
        update_lights(&self.context, scene, tex_collector, out)?;
        update_shapes(&self.context, scene, mat_collector, out)?;
        update_materials(
            &self.context,
            scene,
            &self.default_material,
            mat_collector,
            tex_collector,
            out,
        )?;
        update_textures(&self.context, scene, tex_collector, out)?;
        update_intersector(&mut self.api, scene, out)?;

        out.volumes = Some(self.context.create_buffer_init(
            &[crate::gpu::GpuVolume::default_homogeneous()],
            crate::device::BufferAccess::ReadOnly,
        )?);

        Ok(())
    }

    fn refresh(
        &mut self,
        scene: &mut Scene,
        mat_collector: &Collector<MaterialHandle>,
        tex_collector: &Collector<TextureId>,
        out: &mut CompiledScene<D>,
    ) -> CompileResult<()> {
        let dirty = scene.dirty_flags();

        let camera_changed = scene
            .camera()
            .ok_or(CompileError::NoCamera)?
            .is_dirty();
        if dirty.camera || camera_changed {
            update_camera(&self.context, scene, out)?;
        }

        if scene.num_lights() == 0 {
            return Err(CompileError::NoLights);
        }
        let lights_changed = scene.lights().any(|(_, light)| light.is_dirty());
        if dirty.lights || lights_changed {
            update_lights(&self.context, scene, tex_collector, out)?;
        }

        if scene.num_shapes() == 0 {
            return Err(CompileError::NoShapes);
        }
        let shapes_changed = scene.shapes().any(|(_, shape)| shape.is_dirty());
        if dirty.shapes || shapes_changed {
            update_shapes(&self.context, scene, mat_collector, out)?;
            update_intersector(&mut self.api, scene, out)?;
            reload_intersector(&mut self.api, out)?;
        }

        let materials_changed = match &out.material_bundle {
            None => true,
            Some(bundle) => mat_collector.needs_update(bundle, |handle| match handle {
                MaterialHandle::Default => self.default_material.is_dirty(),
                MaterialHandle::Item(id) => scene.material(id).is_dirty(),
            }),
        };
        if materials_changed {
            update_materials(
                &self.context,
                scene,
                &self.default_material,
                mat_collector,
                tex_collector,
                out,
            )?;
        }

        if tex_collector.num_items() > 0 {
            let textures_changed = match &out.texture_bundle {
                None => true,
                Some(bundle) => {
                    tex_collector.needs_update(bundle, |id| scene.texture(id).is_dirty())
                }
            };
            if textures_changed {
                update_textures(&self.context, scene, tex_collector, out)?;
            }
        }

        // Switching the compiled scene requires re-attaching its handles.
        let id = scene.id();
        if self.current_scene != Some(id) {
            reload_intersector(&mut self.api, out)?;
            self.current_scene = Some(id);
        }

        scene.clear_dirty_flags();
        self.clear_material_dirty(scene, mat_collector);
        Ok(())
    }

    fn clear_material_dirty(
        &mut self,
        scene: &mut Scene,
        mat_collector: &Collector<MaterialHandle>,
    ) {
        let default_material = &mut self.default_material;
        mat_collector.finalize(|handle| match handle {
            MaterialHandle::Default => default_material.set_dirty(false),
            MaterialHandle::Item(id) => scene.material_mut(id).set_dirty(false),
        });
    }

    fn release_handles(&mut self, out: &mut CompiledScene<D>) {
        for handle in out.isect_shapes.drain(..) {
            self.api.detach(handle);
            self.api.delete(handle);
        }
        out.visible_shapes.clear();
    }
}

/// Collect the materials reachable from each shape, walking material
/// dependencies with an explicit worklist so cyclic graphs terminate.
fn collect_materials(
    scene: &Scene,
    default_material: &Material,
    collector: &mut Collector<MaterialHandle>,
) {
    collector.collect(scene.shapes(), |(_, shape), out| {
        let root = shape
            .material()
            .map(MaterialHandle::Item)
            .unwrap_or(MaterialHandle::Default);

        let mut worklist = vec![root];
        while let Some(handle) = worklist.pop() {
            // Only newly visited materials are expanded.
            if out.insert(handle) {
                let material = match handle {
                    MaterialHandle::Default => default_material,
                    MaterialHandle::Item(id) => scene.material(id),
                };
                worklist.extend(material.dependents().map(MaterialHandle::Item));
            }
        }
    });
}

/// Collect the textures referenced by committed materials and by lights.
fn collect_textures(
    scene: &Scene,
    default_material: &Material,
    mat_collector: &Collector<MaterialHandle>,
    collector: &mut Collector<TextureId>,
) {
    collector.collect(mat_collector.iter(), |handle, out| {
        let material = match handle {
            MaterialHandle::Default => default_material,
            MaterialHandle::Item(id) => scene.material(id),
        };
        out.extend(material.textures());
    });

    collector.collect(scene.lights(), |(_, light), out| {
        out.extend(light.texture());
    });
}
