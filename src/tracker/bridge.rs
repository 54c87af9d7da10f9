//! Acceleration-structure lifecycle
//!
//! Mirrors the current shape partition into the intersection engine:
//! existing handles are detached and deleted, fresh handles created in
//! partition order with ids assigned monotonically from 1, and the visible
//! subset re-attached on reload. Excluded meshes receive handles but are
//! never attached.

use super::compiled::CompiledScene;
use super::shapes::split_meshes_and_instances;
use crate::device::DeviceContext;
use crate::error::{CompileError, CompileResult};
use crate::intersect::{Intersector, ShapeHandle, TriangleMeshDesc};
use crate::scene::{Scene, ShapeId};
use std::collections::HashMap;

/// Recreate every engine handle for the scene's current shape partition.
pub(crate) fn update_intersector<D: DeviceContext, I: Intersector>(
    api: &mut I,
    scene: &Scene,
    out: &mut CompiledScene<D>,
) -> CompileResult<()> {
    for handle in out.isect_shapes.drain(..) {
        api.detach(handle);
        api.delete(handle);
    }
    out.visible_shapes.clear();

    if scene.num_shapes() == 0 {
        return Err(CompileError::NoShapes);
    }

    let partition = split_meshes_and_instances(scene);

    // Mesh handle lookup for instance creation.
    let mut handles: HashMap<ShapeId, ShapeHandle> = HashMap::new();
    let mut next_id = 1u32;

    let mesh_ids = partition
        .meshes
        .iter()
        .map(|&id| (id, true))
        .chain(partition.excluded_meshes.iter().map(|&id| (id, false)));

    for (id, visible) in mesh_ids {
        let mesh = scene
            .mesh(id)
            .ok_or_else(|| CompileError::Scene("partition listed a non-mesh shape".to_string()))?;

        let handle = api.create_triangle_mesh(TriangleMeshDesc {
            vertices: mesh.positions(),
            indices: mesh.indices(),
        })?;

        let transform = mesh.transform();
        api.set_transform(handle, transform, transform.inverse());
        api.set_id(handle, next_id);
        next_id += 1;

        out.isect_shapes.push(handle);
        if visible {
            out.visible_shapes.push(handle);
        }
        handles.insert(id, handle);
    }

    for &id in &partition.instances {
        let instance = scene.shape(id).as_instance().ok_or_else(|| {
            CompileError::Scene("partition listed a non-instance shape".to_string())
        })?;

        let base_handle = handles.get(&instance.base()).copied().ok_or_else(|| {
            CompileError::Scene("instance base has no engine handle".to_string())
        })?;
        let handle = api.create_instance(base_handle)?;

        let transform = instance.transform();
        api.set_transform(handle, transform, transform.inverse());
        api.set_id(handle, next_id);
        next_id += 1;

        out.isect_shapes.push(handle);
        out.visible_shapes.push(handle);
    }

    log::debug!(
        "intersector pass: {} handles ({} visible)",
        out.isect_shapes.len(),
        out.visible_shapes.len()
    );
    Ok(())
}

/// Re-attach the visible handle set and commit the engine.
///
/// Must run whenever the attached set changes or the current scene identity
/// changes.
pub(crate) fn reload_intersector<D: DeviceContext, I: Intersector>(
    api: &mut I,
    out: &CompiledScene<D>,
) -> CompileResult<()> {
    api.detach_all();

    for &handle in &out.visible_shapes {
        api.attach(handle);
    }

    api.commit()
}
