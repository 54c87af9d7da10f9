//! Shape partitioning and geometry serialization
//!
//! Shapes are split into meshes, excluded meshes (instance bases absent
//! from the scene's shape list) and instances. Serialization lays meshes
//! and excluded meshes out in shared vertex/index pools; instances reuse
//! their base mesh's record with their own transform and material-id
//! region. The order meshes -> excluded meshes -> instances defines every
//! per-shape index, including the intersector id assignment.

use super::compiled::{CompiledScene, GeometryBuffers};
use crate::collector::Collector;
use crate::device::{BufferAccess, DeviceContext, QueueEvent};
use crate::error::{CompileError, CompileResult};
use crate::gpu::{GpuShape, GpuVertex};
use crate::scene::{Instance, MaterialHandle, Mesh, Scene, Shape, ShapeId};
use std::collections::{HashMap, HashSet};

/// Disjoint shape sets in deterministic serialization order
pub(crate) struct ShapePartition {
    pub meshes: Vec<ShapeId>,
    pub excluded_meshes: Vec<ShapeId>,
    pub instances: Vec<ShapeId>,
}

impl ShapePartition {
    /// Position of a shape in the meshes -> excluded -> instances order.
    pub fn index_of(&self, id: ShapeId) -> Option<usize> {
        self.meshes
            .iter()
            .chain(&self.excluded_meshes)
            .chain(&self.instances)
            .position(|&s| s == id)
    }

    pub fn num_shapes(&self) -> usize {
        self.meshes.len() + self.excluded_meshes.len() + self.instances.len()
    }
}

/// Split the scene's shapes into meshes, instances, and the base meshes
/// referenced by instances but not present in the shape list.
pub(crate) fn split_meshes_and_instances(scene: &Scene) -> ShapePartition {
    let mut meshes = Vec::new();
    let mut instances = Vec::new();

    for (id, shape) in scene.shapes() {
        match shape {
            Shape::Mesh(_) => meshes.push(id),
            Shape::Instance(_) => instances.push(id),
        }
    }

    let listed: HashSet<ShapeId> = meshes.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut excluded_meshes = Vec::new();
    for &id in &instances {
        if let Shape::Instance(instance) = scene.shape(id) {
            let base = instance.base();
            if !listed.contains(&base) && seen.insert(base) {
                excluded_meshes.push(base);
            }
        }
    }

    ShapePartition {
        meshes,
        excluded_meshes,
        instances,
    }
}

fn instance(scene: &Scene, id: ShapeId) -> CompileResult<&Instance> {
    scene
        .shape(id)
        .as_instance()
        .ok_or_else(|| CompileError::Scene("partition listed a non-instance shape".to_string()))
}

fn mesh(scene: &Scene, id: ShapeId) -> CompileResult<&Mesh> {
    scene
        .mesh(id)
        .ok_or_else(|| CompileError::Scene("partition listed a non-mesh shape".to_string()))
}

fn material_index(
    material: Option<crate::scene::MaterialId>,
    mat_collector: &Collector<MaterialHandle>,
) -> CompileResult<i32> {
    let handle = material.map(MaterialHandle::Item).unwrap_or(MaterialHandle::Default);
    mat_collector
        .index_of(&handle)
        .map(|i| i as i32)
        .ok_or_else(|| CompileError::material("shape material was not collected"))
}

fn shape_record(mesh: &Mesh, vtx_written: usize, idx_written: usize, matid_written: usize) -> GpuShape {
    GpuShape {
        num_prims: mesh.num_prims() as i32,
        start_vtx: vtx_written as i32,
        start_idx: idx_written as i32,
        start_material_idx: matid_written as i32,
        transform: mesh.transform().transpose().to_cols_array_2d(),
        linear_velocity: [0.0, 0.0, 0.0, 0.0],
        angular_velocity: [0.0, 0.0, 0.0, 1.0],
    }
}

/// Rebuild the pooled geometry buffers, shape records and material-id map.
pub(crate) fn update_shapes<D: DeviceContext>(
    context: &D,
    scene: &mut Scene,
    mat_collector: &Collector<MaterialHandle>,
    out: &mut CompiledScene<D>,
) -> CompileResult<()> {
    let partition = split_meshes_and_instances(scene);

    // Instances occupy no pool space, only material-id entries.
    let mut num_vertices = 0;
    let mut num_normals = 0;
    let mut num_uvs = 0;
    let mut num_indices = 0;
    let mut num_material_ids = 0;

    for &id in partition.meshes.iter().chain(&partition.excluded_meshes) {
        let mesh = mesh(scene, id)?;
        num_vertices += mesh.num_vertices();
        num_normals += mesh.num_normals();
        num_uvs += mesh.num_uvs();
        num_indices += mesh.num_indices();
        num_material_ids += mesh.num_prims();
    }
    for &id in &partition.instances {
        let base = mesh(scene, instance(scene, id)?.base())?;
        num_material_ids += base.num_prims();
    }

    log::debug!(
        "shape pass: {} meshes, {} excluded, {} instances, {} vertices, {} indices",
        partition.meshes.len(),
        partition.excluded_meshes.len(),
        partition.instances.len(),
        num_vertices,
        num_indices
    );

    let mut geometry = GeometryBuffers {
        vertices: context.create_buffer(num_vertices, BufferAccess::ReadOnly)?,
        normals: context.create_buffer(num_normals, BufferAccess::ReadOnly)?,
        uvs: context.create_buffer(num_uvs, BufferAccess::ReadOnly)?,
        indices: context.create_buffer(num_indices, BufferAccess::ReadOnly)?,
        shapes: context.create_buffer(partition.num_shapes(), BufferAccess::ReadOnly)?,
        material_ids: context.create_buffer(num_material_ids, BufferAccess::ReadOnly)?,
    };

    {
        let mut vertices = context.map_write(&mut geometry.vertices)?;
        let mut normals = context.map_write(&mut geometry.normals)?;
        let mut uvs = context.map_write(&mut geometry.uvs)?;
        let mut indices = context.map_write(&mut geometry.indices)?;
        let mut material_ids = context.map_write(&mut geometry.material_ids)?;
        let mut shapes = context.map_write(&mut geometry.shapes)?;

        let mut vtx_written = 0;
        let mut nrm_written = 0;
        let mut uv_written = 0;
        let mut idx_written = 0;
        let mut matid_written = 0;
        let mut shapes_written = 0;

        // Base-shape records retained for instance serialization below.
        let mut records: HashMap<ShapeId, GpuShape> = HashMap::new();

        let mesh_ids = partition
            .meshes
            .iter()
            .map(|&id| (id, false))
            .chain(partition.excluded_meshes.iter().map(|&id| (id, true)));

        for (id, excluded) in mesh_ids {
            let m = mesh(scene, id)?;
            let record = shape_record(m, vtx_written, idx_written, matid_written);

            for (dst, &src) in vertices[vtx_written..vtx_written + m.num_vertices()]
                .iter_mut()
                .zip(m.positions())
            {
                *dst = GpuVertex::from(src);
            }
            vtx_written += m.num_vertices();

            for (dst, &src) in normals[nrm_written..nrm_written + m.num_normals()]
                .iter_mut()
                .zip(m.normals())
            {
                *dst = GpuVertex::from(src);
            }
            nrm_written += m.num_normals();

            for (dst, &src) in uvs[uv_written..uv_written + m.num_uvs()]
                .iter_mut()
                .zip(m.uvs())
            {
                *dst = src.to_array();
            }
            uv_written += m.num_uvs();

            indices[idx_written..idx_written + m.num_indices()].copy_from_slice(m.indices());
            idx_written += m.num_indices();

            // Excluded meshes are never shaded.
            let mat_idx = if excluded {
                -1
            } else {
                material_index(m.material(), mat_collector)?
            };
            material_ids[matid_written..matid_written + m.num_prims()].fill(mat_idx);
            matid_written += m.num_prims();

            records.insert(id, record);
            shapes[shapes_written] = record;
            shapes_written += 1;

            scene.shape_mut(id).set_dirty(false);
        }

        for &id in &partition.instances {
            let inst = instance(scene, id)?;
            let base = inst.base();
            let inst_transform = inst.transform();
            let inst_material = inst.material();

            // The base record is guaranteed present: every instance base is
            // either a listed mesh or an excluded mesh serialized above.
            let mut record = *records.get(&base).ok_or_else(|| {
                CompileError::Scene("instance base was not serialized".to_string())
            })?;
            record.start_material_idx = matid_written as i32;
            record.transform = inst_transform.transpose().to_cols_array_2d();

            let mat_idx = material_index(inst_material, mat_collector)?;
            material_ids[matid_written..matid_written + record.num_prims as usize].fill(mat_idx);
            matid_written += record.num_prims as usize;

            shapes[shapes_written] = record;
            shapes_written += 1;

            scene.shape_mut(id).set_dirty(false);
        }
    }
    context.flush().wait();

    out.geometry = Some(geometry);
    Ok(())
}
