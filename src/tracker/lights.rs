//! Light serialization
//!
//! The lights buffer is resized only upward; `num_lights` bounds the valid
//! prefix. The pass records the index of the last IBL light encountered as
//! the scene's environment map.

use super::compiled::CompiledScene;
use super::float4;
use super::shapes::{split_meshes_and_instances, ShapePartition};
use crate::collector::Collector;
use crate::device::{BufferAccess, DeviceBuffer, DeviceContext, QueueEvent};
use crate::error::{CompileError, CompileResult};
use crate::gpu::GpuLight;
use crate::scene::{Light, LightKind, Scene, TextureId};

fn write_light(
    light: &Light,
    tex_collector: &Collector<TextureId>,
    partition: &ShapePartition,
) -> CompileResult<GpuLight> {
    let mut record = GpuLight {
        shape_idx: -1,
        prim_idx: -1,
        tex: -1,
        tex_diffuse: -1,
        ..Default::default()
    };

    match *light.kind() {
        LightKind::Point {
            position,
            intensity,
        } => {
            record.kind = GpuLight::KIND_POINT;
            record.position = float4(position);
            record.intensity = float4(intensity);
        }
        LightKind::Directional {
            direction,
            intensity,
        } => {
            record.kind = GpuLight::KIND_DIRECTIONAL;
            record.direction = float4(direction);
            record.intensity = float4(intensity);
        }
        LightKind::Spot {
            position,
            direction,
            intensity,
            cone_shape,
        } => {
            record.kind = GpuLight::KIND_SPOT;
            record.position = float4(position);
            record.direction = float4(direction);
            record.intensity = float4(intensity);
            record.inner_angle = cone_shape.x;
            record.outer_angle = cone_shape.y;
        }
        LightKind::Ibl {
            texture,
            multiplier,
        } => {
            record.kind = GpuLight::KIND_IBL;
            record.multiplier = multiplier;
            let tex = tex_collector
                .index_of(&texture)
                .ok_or_else(|| CompileError::light("ibl texture was not collected"))?;
            record.tex = tex as i32;
            record.tex_diffuse = tex as i32;
        }
        LightKind::Area { shape, prim_idx } => {
            record.kind = GpuLight::KIND_AREA;
            let shape_idx = partition.index_of(shape).ok_or_else(|| {
                CompileError::light("area light references a shape outside the scene")
            })?;
            record.shape_idx = shape_idx as i32;
            record.prim_idx = prim_idx as i32;
        }
    }

    Ok(record)
}

/// Rewrite the lights buffer and refresh `num_lights` / `envmap_idx`.
pub(crate) fn update_lights<D: DeviceContext>(
    context: &D,
    scene: &mut Scene,
    tex_collector: &Collector<TextureId>,
    out: &mut CompiledScene<D>,
) -> CompileResult<()> {
    let num_lights = scene.num_lights();

    let mut buffer = match out.lights.take() {
        Some(buffer) if buffer.len() >= num_lights => buffer,
        _ => context.create_buffer(num_lights, BufferAccess::ReadOnly)?,
    };

    // Shared by every area light in this pass.
    let partition = split_meshes_and_instances(scene);

    // Disable IBL until one is seen; last one wins.
    out.envmap_idx = -1;

    {
        let mut mapping = context.map_write(&mut buffer)?;
        let ids: Vec<_> = scene.lights().map(|(id, _)| id).collect();
        for (i, id) in ids.into_iter().enumerate() {
            mapping[i] = write_light(scene.light(id), tex_collector, &partition)?;

            if scene.light(id).is_ibl() {
                out.envmap_idx = i as i32;
            }

            scene.light_mut(id).set_dirty(false);
        }
    }
    context.flush().wait();

    out.lights = Some(buffer);
    out.num_lights = num_lights as u32;

    log::debug!("light pass: {} lights, envmap_idx {}", num_lights, out.envmap_idx);
    Ok(())
}
