//! Material serialization
//!
//! Each material becomes one fixed-layout record. Cross-references to other
//! materials and to textures are resolved through the collectors' dense
//! indices; the material buffer is resized only upward.

use super::compiled::CompiledScene;
use crate::collector::Collector;
use crate::device::{BufferAccess, DeviceBuffer, DeviceContext, QueueEvent};
use crate::error::{CompileError, CompileResult};
use crate::gpu::GpuMaterial;
use crate::scene::{
    BlendKind, Bxdf, Material, MaterialHandle, MaterialInput, MaterialKind, Scene, TextureId,
};

fn bxdf_tag(kind: MaterialKind) -> i32 {
    match kind {
        MaterialKind::Single(Bxdf::Zero) => GpuMaterial::BXDF_ZERO,
        MaterialKind::Single(Bxdf::Lambert) => GpuMaterial::BXDF_LAMBERT,
        MaterialKind::Single(Bxdf::IdealReflect) => GpuMaterial::BXDF_IDEAL_REFLECT,
        MaterialKind::Single(Bxdf::IdealRefract) => GpuMaterial::BXDF_IDEAL_REFRACT,
        MaterialKind::Single(Bxdf::Emissive) => GpuMaterial::BXDF_EMISSIVE,
        MaterialKind::Single(Bxdf::Passthrough) => GpuMaterial::BXDF_PASSTHROUGH,
        MaterialKind::Single(Bxdf::Translucent) => GpuMaterial::BXDF_TRANSLUCENT,
        MaterialKind::Single(Bxdf::MicrofacetBeckmann) => GpuMaterial::BXDF_MICROFACET_BECKMANN,
        MaterialKind::Single(Bxdf::MicrofacetGGX) => GpuMaterial::BXDF_MICROFACET_GGX,
        MaterialKind::Single(Bxdf::MicrofacetRefractionGGX) => {
            GpuMaterial::BXDF_MICROFACET_REFRACTION_GGX
        }
        MaterialKind::Single(Bxdf::MicrofacetRefractionBeckmann) => {
            GpuMaterial::BXDF_MICROFACET_REFRACTION_BECKMANN
        }
        MaterialKind::Blend(BlendKind::Mix) => GpuMaterial::BXDF_MIX,
        MaterialKind::Blend(BlendKind::Layered) => GpuMaterial::BXDF_LAYERED,
        MaterialKind::Blend(BlendKind::FresnelBlend) => GpuMaterial::BXDF_FRESNEL_BLEND,
    }
}

fn texture_index(
    texture: Option<TextureId>,
    tex_collector: &Collector<TextureId>,
) -> CompileResult<i32> {
    match texture {
        None => Ok(-1),
        Some(id) => tex_collector
            .index_of(&id)
            .map(|i| i as i32)
            .ok_or_else(|| CompileError::material("referenced texture was not collected")),
    }
}

fn material_index(
    id: crate::scene::MaterialId,
    mat_collector: &Collector<MaterialHandle>,
) -> CompileResult<i32> {
    mat_collector
        .index_of(&MaterialHandle::Item(id))
        .map(|i| i as i32)
        .ok_or_else(|| CompileError::material("referenced material was not collected"))
}

fn write_single(
    material: &Material,
    bxdf: Bxdf,
    tex_collector: &Collector<TextureId>,
    record: &mut GpuMaterial,
) -> CompileResult<()> {
    if bxdf == Bxdf::Zero {
        record.kx = [0.0; 4];
        return Ok(());
    }

    if bxdf.is_microfacet() {
        match material.input("roughness") {
            Some(MaterialInput::Float(value)) => {
                record.ns = value.x;
                record.ns_map_idx = -1;
            }
            Some(MaterialInput::Texture(texture)) => {
                record.ns_map_idx = texture_index(*texture, tex_collector)?;
            }
            Some(MaterialInput::Material(_)) => {
                return Err(CompileError::material(
                    "roughness input has an impossible type for a microfacet bxdf",
                ));
            }
            None => record.ns_map_idx = -1,
        }
        // Falls through: the shared branch below overwrites `ns` with the
        // scalar fallback even when a roughness texture was just recorded.
    }

    match material.input("albedo") {
        Some(MaterialInput::Float(value)) => {
            record.kx = value.to_array();
            record.kx_map_idx = -1;
        }
        Some(MaterialInput::Texture(texture)) => {
            record.kx_map_idx = texture_index(*texture, tex_collector)?;
        }
        Some(MaterialInput::Material(_)) => {
            return Err(CompileError::material(
                "albedo input has an impossible type",
            ));
        }
        None => {
            record.kx = [0.7, 0.7, 0.7, 1.0];
            record.kx_map_idx = -1;
        }
    }

    match material.input("normal") {
        Some(MaterialInput::Texture(Some(texture))) => {
            record.normal_map_idx = texture_index(Some(*texture), tex_collector)?;
            record.bump_flag = 0;
        }
        _ => match material.input("bump") {
            Some(MaterialInput::Texture(Some(texture))) => {
                record.normal_map_idx = texture_index(Some(*texture), tex_collector)?;
                record.bump_flag = 1;
            }
            _ => {
                record.normal_map_idx = -1;
                record.bump_flag = 0;
            }
        },
    }

    record.fresnel = match material.input("fresnel") {
        Some(MaterialInput::Float(value)) if value.x > 0.0 => 1.0,
        _ => 0.0,
    };

    record.ni = match material.input("ior") {
        Some(MaterialInput::Float(value)) => value.x,
        _ => 1.0,
    };

    record.ns = match material.input("roughness") {
        Some(MaterialInput::Float(value)) => value.x,
        _ => 0.99,
    };

    Ok(())
}

fn write_blend(
    material: &Material,
    blend: BlendKind,
    mat_collector: &Collector<MaterialHandle>,
    tex_collector: &Collector<TextureId>,
    record: &mut GpuMaterial,
) -> CompileResult<()> {
    // Layered materials carry only their tag.
    if blend == BlendKind::Layered {
        return Ok(());
    }

    match (
        material.input("base_material"),
        material.input("top_material"),
    ) {
        (
            Some(MaterialInput::Material(base)),
            Some(MaterialInput::Material(top)),
        ) => {
            record.brdf_base_idx = material_index(*base, mat_collector)?;
            record.brdf_top_idx = material_index(*top, mat_collector)?;
        }
        _ => {
            return Err(CompileError::material(
                "blend material requires base_material and top_material inputs",
            ));
        }
    }

    match blend {
        BlendKind::Mix => {
            record.fresnel = 0.0;
            match material.input("weight") {
                Some(MaterialInput::Texture(Some(texture))) => {
                    record.ns_map_idx = texture_index(Some(*texture), tex_collector)?;
                }
                Some(MaterialInput::Texture(None)) => {
                    return Err(CompileError::material("mix weight texture is unset"));
                }
                Some(MaterialInput::Float(value)) => {
                    record.ns_map_idx = -1;
                    record.ns = value.x;
                }
                Some(MaterialInput::Material(_)) => {
                    return Err(CompileError::material(
                        "weight input has an impossible type",
                    ));
                }
                None => {
                    record.ns_map_idx = -1;
                    record.ns = 0.5;
                }
            }
        }
        BlendKind::FresnelBlend => {
            record.fresnel = 1.0;
            match material.input("ior") {
                Some(MaterialInput::Float(value)) => record.ni = value.x,
                _ => {
                    return Err(CompileError::material(
                        "fresnel blend requires a scalar ior input",
                    ));
                }
            }
        }
        BlendKind::Layered => unreachable!("handled above"),
    }

    Ok(())
}

/// Serialize one material into its device record.
pub(crate) fn write_material(
    material: &Material,
    mat_collector: &Collector<MaterialHandle>,
    tex_collector: &Collector<TextureId>,
) -> CompileResult<GpuMaterial> {
    let mut record = GpuMaterial {
        kx_map_idx: -1,
        normal_map_idx: -1,
        ns_map_idx: -1,
        brdf_base_idx: -1,
        brdf_top_idx: -1,
        ..Default::default()
    };
    record.bxdf = bxdf_tag(material.kind());

    match material.kind() {
        MaterialKind::Single(bxdf) => write_single(material, bxdf, tex_collector, &mut record)?,
        MaterialKind::Blend(blend) => {
            write_blend(material, blend, mat_collector, tex_collector, &mut record)?
        }
    }

    Ok(record)
}

/// Rewrite the materials buffer and snapshot the collector bundle.
pub(crate) fn update_materials<D: DeviceContext>(
    context: &D,
    scene: &mut Scene,
    default_material: &Material,
    mat_collector: &Collector<MaterialHandle>,
    tex_collector: &Collector<TextureId>,
    out: &mut CompiledScene<D>,
) -> CompileResult<()> {
    let count = mat_collector.num_items();

    let mut buffer = match out.materials.take() {
        Some(buffer) if buffer.len() >= count => buffer,
        _ => context.create_buffer(count, BufferAccess::ReadOnly)?,
    };

    // Snapshot first so the next pass diffs against this serialization.
    out.material_bundle = Some(mat_collector.create_bundle());

    {
        let mut mapping = context.map_write(&mut buffer)?;
        for (i, handle) in mat_collector.iter().enumerate() {
            let material = match handle {
                MaterialHandle::Default => default_material,
                MaterialHandle::Item(id) => scene.material(id),
            };
            mapping[i] = write_material(material, mat_collector, tex_collector)?;

            if let MaterialHandle::Item(id) = handle {
                scene.material_mut(id).set_dirty(false);
            }
        }
    }
    context.flush().wait();

    out.materials = Some(buffer);
    log::debug!("material pass: {} materials", count);
    Ok(())
}
