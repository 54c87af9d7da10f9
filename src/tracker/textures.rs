//! Texture serialization
//!
//! Two passes: headers with cumulative byte offsets first, then payload
//! bytes into the shared blob. Both buffers are resized only upward. With
//! no textures collected, both buffers are allocated at length 1 and left
//! untouched.

use super::compiled::{CompiledScene, TextureBuffers};
use crate::collector::Collector;
use crate::device::{BufferAccess, DeviceBuffer, DeviceContext, QueueEvent};
use crate::error::CompileResult;
use crate::gpu::GpuTexture;
use crate::scene::{Scene, TextureFormat, TextureId};

fn format_tag(format: TextureFormat) -> i32 {
    match format {
        TextureFormat::Rgba8 => GpuTexture::FORMAT_RGBA8,
        TextureFormat::Rgba16 => GpuTexture::FORMAT_RGBA16,
        TextureFormat::Rgba32 => GpuTexture::FORMAT_RGBA32,
    }
}

/// Rewrite the texture headers and payload blob.
pub(crate) fn update_textures<D: DeviceContext>(
    context: &D,
    scene: &mut Scene,
    tex_collector: &Collector<TextureId>,
    out: &mut CompiledScene<D>,
) -> CompileResult<()> {
    let count = tex_collector.num_items();

    if count == 0 {
        out.textures = Some(TextureBuffers {
            headers: context.create_buffer(1, BufferAccess::ReadOnly)?,
            data: context.create_buffer(1, BufferAccess::ReadOnly)?,
        });
        return Ok(());
    }

    let (prev_headers, prev_data) = match out.textures.take() {
        Some(buffers) => (Some(buffers.headers), Some(buffers.data)),
        None => (None, None),
    };

    let mut headers = match prev_headers {
        Some(buffer) if buffer.len() >= count => buffer,
        _ => context.create_buffer(count, BufferAccess::ReadOnly)?,
    };

    out.texture_bundle = Some(tex_collector.create_bundle());

    let mut total_bytes = 0usize;
    {
        let mut mapping = context.map_write(&mut headers)?;
        for (i, id) in tex_collector.iter().enumerate() {
            let texture = scene.texture(id);
            mapping[i] = GpuTexture {
                width: texture.width() as i32,
                height: texture.height() as i32,
                format: format_tag(texture.format()),
                data_offset: total_bytes as i32,
            };
            total_bytes += texture.size_in_bytes();
        }
    }

    let mut data = match prev_data {
        Some(buffer) if buffer.len() >= total_bytes => buffer,
        _ => context.create_buffer(total_bytes, BufferAccess::ReadOnly)?,
    };

    {
        let mut mapping = context.map_write(&mut data)?;
        let mut offset = 0usize;
        for id in tex_collector.iter() {
            let size = {
                let texture = scene.texture(id);
                mapping[offset..offset + texture.size_in_bytes()].copy_from_slice(texture.data());
                texture.size_in_bytes()
            };
            offset += size;
            scene.texture_mut(id).set_dirty(false);
        }
    }
    context.flush().wait();

    out.textures = Some(TextureBuffers { headers, data });
    log::debug!("texture pass: {} textures, {} payload bytes", count, total_bytes);
    Ok(())
}
