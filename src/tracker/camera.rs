//! Camera serialization

use super::compiled::CompiledScene;
use super::float4;
use crate::device::{BufferAccess, DeviceContext, QueueEvent};
use crate::error::{CompileError, CompileResult};
use crate::gpu::GpuCamera;
use crate::scene::{CameraType, Scene};

/// Rewrite the length-1 camera buffer from the scene camera.
pub(crate) fn update_camera<D: DeviceContext>(
    context: &D,
    scene: &mut Scene,
    out: &mut CompiledScene<D>,
) -> CompileResult<()> {
    let record = {
        let camera = scene.camera().ok_or(CompileError::NoCamera)?;

        out.camera_type = if camera.aperture() > 0.0 {
            CameraType::Physical
        } else {
            CameraType::Default
        };

        GpuCamera {
            forward: float4(camera.forward()),
            up: float4(camera.up()),
            right: float4(camera.right()),
            position: float4(camera.position()),
            sensor_size: camera.sensor_size().to_array(),
            depth_range: camera.depth_range().to_array(),
            aperture: camera.aperture(),
            aspect_ratio: camera.aspect_ratio(),
            focal_length: camera.focal_length(),
            focus_distance: camera.focus_distance(),
        }
    };

    let mut buffer = match out.camera.take() {
        Some(buffer) => buffer,
        None => context.create_buffer(1, BufferAccess::ReadOnly)?,
    };
    {
        let mut mapping = context.map_write(&mut buffer)?;
        mapping[0] = record;
    }
    context.flush().wait();
    out.camera = Some(buffer);

    if let Some(camera) = scene.camera_mut() {
        camera.set_dirty(false);
    }
    Ok(())
}
