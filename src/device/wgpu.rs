//! wgpu-backed device context
//!
//! Each buffer pairs a GPU storage buffer with a host shadow. Write
//! mappings hand out the shadow; dropping the mapping flushes it with
//! `Queue::write_buffer`, and the flush event waits by polling the device.

use super::{BufferAccess, DeviceBuffer, DeviceContext, QueueEvent};
use crate::error::{CompileError, CompileResult};
use bytemuck::Pod;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Device context over a wgpu device/queue pair
#[derive(Debug, Clone)]
pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl WgpuDevice {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self { device, queue }
    }

    /// Acquire a headless device on the first available adapter.
    pub fn headless() -> CompileResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(
            instance.request_adapter(&wgpu::RequestAdapterOptions::default()),
        )
        .ok_or_else(|| CompileError::device("no suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(
            adapter.request_device(&wgpu::DeviceDescriptor::default(), None),
        )
        .map_err(|e| CompileError::device(e.to_string()))?;

        Ok(Self::new(Arc::new(device), Arc::new(queue)))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn usage(access: BufferAccess) -> wgpu::BufferUsages {
        match access {
            BufferAccess::ReadOnly => wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            BufferAccess::ReadWrite => {
                wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC
            }
        }
    }
}

/// GPU buffer plus its host shadow
#[derive(Debug)]
pub struct WgpuBuffer<T> {
    raw: wgpu::Buffer,
    shadow: Vec<T>,
}

impl<T> WgpuBuffer<T> {
    /// The underlying GPU buffer, for binding into kernels.
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.raw
    }
}

impl<T> DeviceBuffer for WgpuBuffer<T> {
    fn len(&self) -> usize {
        self.shadow.len()
    }
}

/// Write lease; flushes the shadow to the GPU buffer on drop
pub struct WgpuMapping<'a, T: Pod> {
    queue: &'a wgpu::Queue,
    raw: &'a wgpu::Buffer,
    shadow: &'a mut Vec<T>,
}

impl<T: Pod> Deref for WgpuMapping<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.shadow
    }
}

impl<T: Pod> DerefMut for WgpuMapping<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.shadow
    }
}

impl<T: Pod> Drop for WgpuMapping<'_, T> {
    fn drop(&mut self) {
        if !self.shadow.is_empty() {
            self.queue
                .write_buffer(self.raw, 0, bytemuck::cast_slice(self.shadow));
        }
    }
}

/// Tracks submitted work; waits by polling the device
pub struct WgpuEvent {
    device: Arc<wgpu::Device>,
}

impl QueueEvent for WgpuEvent {
    fn wait(self) {
        let _ = self.device.poll(wgpu::Maintain::Wait);
    }
}

impl DeviceContext for WgpuDevice {
    type Event = WgpuEvent;
    type Buffer<T: Pod> = WgpuBuffer<T>;
    type Mapping<'a, T: Pod> = WgpuMapping<'a, T> where Self: 'a;

    fn create_buffer<T: Pod>(
        &self,
        len: usize,
        access: BufferAccess,
    ) -> CompileResult<WgpuBuffer<T>> {
        // Buffer sizes must be non-zero and 4-byte aligned.
        let bytes = (len * std::mem::size_of::<T>()) as u64;
        let size = bytes.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT).max(4);

        let raw = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("rayforge-buffer"),
            size,
            usage: Self::usage(access),
            mapped_at_creation: false,
        });

        Ok(WgpuBuffer {
            raw,
            shadow: vec![T::zeroed(); len],
        })
    }

    fn create_buffer_init<T: Pod>(
        &self,
        data: &[T],
        access: BufferAccess,
    ) -> CompileResult<WgpuBuffer<T>> {
        let raw = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("rayforge-buffer"),
                contents: bytemuck::cast_slice(data),
                usage: Self::usage(access),
            });

        Ok(WgpuBuffer {
            raw,
            shadow: data.to_vec(),
        })
    }

    fn map_write<'a, T: Pod>(
        &'a self,
        buffer: &'a mut WgpuBuffer<T>,
    ) -> CompileResult<WgpuMapping<'a, T>> {
        let WgpuBuffer { raw, shadow } = buffer;
        Ok(WgpuMapping {
            queue: &self.queue,
            raw: &*raw,
            shadow,
        })
    }

    fn flush(&self) -> WgpuEvent {
        self.queue.submit(std::iter::empty());
        WgpuEvent {
            device: self.device.clone(),
        }
    }
}
