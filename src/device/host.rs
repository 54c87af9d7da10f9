//! Host-memory device backend
//!
//! Buffers are plain vectors and every operation completes synchronously,
//! which makes this the backend for tests and CI. The device keeps running
//! allocation statistics so callers can assert that a compile pass touched
//! no buffers.

use super::{BufferAccess, DeviceBuffer, DeviceContext, QueueEvent};
use crate::error::CompileResult;
use bytemuck::Pod;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a host device's allocation counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostStats {
    pub buffers_created: u64,
    pub bytes_allocated: u64,
    pub maps: u64,
    pub flushes: u64,
}

/// In-memory device context
#[derive(Debug, Default)]
pub struct HostDevice {
    buffers_created: AtomicU64,
    bytes_allocated: AtomicU64,
    maps: AtomicU64,
    flushes: AtomicU64,
}

impl HostDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> HostStats {
        HostStats {
            buffers_created: self.buffers_created.load(Ordering::Relaxed),
            bytes_allocated: self.bytes_allocated.load(Ordering::Relaxed),
            maps: self.maps.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
        }
    }
}

/// Typed host buffer
#[derive(Debug, Clone)]
pub struct HostBuffer<T> {
    data: Vec<T>,
}

impl<T> HostBuffer<T> {
    /// Read back the buffer contents (host backend only).
    pub fn contents(&self) -> &[T] {
        &self.data
    }
}

impl<T> DeviceBuffer for HostBuffer<T> {
    fn len(&self) -> usize {
        self.data.len()
    }
}

/// Write lease over a host buffer
#[derive(Debug)]
pub struct HostMapping<'a, T>(&'a mut [T]);

impl<T> Deref for HostMapping<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.0
    }
}

impl<T> DerefMut for HostMapping<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.0
    }
}

/// Host queues are synchronous; waiting is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct HostEvent;

impl QueueEvent for HostEvent {
    fn wait(self) {}
}

impl DeviceContext for HostDevice {
    type Event = HostEvent;
    type Buffer<T: Pod> = HostBuffer<T>;
    type Mapping<'a, T: Pod> = HostMapping<'a, T> where Self: 'a;

    fn create_buffer<T: Pod>(
        &self,
        len: usize,
        _access: BufferAccess,
    ) -> CompileResult<HostBuffer<T>> {
        self.buffers_created.fetch_add(1, Ordering::Relaxed);
        self.bytes_allocated
            .fetch_add((len * std::mem::size_of::<T>()) as u64, Ordering::Relaxed);
        Ok(HostBuffer {
            data: vec![T::zeroed(); len],
        })
    }

    fn create_buffer_init<T: Pod>(
        &self,
        data: &[T],
        access: BufferAccess,
    ) -> CompileResult<HostBuffer<T>> {
        let mut buffer = self.create_buffer(data.len(), access)?;
        buffer.data.copy_from_slice(data);
        Ok(buffer)
    }

    fn map_write<'a, T: Pod>(
        &'a self,
        buffer: &'a mut HostBuffer<T>,
    ) -> CompileResult<HostMapping<'a, T>> {
        self.maps.fetch_add(1, Ordering::Relaxed);
        Ok(HostMapping(&mut buffer.data))
    }

    fn flush(&self) -> HostEvent {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        HostEvent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_map() {
        let device = HostDevice::new();
        let mut buffer = device.create_buffer::<u32>(4, BufferAccess::ReadOnly).unwrap();

        {
            let mut mapping = device.map_write(&mut buffer).unwrap();
            mapping[0] = 7;
            mapping[3] = 9;
        }
        device.flush().wait();

        assert_eq!(buffer.contents(), &[7, 0, 0, 9]);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_stats_track_allocations() {
        let device = HostDevice::new();
        let _a = device.create_buffer::<u32>(8, BufferAccess::ReadOnly).unwrap();
        let _b = device
            .create_buffer_init(&[1.0f32, 2.0], BufferAccess::ReadOnly)
            .unwrap();

        let stats = device.stats();
        assert_eq!(stats.buffers_created, 2);
        assert_eq!(stats.bytes_allocated, 8 * 4 + 2 * 4);
    }
}
