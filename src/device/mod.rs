//! Device context abstraction
//!
//! The compiler owns typed, re-sizable device buffers and fills them through
//! scoped write mappings. Dropping a mapping releases the lease (the unmap);
//! [`DeviceContext::flush`] returns an event whose `wait` blocks until all
//! writes issued so far have landed, which is the only suspension point in a
//! compile pass. Queue semantics are in-order: the unmap of one buffer
//! happens before the map of any dependent buffer.

pub mod host;
pub mod wgpu;

pub use host::{HostDevice, HostStats};
pub use self::wgpu::WgpuDevice;

use crate::error::CompileResult;
use bytemuck::Pod;
use std::ops::DerefMut;

/// Requested access pattern for a new buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferAccess {
    /// Kernels read, the compiler writes.
    ReadOnly,
    /// Kernels read and write.
    ReadWrite,
}

/// Completion token for queued device work
pub trait QueueEvent {
    /// Block until the work this event tracks has completed.
    fn wait(self);
}

/// Minimal surface every device buffer exposes
pub trait DeviceBuffer {
    /// Element count the buffer was created with.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capability interface the compiler consumes from a device
pub trait DeviceContext {
    type Event: QueueEvent;
    type Buffer<T: Pod>: DeviceBuffer;
    type Mapping<'a, T: Pod>: DerefMut<Target = [T]>
    where
        Self: 'a;

    /// Allocate a typed buffer of `len` zeroed elements.
    fn create_buffer<T: Pod>(
        &self,
        len: usize,
        access: BufferAccess,
    ) -> CompileResult<Self::Buffer<T>>;

    /// Allocate a typed buffer initialized from host data.
    fn create_buffer_init<T: Pod>(
        &self,
        data: &[T],
        access: BufferAccess,
    ) -> CompileResult<Self::Buffer<T>>;

    /// Acquire a write lease over the whole buffer. The lease is released
    /// (unmapped) when the mapping is dropped, on every exit path.
    fn map_write<'a, T: Pod>(
        &'a self,
        buffer: &'a mut Self::Buffer<T>,
    ) -> CompileResult<Self::Mapping<'a, T>>;

    /// Submit all pending writes; `wait` on the returned event blocks until
    /// the queue drains.
    fn flush(&self) -> Self::Event;
}
