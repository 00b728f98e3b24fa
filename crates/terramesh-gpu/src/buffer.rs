//! Dynamic buffers and write-discard mapping.
//!
//! A dynamic buffer is created once with a fixed size and rewritten by the
//! CPU many times. Each write goes through [`DynamicBuffer::map_write_discard`],
//! which hands out a scoped [`MappedBuffer`]. Prior contents are undefined
//! after mapping; the mapping is committed when it is unmapped or dropped.

use std::ops::DerefMut;

use bytemuck::Pod;

use crate::error::{GpuError, Result};

/// What a buffer is bound as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Vertex buffer
    Vertex,
    /// Index buffer
    Index,
}

/// Description of a dynamic buffer to allocate.
///
/// Buffers are rewritten by the CPU on every rebuild and read by the GPU.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferDesc {
    /// Debug name
    pub name: String,
    /// Binding kind
    pub kind: BufferKind,
    /// Size in bytes
    pub size: u64,
}

impl BufferDesc {
    /// Describe a dynamic vertex buffer.
    pub fn vertex(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: BufferKind::Vertex,
            size,
        }
    }

    /// Describe a dynamic index buffer.
    pub fn index(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: BufferKind::Index,
            size,
        }
    }
}

/// A mapped, CPU-writable view of a buffer.
///
/// Dropping the mapping unmaps it. Call [`MappedBuffer::unmap`] instead when
/// the caller needs to know whether the commit succeeded.
pub trait MappedBuffer: DerefMut<Target = [u8]> {
    /// Unmap and commit the written bytes.
    fn unmap(self) -> Result<()>;

    /// View the mapped bytes as a slice of `T`.
    fn as_slice_mut<T: Pod>(&mut self) -> Result<&mut [T]>
    where
        Self: Sized,
    {
        bytemuck::try_cast_slice_mut(&mut **self)
            .map_err(|e| GpuError::SizeMismatch(format!("{e:?}")))
    }
}

/// A fixed-size buffer the CPU rewrites through write-discard mappings.
pub trait DynamicBuffer: Send {
    /// Mapping handed out by [`DynamicBuffer::map_write_discard`].
    type Mapping<'a>: MappedBuffer
    where
        Self: 'a;

    /// The description the buffer was created from.
    fn desc(&self) -> &BufferDesc;

    /// Size in bytes.
    fn size(&self) -> u64 {
        self.desc().size
    }

    /// Map the whole buffer for exclusive write access.
    ///
    /// Prior contents may be discarded.
    fn map_write_discard(&mut self) -> Result<Self::Mapping<'_>>;
}

/// Creates dynamic buffers.
pub trait BufferAllocator {
    /// Buffer type produced by this allocator.
    type Buffer: DynamicBuffer;

    /// Allocate a buffer. The size is permanent.
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Self::Buffer>;
}
