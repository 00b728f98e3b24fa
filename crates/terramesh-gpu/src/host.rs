//! In-memory buffer backend.
//!
//! Buffers live in host memory. Used for headless runs and tests, where it
//! also records map/unmap counts and can be told to fail upcoming maps or
//! unmaps.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use bytemuck::Pod;
use tracing::debug;

use crate::buffer::{BufferAllocator, BufferDesc, BufferKind, DynamicBuffer, MappedBuffer};
use crate::error::{GpuError, Result};

/// Byte written over a buffer's contents on map when poisoning is enabled.
pub const DISCARD_POISON: u8 = 0xCD;

#[derive(Debug, Default)]
struct SharedState {
    maps: AtomicU64,
    unmaps: AtomicU64,
    failing_maps: AtomicUsize,
    failing_vertex_maps: AtomicUsize,
    failing_index_maps: AtomicUsize,
    failing_unmaps: AtomicUsize,
}

impl SharedState {
    fn failing_maps_of(&self, kind: BufferKind) -> &AtomicUsize {
        match kind {
            BufferKind::Vertex => &self.failing_vertex_maps,
            BufferKind::Index => &self.failing_index_maps,
        }
    }
}

/// Consume one pending injected failure, if any.
fn take_failure(pending: &AtomicUsize) -> bool {
    pending
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Map/unmap counters of all buffers created by one [`HostAllocator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostStats {
    pub maps: u64,
    pub unmaps: u64,
}

/// Allocator for [`HostBuffer`]s.
#[derive(Debug, Default)]
pub struct HostAllocator {
    shared: Arc<SharedState>,
    poison_on_map: bool,
    allocated_bytes: u64,
}

impl HostAllocator {
    /// Create a new allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite buffer contents with [`DISCARD_POISON`] on every map, so
    /// readers of stale data show up in tests.
    #[must_use]
    pub const fn with_discard_poison(mut self, poison: bool) -> Self {
        self.poison_on_map = poison;
        self
    }

    /// Make the next `count` maps (on any buffer from this allocator) fail.
    pub fn fail_next_maps(&self, count: usize) {
        self.shared.failing_maps.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` maps of `kind` buffers fail. Maps of the other
    /// kind still succeed.
    pub fn fail_next_maps_of(&self, kind: BufferKind, count: usize) {
        self.shared.failing_maps_of(kind).store(count, Ordering::SeqCst);
    }

    /// Make the next `count` explicit [`MappedBuffer::unmap`] calls fail.
    /// The mapping is still released.
    pub fn fail_next_unmaps(&self, count: usize) {
        self.shared.failing_unmaps.store(count, Ordering::SeqCst);
    }

    /// Counters across all buffers from this allocator.
    pub fn stats(&self) -> HostStats {
        HostStats {
            maps: self.shared.maps.load(Ordering::SeqCst),
            unmaps: self.shared.unmaps.load(Ordering::SeqCst),
        }
    }

    /// Total bytes handed out so far.
    pub const fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes
    }
}

impl BufferAllocator for HostAllocator {
    type Buffer = HostBuffer;

    fn create_buffer(&mut self, desc: BufferDesc) -> Result<HostBuffer> {
        let len = usize::try_from(desc.size).map_err(|_| {
            GpuError::AllocationFailed(format!(
                "{}: {} bytes exceeds address space",
                desc.name, desc.size
            ))
        })?;

        // Backed by u64 words so typed views of the bytes are always aligned.
        let words = len.div_ceil(std::mem::size_of::<u64>());
        let mut storage = Vec::new();
        storage.try_reserve_exact(words).map_err(|e| {
            GpuError::AllocationFailed(format!("{}: {} bytes: {e}", desc.name, desc.size))
        })?;
        storage.resize(words, 0u64);

        debug!(
            buffer = %desc.name,
            kind = ?desc.kind,
            size_bytes = desc.size,
            size_mb = desc.size as f64 / (1024.0 * 1024.0),
            "host buffer allocated"
        );
        self.allocated_bytes += desc.size;

        Ok(HostBuffer {
            desc,
            len,
            storage,
            shared: Arc::clone(&self.shared),
            poison_on_map: self.poison_on_map,
        })
    }
}

/// A dynamic buffer in host memory.
#[derive(Debug)]
pub struct HostBuffer {
    desc: BufferDesc,
    len: usize,
    storage: Vec<u64>,
    shared: Arc<SharedState>,
    poison_on_map: bool,
}

impl HostBuffer {
    /// Current contents.
    pub fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.storage)[..self.len]
    }

    /// Current contents viewed as `T`.
    pub fn read<T: Pod>(&self) -> Result<&[T]> {
        bytemuck::try_cast_slice(self.bytes()).map_err(|e| GpuError::SizeMismatch(format!("{e:?}")))
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut(&mut self.storage)[..self.len]
    }
}

impl DynamicBuffer for HostBuffer {
    type Mapping<'a> = HostMapping<'a>;

    fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    fn map_write_discard(&mut self) -> Result<HostMapping<'_>> {
        let injected = take_failure(&self.shared.failing_maps)
            || take_failure(self.shared.failing_maps_of(self.desc.kind));
        if injected {
            return Err(GpuError::MapFailed(format!(
                "{}: injected map failure",
                self.desc.name
            )));
        }

        self.shared.maps.fetch_add(1, Ordering::SeqCst);
        if self.poison_on_map {
            self.bytes_mut().fill(DISCARD_POISON);
        }
        Ok(HostMapping { buffer: self })
    }
}

/// Write mapping of a [`HostBuffer`].
#[derive(Debug)]
pub struct HostMapping<'a> {
    buffer: &'a mut HostBuffer,
}

impl Deref for HostMapping<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buffer.bytes()
    }
}

impl DerefMut for HostMapping<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buffer.bytes_mut()
    }
}

impl MappedBuffer for HostMapping<'_> {
    fn unmap(self) -> Result<()> {
        let injected = take_failure(&self.buffer.shared.failing_unmaps);
        let name = injected.then(|| self.buffer.desc.name.clone());
        drop(self);
        match name {
            Some(name) => Err(GpuError::UnmapFailed(format!("{name}: injected unmap failure"))),
            None => Ok(()),
        }
    }
}

impl Drop for HostMapping<'_> {
    fn drop(&mut self) {
        self.buffer.shared.unmaps.fetch_add(1, Ordering::SeqCst);
    }
}
