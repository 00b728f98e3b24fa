//! Vulkan buffer backend built on `gpu-allocator`.
//!
//! Buffers are allocated in `CpuToGpu` memory and stay persistently mapped.
//! Write-discard is the caller's contract: the host must not rewrite a
//! buffer a frame in flight is still reading.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::buffer::{BufferAllocator, BufferDesc, BufferKind, DynamicBuffer, MappedBuffer};
use crate::error::{GpuError, Result};

/// Creates host-visible vertex and index buffers.
pub struct VulkanBufferAllocator {
    device: Arc<ash::Device>,
    allocator: Arc<Mutex<Allocator>>,
}

impl VulkanBufferAllocator {
    /// Wrap an existing device and allocator.
    pub const fn new(device: Arc<ash::Device>, allocator: Arc<Mutex<Allocator>>) -> Self {
        Self { device, allocator }
    }
}

impl BufferAllocator for VulkanBufferAllocator {
    type Buffer = VulkanBuffer;

    fn create_buffer(&mut self, desc: BufferDesc) -> Result<VulkanBuffer> {
        let usage = match desc.kind {
            BufferKind::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
            BufferKind::Index => vk::BufferUsageFlags::INDEX_BUFFER,
        };
        let buffer_info = vk::BufferCreateInfo::default()
            .size(desc.size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { self.device.create_buffer(&buffer_info, None)? };
        let requirements = unsafe { self.device.get_buffer_memory_requirements(buffer) };

        let allocation = self
            .allocator
            .lock()
            .allocate(&AllocationCreateDesc {
                name: &desc.name,
                requirements,
                location: MemoryLocation::CpuToGpu,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                unsafe { self.device.destroy_buffer(buffer, None) };
                GpuError::AllocationFailed(format!("{}: {e}", desc.name))
            })?;

        if let Err(e) = unsafe {
            self.device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
        } {
            if let Err(free_err) = self.allocator.lock().free(allocation) {
                warn!(buffer = %desc.name, "failed to free buffer memory: {free_err}");
            }
            unsafe { self.device.destroy_buffer(buffer, None) };
            return Err(e.into());
        }

        debug!(
            buffer = %desc.name,
            kind = ?desc.kind,
            size_bytes = desc.size,
            "vulkan buffer allocated"
        );

        Ok(VulkanBuffer {
            desc,
            buffer,
            allocation: Some(allocation),
            device: Arc::clone(&self.device),
            allocator: Arc::clone(&self.allocator),
        })
    }
}

/// A persistently mapped Vulkan buffer.
pub struct VulkanBuffer {
    desc: BufferDesc,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    device: Arc<ash::Device>,
    allocator: Arc<Mutex<Allocator>>,
}

impl VulkanBuffer {
    /// Raw handle for binding in command buffers.
    pub const fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    fn mapped_bytes(&self) -> &[u8] {
        let len = self.desc.size as usize;
        match self.allocation.as_ref().and_then(Allocation::mapped_slice) {
            Some(bytes) => &bytes[..len],
            None => &[],
        }
    }

    fn mapped_bytes_mut(&mut self) -> &mut [u8] {
        let len = self.desc.size as usize;
        match self.allocation.as_mut().and_then(Allocation::mapped_slice_mut) {
            Some(bytes) => &mut bytes[..len],
            None => &mut [],
        }
    }
}

impl DynamicBuffer for VulkanBuffer {
    type Mapping<'a> = VulkanMapping<'a>;

    fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    fn map_write_discard(&mut self) -> Result<VulkanMapping<'_>> {
        let allocation = self
            .allocation
            .as_ref()
            .ok_or_else(|| GpuError::InvalidState(format!("{}: buffer freed", self.desc.name)))?;

        if allocation.mapped_ptr().is_none() {
            return Err(GpuError::MapFailed(format!(
                "{}: memory is not host visible",
                self.desc.name
            )));
        }
        // Without coherence, writes would need explicit flushes on unmap.
        if !allocation
            .memory_properties()
            .contains(vk::MemoryPropertyFlags::HOST_COHERENT)
        {
            return Err(GpuError::MapFailed(format!(
                "{}: memory is not host coherent",
                self.desc.name
            )));
        }

        Ok(VulkanMapping { buffer: self })
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            if let Err(e) = self.allocator.lock().free(allocation) {
                warn!(buffer = %self.desc.name, "failed to free buffer memory: {e}");
            }
        }
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
        }
        self.buffer = vk::Buffer::null();
    }
}

/// Write mapping of a [`VulkanBuffer`].
pub struct VulkanMapping<'a> {
    buffer: &'a mut VulkanBuffer,
}

impl Deref for VulkanMapping<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buffer.mapped_bytes()
    }
}

impl DerefMut for VulkanMapping<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buffer.mapped_bytes_mut()
    }
}

impl MappedBuffer for VulkanMapping<'_> {
    fn unmap(self) -> Result<()> {
        // Coherent persistent mappings are visible to the device as written.
        Ok(())
    }
}
