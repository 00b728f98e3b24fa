//! Host rendering engine interfaces for the Terramesh terrain mesher.
//!
//! The mesher does not own a renderer. It consumes a small slice of one:
//! - Dynamic buffers that can be mapped for write-discard access
//! - Vertex and index layout descriptions
//! - A renderable unit (`MeshDraw`) whose element count is read at draw time
//! - An opaque scene handle (`Entity`) the host attaches to its scene graph
//!
//! Two backends are provided: an in-memory one for headless runs and tests,
//! and a Vulkan one (feature `vulkan`) built on `gpu-allocator`.

pub mod buffer;
pub mod draw;
pub mod error;
pub mod host;
pub mod layout;
#[cfg(feature = "vulkan")]
pub mod vulkan;

pub use buffer::{BufferAllocator, BufferDesc, BufferKind, DynamicBuffer, MappedBuffer};
pub use draw::{Entity, EntityId, Material, MaterialId, MeshDraw};
pub use error::{GpuError, Result};
pub use host::{HostAllocator, HostBuffer, HostStats};
pub use layout::{
    IndexFormat, PrimitiveTopology, VertexElement, VertexFormat, VertexLayout, VertexSemantic,
};
#[cfg(feature = "vulkan")]
pub use vulkan::{VulkanBuffer, VulkanBufferAllocator};
