//! GPU error types.

#[cfg(feature = "vulkan")]
use ash::vk;
use thiserror::Error;

/// GPU-related errors.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Vulkan error.
    #[cfg(feature = "vulkan")]
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    /// Memory allocation failed.
    #[error("Memory allocation failed: {0}")]
    AllocationFailed(String),

    /// Mapping a buffer for CPU access failed.
    #[error("Buffer map failed: {0}")]
    MapFailed(String),

    /// Committing a mapped write failed.
    #[error("Buffer unmap failed: {0}")]
    UnmapFailed(String),

    /// Mapped bytes could not be viewed as the requested element type.
    #[error("Size mismatch: {0}")]
    SizeMismatch(String),

    /// Invalid state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;
