//! Terrain error types.

use terramesh_gpu::GpuError;
use thiserror::Error;

/// Errors surfaced by terrain construction and rebuilds.
#[derive(Error, Debug)]
pub enum TerrainError {
    /// Buffer allocation or mapping failed in the host engine.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),

    /// Capacity math or data error.
    #[error(transparent)]
    Core(#[from] terramesh_core::Error),

    /// Invalid configuration.
    #[error("Invalid terrain config: {0}")]
    Config(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, TerrainError>;
