//! Terrain configuration and derived buffer capacities.

use serde::{Deserialize, Serialize};
use terramesh_core::constants::{
    FACES_PER_BLOCK, INDICES_PER_FACE, MAX_BLOCK_COUNT, VERTICES_PER_FACE,
};

use crate::error::{Result, TerrainError};
use crate::vertex::TerrainVertex;

/// Terrain instance configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Maximum number of block descriptors the terrain stores.
    /// Buffers are sized for every face of this many blocks.
    pub max_block_count: usize,
    /// Debug name of the vertex buffer.
    pub vertex_buffer_name: String,
    /// Debug name of the index buffer.
    pub index_buffer_name: String,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            max_block_count: MAX_BLOCK_COUNT,
            vertex_buffer_name: "terrain_vertices".to_string(),
            index_buffer_name: "terrain_indices".to_string(),
        }
    }
}

impl TerrainConfig {
    /// Set the block capacity.
    #[must_use]
    pub fn with_max_block_count(mut self, max_block_count: usize) -> Self {
        self.max_block_count = max_block_count;
        self
    }

    /// Set both buffer debug names from a common prefix.
    #[must_use]
    pub fn with_label(mut self, label: &str) -> Self {
        self.vertex_buffer_name = format!("{label}_vertices");
        self.index_buffer_name = format!("{label}_indices");
        self
    }

    /// Check the configuration and compute buffer capacities.
    pub fn capacity(&self) -> Result<MeshCapacity> {
        if self.max_block_count == 0 {
            return Err(TerrainError::Config(
                "max_block_count must be greater than zero".to_string(),
            ));
        }

        let overflow = || {
            terramesh_core::Error::Capacity(format!(
                "{} blocks overflow buffer size computation",
                self.max_block_count
            ))
        };

        let faces = self
            .max_block_count
            .checked_mul(FACES_PER_BLOCK)
            .ok_or_else(overflow)?;
        let vertices = faces.checked_mul(VERTICES_PER_FACE).ok_or_else(overflow)?;
        let indices = faces.checked_mul(INDICES_PER_FACE).ok_or_else(overflow)?;

        // Indices are u32 and address vertices directly.
        if u32::try_from(vertices).is_err() || u32::try_from(indices).is_err() {
            return Err(terramesh_core::Error::Capacity(format!(
                "{} blocks need {vertices} vertices, beyond 32-bit indexing",
                self.max_block_count
            ))
            .into());
        }

        let vertex_bytes = (vertices as u64)
            .checked_mul(std::mem::size_of::<TerrainVertex>() as u64)
            .ok_or_else(overflow)?;
        let index_bytes = (indices as u64)
            .checked_mul(std::mem::size_of::<u32>() as u64)
            .ok_or_else(overflow)?;

        Ok(MeshCapacity {
            blocks: self.max_block_count,
            faces,
            vertices,
            indices,
            vertex_bytes,
            index_bytes,
        })
    }
}

/// Buffer capacities derived from a [`TerrainConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshCapacity {
    pub blocks: usize,
    pub faces: usize,
    pub vertices: usize,
    pub indices: usize,
    pub vertex_bytes: u64,
    pub index_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity() {
        let capacity = TerrainConfig::default().capacity().unwrap();
        assert_eq!(capacity.blocks, 131_072);
        assert_eq!(capacity.faces, 786_432);
        assert_eq!(capacity.vertices, 3_145_728);
        assert_eq!(capacity.indices, 4_718_592);
        assert_eq!(capacity.vertex_bytes, 3_145_728 * 24);
        assert_eq!(capacity.index_bytes, 4_718_592 * 4);
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = TerrainConfig::default()
            .with_max_block_count(0)
            .capacity()
            .unwrap_err();
        assert!(matches!(err, TerrainError::Config(_)));
    }

    #[test]
    fn oversized_capacity_rejected() {
        let err = TerrainConfig::default()
            .with_max_block_count(usize::MAX / 2)
            .capacity()
            .unwrap_err();
        assert!(matches!(err, TerrainError::Core(_)));
    }

    #[test]
    fn label_names_buffers() {
        let config = TerrainConfig::default().with_label("island");
        assert_eq!(config.vertex_buffer_name, "island_vertices");
        assert_eq!(config.index_buffer_name, "island_indices");
    }
}
