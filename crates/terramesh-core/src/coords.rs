//! Chunk coordinates.

use crate::constants::{CHUNK_BITS, CHUNK_SIZE};
use bytemuck::{Pod, Zeroable};
use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Chunk position in chunk coordinates.
///
/// Used as the key of the terrain's block registry. Chunks have no ordering
/// requirement; only equality and hashing matter.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkPos {
    /// Chunk at the world origin
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Create a new chunk position
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Get the chunk containing a world-space block position.
    #[inline]
    pub fn containing(position: Vec3) -> Self {
        let block = position.floor().as_ivec3();
        Self::new(
            block.x >> CHUNK_BITS,
            block.y >> CHUNK_BITS,
            block.z >> CHUNK_BITS,
        )
    }

    /// World-space position of the chunk's minimum corner
    #[inline]
    pub fn origin(self) -> Vec3 {
        (self.to_ivec3() * CHUNK_SIZE as i32).as_vec3()
    }

    /// Chebyshev distance in chunks, used for view-radius checks.
    #[inline]
    pub const fn chebyshev_distance(self, other: Self) -> i32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        let dz = (self.z - other.z).abs();
        let m = if dx > dy { dx } else { dy };
        if m > dz {
            m
        } else {
            dz
        }
    }

    /// Convert to glam IVec3
    #[inline]
    pub const fn to_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }
}

impl From<IVec3> for ChunkPos {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}
