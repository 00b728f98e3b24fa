//! Core types and face geometry for the Terramesh terrain mesher.
//!
//! This crate provides the foundational types shared by the other crates:
//! - Chunk coordinates
//! - Block faces, their visibility flags and per-face geometry tables
//! - The block face descriptor stored by the terrain registry
//! - Common error types

pub mod block;
pub mod coords;
pub mod error;
pub mod face;

pub use block::BlockFaceDescriptor;
pub use coords::ChunkPos;
pub use error::{Error, Result};
pub use face::{BlockFaces, Face};

/// Engine-wide constants
pub mod constants {
    /// Size of a chunk in blocks per axis
    pub const CHUNK_SIZE: usize = 32;
    /// Bits needed to represent a position within a chunk (5 bits for 0-31)
    pub const CHUNK_BITS: u32 = 5;
    /// Number of faces on a block
    pub const FACES_PER_BLOCK: usize = 6;
    /// Vertices emitted for one visible face
    pub const VERTICES_PER_FACE: usize = 4;
    /// Indices emitted for one visible face (two triangles)
    pub const INDICES_PER_FACE: usize = 6;
    /// Default number of blocks a single terrain instance can hold.
    pub const MAX_BLOCK_COUNT: usize = 32 * 0x1000;
}
