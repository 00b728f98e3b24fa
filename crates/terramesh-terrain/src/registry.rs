//! Chunked block registry.
//!
//! Maps chunk positions to the ordered list of block face descriptors in that
//! chunk. The registry itself is plain data; [`crate::GraphicalTerrain`]
//! serializes access to it behind its lock.

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use terramesh_core::coords::ChunkPos;
use terramesh_core::BlockFaceDescriptor;

/// Result of [`BlockRegistry::purge`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurgeOutcome {
    /// Chunks that were present and removed.
    pub chunks: usize,
    /// Descriptors removed with them.
    pub blocks: usize,
}

/// Block face descriptors grouped by chunk, with a hard capacity.
///
/// Iteration order is map order, then insertion order within a chunk. The
/// map uses a fixed hasher, so identical operation sequences iterate
/// identically across instances.
#[derive(Debug)]
pub struct BlockRegistry {
    chunks: HashMap<ChunkPos, Vec<BlockFaceDescriptor>, FxBuildHasher>,
    len: usize,
    capacity: usize,
}

impl BlockRegistry {
    /// Create an empty registry that holds at most `capacity` descriptors.
    pub fn new(capacity: usize) -> Self {
        Self {
            chunks: HashMap::with_hasher(FxBuildHasher),
            len: 0,
            capacity,
        }
    }

    /// Append a descriptor to a chunk, creating the chunk if needed.
    ///
    /// Returns `false` and stores nothing when the registry is full.
    pub fn insert(&mut self, chunk: ChunkPos, block: BlockFaceDescriptor) -> bool {
        if self.len >= self.capacity {
            return false;
        }
        self.chunks.entry(chunk).or_default().push(block);
        self.len += 1;
        true
    }

    /// Remove every listed chunk with all of its descriptors.
    pub fn purge(&mut self, chunks: &[ChunkPos]) -> PurgeOutcome {
        let mut outcome = PurgeOutcome::default();
        for pos in chunks {
            if let Some(blocks) = self.chunks.remove(pos) {
                outcome.chunks += 1;
                outcome.blocks += blocks.len();
            }
        }
        self.len -= outcome.blocks;
        outcome
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }

    /// Number of stored descriptors across all chunks.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if no descriptors are stored.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of descriptors.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of chunks with at least one descriptor.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Check if a chunk has descriptors.
    pub fn contains_chunk(&self, chunk: ChunkPos) -> bool {
        self.chunks.contains_key(&chunk)
    }

    /// Descriptors of one chunk in insertion order.
    pub fn chunk(&self, chunk: ChunkPos) -> Option<&[BlockFaceDescriptor]> {
        self.chunks.get(&chunk).map(Vec::as_slice)
    }

    /// Total number of visible faces.
    pub fn face_count(&self) -> usize {
        self.iter().map(|block| block.face_count() as usize).sum()
    }

    /// All descriptors in build order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockFaceDescriptor> + '_ {
        self.chunks.values().flatten()
    }

    /// Chunk positions in build order.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.chunks.keys().copied()
    }
}
