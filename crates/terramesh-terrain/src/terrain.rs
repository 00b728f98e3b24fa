//! Buffer synchronizer.
//!
//! [`GraphicalTerrain`] owns the block registry and the vertex/index buffer
//! pair. Producers insert and purge from any thread; once per frame the
//! consumer calls [`GraphicalTerrain::rebuild_if_dirty`] to regenerate the
//! buffers when anything changed.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use terramesh_core::constants::INDICES_PER_FACE;
use terramesh_core::{BlockFaceDescriptor, ChunkPos};
use terramesh_gpu::{
    BufferAllocator, BufferDesc, DynamicBuffer, Entity, IndexFormat, MappedBuffer, Material,
    MeshDraw, PrimitiveTopology,
};
use tracing::{debug, trace, warn};

use crate::config::{MeshCapacity, TerrainConfig};
use crate::error::Result;
use crate::mesher::build_mesh;
use crate::registry::BlockRegistry;
use crate::vertex::TerrainVertex;

/// Everything the terrain lock protects.
struct TerrainState<B> {
    registry: BlockRegistry,
    vertices: B,
    indices: B,
}

/// Dynamic terrain rendered as a single indexed draw.
///
/// The registry and both buffers sit behind one mutex, so a rebuild sees a
/// consistent registry and never races an insert or a purge. The dirty flag
/// is read without the lock but only changes while it is held.
pub struct GraphicalTerrain<B: DynamicBuffer> {
    state: Mutex<TerrainState<B>>,
    dirty: AtomicBool,
    /// Mirror of the registry length for the unlocked capacity check.
    block_count: AtomicUsize,
    capacity: MeshCapacity,
    draw: Arc<MeshDraw>,
    entity: Entity,
    config: TerrainConfig,
}

impl<B: DynamicBuffer> GraphicalTerrain<B> {
    /// Create a terrain and allocate buffers sized for its full capacity.
    pub fn new<A>(allocator: &mut A, material: Arc<Material>, config: TerrainConfig) -> Result<Self>
    where
        A: BufferAllocator<Buffer = B>,
    {
        let capacity = config.capacity()?;

        let vertices = allocator.create_buffer(BufferDesc::vertex(
            config.vertex_buffer_name.clone(),
            capacity.vertex_bytes,
        ))?;
        let indices = allocator.create_buffer(BufferDesc::index(
            config.index_buffer_name.clone(),
            capacity.index_bytes,
        ))?;

        let draw = Arc::new(MeshDraw::new(
            PrimitiveTopology::TriangleList,
            TerrainVertex::layout(),
            IndexFormat::U32,
            material,
        ));
        let entity = Entity::new().with_draw(Arc::clone(&draw));

        debug!(
            max_blocks = capacity.blocks,
            max_vertices = capacity.vertices,
            max_indices = capacity.indices,
            vertex_bytes = capacity.vertex_bytes,
            index_bytes = capacity.index_bytes,
            entity = entity.id().raw(),
            "terrain created"
        );

        Ok(Self {
            state: Mutex::new(TerrainState {
                registry: BlockRegistry::new(capacity.blocks),
                vertices,
                indices,
            }),
            dirty: AtomicBool::new(false),
            block_count: AtomicUsize::new(0),
            capacity,
            draw,
            entity,
            config,
        })
    }

    /// Create a terrain with [`TerrainConfig::default`].
    pub fn with_defaults<A>(allocator: &mut A, material: Arc<Material>) -> Result<Self>
    where
        A: BufferAllocator<Buffer = B>,
    {
        Self::new(allocator, material, TerrainConfig::default())
    }

    /// Store a block in a chunk.
    ///
    /// Returns `false` without storing anything once the terrain holds its
    /// maximum number of blocks. Capacity is rechecked under the lock, so
    /// concurrent producers never overshoot it.
    pub fn add_block(&self, chunk: ChunkPos, block: BlockFaceDescriptor) -> bool {
        if self.is_full() {
            trace!(?chunk, "terrain full, block dropped");
            return false;
        }

        let mut state = self.state.lock();
        if !state.registry.insert(chunk, block) {
            trace!(?chunk, "terrain full, block dropped");
            return false;
        }
        self.block_count
            .store(state.registry.len(), Ordering::Relaxed);
        self.dirty.store(true, Ordering::Release);
        true
    }

    /// Store several blocks in one chunk under a single lock.
    ///
    /// Returns how many were stored; the rest were dropped at capacity.
    pub fn add_blocks<I>(&self, chunk: ChunkPos, blocks: I) -> usize
    where
        I: IntoIterator<Item = BlockFaceDescriptor>,
    {
        if self.is_full() {
            return 0;
        }

        let mut state = self.state.lock();
        let mut stored = 0;
        for block in blocks {
            if !state.registry.insert(chunk, block) {
                break;
            }
            stored += 1;
        }
        if stored > 0 {
            self.block_count
                .store(state.registry.len(), Ordering::Relaxed);
            self.dirty.store(true, Ordering::Release);
        } else {
            trace!(?chunk, "terrain full, blocks dropped");
        }
        stored
    }

    /// Remove the listed chunks and all their blocks.
    ///
    /// Returns the number of blocks removed. The terrain only becomes dirty
    /// when at least one listed chunk was present.
    pub fn purge_chunks(&self, chunks: &[ChunkPos]) -> usize {
        if chunks.is_empty() {
            return 0;
        }

        let mut state = self.state.lock();
        let outcome = state.registry.purge(chunks);
        if outcome.chunks > 0 {
            self.block_count
                .store(state.registry.len(), Ordering::Relaxed);
            self.dirty.store(true, Ordering::Release);
            debug!(
                requested = chunks.len(),
                chunks = outcome.chunks,
                blocks = outcome.blocks,
                "terrain chunks purged"
            );
        }
        outcome.blocks
    }

    /// Regenerate both buffers if the registry changed since the last
    /// rebuild.
    ///
    /// Returns `Ok(false)` without touching the buffers when nothing
    /// changed. On a map or unmap failure the terrain stays dirty so the
    /// next call retries. If the vertex buffer was already mapped when the
    /// failure hit, its contents are gone and the draw count drops to 0;
    /// otherwise the draw keeps its previous element count.
    #[cfg_attr(
        feature = "profiling-tracy",
        tracing::instrument(level = "trace", skip_all)
    )]
    pub fn rebuild_if_dirty(&self) -> Result<bool> {
        if !self.dirty.load(Ordering::Acquire) {
            return Ok(false);
        }

        let start = Instant::now();
        let mut guard = self.state.lock();
        // Another caller may have rebuilt while we waited.
        if !self.dirty.load(Ordering::Acquire) {
            return Ok(false);
        }

        let element_count = match self.write_buffers(&mut guard) {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, "terrain rebuild failed, keeping dirty");
                return Err(err);
            }
        };
        self.draw.set_element_count(element_count);
        self.dirty.store(false, Ordering::Release);
        let blocks = guard.registry.len();
        drop(guard);

        debug!(
            blocks,
            faces = element_count as usize / INDICES_PER_FACE,
            indices = element_count,
            elapsed_us = start.elapsed().as_micros() as u64,
            "terrain rebuilt"
        );
        Ok(true)
    }

    fn write_buffers(&self, state: &mut TerrainState<B>) -> Result<u32> {
        let TerrainState {
            registry,
            vertices,
            indices,
        } = state;

        let vertex_map = vertices.map_write_discard()?;
        // The old vertices are discarded from here on, so the draw must not
        // keep pointing at them if anything below fails.
        Self::fill_buffers(registry, vertex_map, indices).inspect_err(|_| {
            self.draw.set_element_count(0);
        })
    }

    fn fill_buffers<'a>(
        registry: &BlockRegistry,
        mut vertex_map: B::Mapping<'a>,
        indices: &mut B,
    ) -> Result<u32>
    where
        B: 'a,
    {
        let mut index_map = indices.map_write_discard()?;
        let element_count = build_mesh(
            registry,
            vertex_map.as_slice_mut::<TerrainVertex>()?,
            index_map.as_slice_mut::<u32>()?,
        );
        vertex_map.unmap()?;
        index_map.unmap()?;
        Ok(element_count)
    }

    fn is_full(&self) -> bool {
        self.block_count.load(Ordering::Relaxed) >= self.capacity.blocks
    }

    /// Check if the buffers are out of date.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Number of stored blocks.
    pub fn block_count(&self) -> usize {
        self.block_count.load(Ordering::Relaxed)
    }

    /// Number of chunks with at least one stored block.
    pub fn chunk_count(&self) -> usize {
        self.state.lock().registry.chunk_count()
    }

    /// Maximum number of blocks.
    pub const fn capacity(&self) -> usize {
        self.capacity.blocks
    }

    /// Buffer capacities derived from the configuration.
    pub const fn mesh_capacity(&self) -> &MeshCapacity {
        &self.capacity
    }

    /// Indices drawn by the last successful rebuild.
    pub fn draw_count(&self) -> u32 {
        self.draw.element_count()
    }

    /// The renderable unit backed by this terrain's buffers.
    pub fn draw(&self) -> &Arc<MeshDraw> {
        &self.draw
    }

    /// Scene handle carrying the terrain's draw.
    pub const fn entity(&self) -> &Entity {
        &self.entity
    }

    pub const fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Inspect the vertex and index buffers under the terrain lock.
    pub fn with_buffers<R>(&self, f: impl FnOnce(&B, &B) -> R) -> R {
        let state = self.state.lock();
        f(&state.vertices, &state.indices)
    }

    /// Inspect the registry under the terrain lock.
    pub fn with_registry<R>(&self, f: impl FnOnce(&BlockRegistry) -> R) -> R {
        f(&self.state.lock().registry)
    }
}

impl<B: DynamicBuffer> From<&GraphicalTerrain<B>> for Entity {
    fn from(terrain: &GraphicalTerrain<B>) -> Self {
        terrain.entity.clone()
    }
}

impl<B: DynamicBuffer> fmt::Debug for GraphicalTerrain<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicalTerrain")
            .field("entity", &self.entity.id())
            .field("blocks", &self.block_count())
            .field("capacity", &self.capacity.blocks)
            .field("dirty", &self.is_dirty())
            .field("draw_count", &self.draw_count())
            .finish_non_exhaustive()
    }
}
