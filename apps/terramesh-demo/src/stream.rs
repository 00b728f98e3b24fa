//! Chunk streaming around a moving viewer.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{self, Receiver, Sender};
use glam::Vec2;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use terramesh_core::constants::{CHUNK_SIZE, MAX_BLOCK_COUNT};
use terramesh_core::{BlockFaceDescriptor, BlockFaces, ChunkPos};
use terramesh_gpu::HostBuffer;
use terramesh_terrain::GraphicalTerrain;
use tracing::{debug, warn};

type Terrain = GraphicalTerrain<HostBuffer>;

/// Demo parameters (from CLI or defaults).
#[derive(Debug, Clone)]
pub struct DemoParams {
    /// Chunk load radius around the viewer; chunks beyond radius + 1 are purged.
    pub chunks: i32,
    pub blocks_per_chunk: usize,
    pub workers: usize,
    pub frames: u32,
    pub max_blocks: usize,
}

impl Default for DemoParams {
    fn default() -> Self {
        Self {
            chunks: 3,
            blocks_per_chunk: CHUNK_SIZE * CHUNK_SIZE,
            workers: 4,
            frames: 120,
            max_blocks: MAX_BLOCK_COUNT,
        }
    }
}

impl DemoParams {
    /// Parse demo parameters from command line arguments.
    pub fn from_args() -> Self {
        let mut params = Self::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1);
            let consumed = match args[i].as_str() {
                "--chunks" => parse_into(value, &mut params.chunks),
                "--blocks-per-chunk" => parse_into(value, &mut params.blocks_per_chunk),
                "--workers" => parse_into(value, &mut params.workers),
                "--frames" => parse_into(value, &mut params.frames),
                "--max-blocks" => parse_into(value, &mut params.max_blocks),
                other => {
                    warn!(arg = other, "ignoring unknown argument");
                    false
                }
            };
            i += if consumed { 2 } else { 1 };
        }

        params.chunks = params.chunks.max(0);
        params.blocks_per_chunk = params.blocks_per_chunk.min(CHUNK_SIZE * CHUNK_SIZE);
        params.workers = params.workers.max(1);
        params
    }
}

fn parse_into<T: std::str::FromStr>(value: Option<&String>, target: &mut T) -> bool {
    match value.map(|v| v.parse()) {
        Some(Ok(v)) => {
            *target = v;
            true
        }
        _ => {
            warn!("missing or invalid option value, keeping default");
            false
        }
    }
}

/// Block totals reported by the generator threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamStats {
    pub generated: usize,
    pub stored: usize,
    pub purged: usize,
}

/// Requests chunks around the viewer from a pool of generator threads and
/// purges the ones left behind.
pub struct ChunkStreamer {
    terrain: Arc<Terrain>,
    requests: Option<Sender<ChunkPos>>,
    workers: Vec<JoinHandle<StreamStats>>,
    requested: FxHashSet<ChunkPos>,
    radius: i32,
    purged: usize,
}

impl ChunkStreamer {
    /// Start the generator threads.
    pub fn spawn(terrain: Arc<Terrain>, params: &DemoParams) -> Self {
        let (sender, receiver) = channel::unbounded();
        let workers = (0..params.workers)
            .map(|id| {
                let terrain = Arc::clone(&terrain);
                let receiver = receiver.clone();
                let limit = params.blocks_per_chunk;
                std::thread::Builder::new()
                    .name(format!("chunk-gen-{id}"))
                    .spawn(move || generate_worker(&terrain, &receiver, limit))
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(err) => {
                    warn!(error = %err, "failed to spawn generator thread");
                    None
                }
            })
            .collect();

        Self {
            terrain,
            requests: Some(sender),
            workers,
            requested: FxHashSet::default(),
            radius: params.chunks,
            purged: 0,
        }
    }

    /// Move the viewer to chunk `step` on the x axis.
    pub fn update(&mut self, step: u32) {
        let center = ChunkPos::new(step as i32, 0, 0);

        if let Some(requests) = &self.requests {
            for dz in -self.radius..=self.radius {
                for dx in -self.radius..=self.radius {
                    let chunk = ChunkPos::new(center.x + dx, 0, center.z + dz);
                    if self.requested.insert(chunk) && requests.send(chunk).is_err() {
                        warn!(?chunk, "no generator threads left");
                    }
                }
            }
        }

        // Chunks finished after leaving range show up in the registry late,
        // so look there as well as in our own request set.
        let unload = self.radius + 1;
        let far: Vec<ChunkPos> = self.terrain.with_registry(|registry| {
            registry
                .chunks()
                .filter(|chunk| chunk.chebyshev_distance(center) > unload)
                .collect()
        });
        self.requested
            .retain(|chunk| chunk.chebyshev_distance(center) <= unload);
        if !far.is_empty() {
            let removed = self.terrain.purge_chunks(&far);
            self.purged += removed;
            debug!(chunks = far.len(), blocks = removed, ?center, "purged distant chunks");
        }
    }

    /// Stop the generator threads after they drain pending requests.
    pub fn shutdown(mut self) -> StreamStats {
        self.requests = None;
        let mut stats = StreamStats {
            purged: self.purged,
            ..StreamStats::default()
        };
        for worker in self.workers.drain(..) {
            match worker.join() {
                Ok(worker_stats) => {
                    stats.generated += worker_stats.generated;
                    stats.stored += worker_stats.stored;
                }
                Err(_) => warn!("generator thread panicked"),
            }
        }
        stats
    }
}

fn generate_worker(terrain: &Terrain, requests: &Receiver<ChunkPos>, limit: usize) -> StreamStats {
    let mut stats = StreamStats::default();
    for chunk in requests {
        let blocks = generate_surface(chunk, limit);
        stats.generated += blocks.len();
        stats.stored += terrain.add_blocks(chunk, blocks);
    }
    stats
}

/// Surface blocks of one chunk column grid: a top face on every column plus
/// the side faces exposed by lower neighbors.
pub fn generate_surface(chunk: ChunkPos, limit: usize) -> Vec<BlockFaceDescriptor> {
    let origin = chunk.origin().as_ivec3();
    (0..CHUNK_SIZE * CHUNK_SIZE)
        .into_par_iter()
        .take(limit)
        .map(|i| {
            let wx = origin.x + (i % CHUNK_SIZE) as i32;
            let wz = origin.z + (i / CHUNK_SIZE) as i32;
            let h = surface_height(wx, wz);

            let mut faces = BlockFaces::TOP;
            let sides = [
                (BlockFaces::LEFT, wx - 1, wz),
                (BlockFaces::RIGHT, wx + 1, wz),
                (BlockFaces::BACK, wx, wz - 1),
                (BlockFaces::FRONT, wx, wz + 1),
            ];
            for (face, nx, nz) in sides {
                if surface_height(nx, nz) < h {
                    faces |= face;
                }
            }
            BlockFaceDescriptor::at(wx, origin.y + h, wz, faces)
        })
        .collect()
}

fn surface_height(wx: i32, wz: i32) -> i32 {
    let p = Vec2::new(wx as f32, wz as f32) * 0.09;
    ((p.x.sin() + (p.y * 1.3).cos()) * 3.0 + 6.0).round() as i32
}
