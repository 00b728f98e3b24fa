//! Terramesh Headless Streaming Demo
//!
//! Streams a flat-ish heightfield into one dynamic terrain while a viewer
//! walks along the x axis. Worker threads generate chunk surfaces, chunks
//! that fall out of range are purged, and every frame rebuilds the terrain
//! buffers if anything changed. Buffers live in host memory.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p terramesh-demo -- [OPTIONS]
//! ```
//!
//! ## Options
//!
//! - `--chunks <N>`: Chunk load radius around the viewer (default: 3)
//! - `--blocks-per-chunk <N>`: Surface columns generated per chunk (default: 1024)
//! - `--workers <N>`: Generator threads (default: 4)
//! - `--frames <N>`: Frames to run (default: 120)
//! - `--max-blocks <N>`: Terrain block capacity (default: 131072)
//! - `-h, --help`: Print help message
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod stream;

use std::hash::Hasher;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHasher;
use terramesh_gpu::{HostAllocator, HostBuffer, Material};
use terramesh_terrain::{GraphicalTerrain, TerrainConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::stream::{ChunkStreamer, DemoParams};

/// Time budget of one simulated frame.
const FRAME_TIME: Duration = Duration::from_millis(16);
/// Frames the viewer stays in one chunk before stepping to the next.
const FRAMES_PER_STEP: u32 = 20;

fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }

    init_logging();

    let params = DemoParams::from_args();
    info!(?params, "starting terrain demo");

    let mut allocator = HostAllocator::new();
    let terrain = Arc::new(GraphicalTerrain::new(
        &mut allocator,
        Arc::new(Material::new(1, "terrain")),
        TerrainConfig::default()
            .with_max_block_count(params.max_blocks)
            .with_label("demo_terrain"),
    )?);
    info!(
        entity = terrain.entity().id().raw(),
        allocated_mb = allocator.allocated_bytes() as f64 / (1024.0 * 1024.0),
        "terrain ready"
    );

    let mut streamer = ChunkStreamer::spawn(Arc::clone(&terrain), &params);

    for frame in 0..params.frames {
        let frame_start = Instant::now();

        streamer.update(frame / FRAMES_PER_STEP);
        let rebuilt = terrain.rebuild_if_dirty()?;
        if rebuilt || frame % 30 == 0 {
            info!(
                frame,
                rebuilt,
                blocks = terrain.block_count(),
                chunks = terrain.chunk_count(),
                draw_count = terrain.draw_count(),
                "frame"
            );
        }

        if let Some(rest) = FRAME_TIME.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    let stats = streamer.shutdown();
    terrain.rebuild_if_dirty()?;
    info!(
        generated = stats.generated,
        stored = stats.stored,
        dropped = stats.generated - stats.stored,
        purged = stats.purged,
        draw_count = terrain.draw_count(),
        checksum = %format!("{:016x}", checksum(&terrain)),
        "demo finished"
    );
    info!(maps = allocator.stats().maps, unmaps = allocator.stats().unmaps, "buffer stats");

    Ok(())
}

fn init_logging() {
    #[cfg(feature = "profiling-tracy")]
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,terramesh_terrain=trace,terramesh_gpu=trace,terramesh_demo=trace")
        });
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .with(tracing_tracy::TracyLayer::default())
            .init();
    }
    #[cfg(not(feature = "profiling-tracy"))]
    {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }
}

/// Hash of the drawn index range and the vertices it references.
fn checksum(terrain: &GraphicalTerrain<HostBuffer>) -> u64 {
    let count = terrain.draw_count() as usize;
    let vertex_count = count / 6 * 4;
    terrain.with_buffers(|vertices, indices| {
        let mut hasher = FxHasher::default();
        let vertex_bytes = vertex_count * terramesh_terrain::TerrainVertex::STRIDE as usize;
        hasher.write(&vertices.bytes()[..vertex_bytes]);
        hasher.write(&indices.bytes()[..count * std::mem::size_of::<u32>()]);
        hasher.finish()
    })
}

fn print_help() {
    eprintln!(
        "Terramesh headless streaming demo

USAGE:
    cargo run -p terramesh-demo -- [OPTIONS]

STREAMING OPTIONS:
    --chunks <N>            Chunk load radius around the viewer (default: 3)
    --blocks-per-chunk <N>  Surface columns generated per chunk, at most 1024
                            (default: 1024)
    --workers <N>           Generator threads (default: 4)

TERRAIN OPTIONS:
    --frames <N>            Frames to run (default: 120)
    --max-blocks <N>        Terrain block capacity (default: 131072)

OTHER:
    -h, --help              Print this help message

EXAMPLES:
    # Default run
    cargo run -p terramesh-demo

    # Small terrain that fills up and starts dropping blocks
    cargo run -p terramesh-demo -- --max-blocks 8000 --chunks 4

    # Watch every rebuild
    RUST_LOG=terramesh_terrain=debug cargo run -p terramesh-demo

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log level (e.g., info, debug, trace)"
    );
}
