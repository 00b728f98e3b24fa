use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use rayon::prelude::*;
use terramesh_core::{BlockFaceDescriptor, BlockFaces, ChunkPos};
use terramesh_gpu::{HostAllocator, HostBuffer, Material};
use terramesh_terrain::{GraphicalTerrain, TerrainConfig};

fn shared_terrain(
    allocator: &mut HostAllocator,
    max_blocks: usize,
) -> Arc<GraphicalTerrain<HostBuffer>> {
    Arc::new(
        GraphicalTerrain::new(
            allocator,
            Arc::new(Material::new(1, "terrain")),
            TerrainConfig::default().with_max_block_count(max_blocks),
        )
        .unwrap(),
    )
}

#[test]
fn concurrent_producers_never_exceed_capacity() {
    let mut allocator = HostAllocator::new();
    let max = 1_000;
    let terrain = shared_terrain(&mut allocator, max);

    let stored: usize = (0..4_000i32)
        .into_par_iter()
        .map(|i| {
            let chunk = ChunkPos::new(i % 16, 0, i / 16 % 4);
            usize::from(terrain.add_block(chunk, BlockFaceDescriptor::at(i, 0, 0, BlockFaces::TOP)))
        })
        .sum();

    assert_eq!(stored, max);
    assert_eq!(terrain.block_count(), max);
    assert!(terrain.rebuild_if_dirty().unwrap());
    assert_eq!(terrain.draw_count() as usize, max * 6);
}

#[test]
fn batched_producers_never_exceed_capacity() {
    let mut allocator = HostAllocator::new();
    let max = 300;
    let terrain = shared_terrain(&mut allocator, max);

    let stored: usize = (0..32i32)
        .into_par_iter()
        .map(|c| {
            let blocks =
                (0..20).map(|x| BlockFaceDescriptor::at(c * 32 + x, 0, 0, BlockFaces::all()));
            terrain.add_blocks(ChunkPos::new(c, 0, 0), blocks)
        })
        .sum();

    assert_eq!(stored, max);
    assert_eq!(terrain.with_registry(|registry| registry.len()), max);
}

#[test]
fn rebuilds_interleaved_with_producers() {
    let mut allocator = HostAllocator::new();
    let terrain = shared_terrain(&mut allocator, 4_096);
    let done = Arc::new(AtomicBool::new(false));

    let consumer = {
        let terrain = Arc::clone(&terrain);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut rebuilds = 0;
            while !done.load(Ordering::Acquire) {
                if terrain.rebuild_if_dirty().unwrap() {
                    rebuilds += 1;
                    // Every rebuild sees whole quads only.
                    assert_eq!(terrain.draw_count() % 6, 0);
                }
                thread::yield_now();
            }
            rebuilds
        })
    };

    let producers: Vec<_> = (0..4i32)
        .map(|worker| {
            let terrain = Arc::clone(&terrain);
            thread::spawn(move || {
                for i in 0..512 {
                    let chunk = ChunkPos::new(worker, 0, i / 64);
                    let faces = BlockFaces::TOP | BlockFaces::BOTTOM;
                    terrain.add_block(chunk, BlockFaceDescriptor::at(worker * 32, 0, i, faces));
                    if i % 128 == 127 {
                        terrain.purge_chunks(&[ChunkPos::new(worker, 0, i / 64 - 1)]);
                    }
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    done.store(true, Ordering::Release);
    consumer.join().unwrap();

    terrain.rebuild_if_dirty().unwrap();
    let blocks = terrain.block_count();
    assert!(blocks > 0);
    assert_eq!(terrain.draw_count() as usize, blocks * 2 * 6);
    assert!(!terrain.is_dirty());
}
