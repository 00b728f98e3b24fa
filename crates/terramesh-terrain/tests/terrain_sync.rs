use std::sync::Arc;

use approx::assert_relative_eq;
use glam::Vec3;
use terramesh_core::{BlockFaceDescriptor, BlockFaces, ChunkPos, Face};
use terramesh_gpu::host::DISCARD_POISON;
use terramesh_gpu::{BufferKind, HostAllocator, HostBuffer, Material};
use terramesh_terrain::{GraphicalTerrain, TerrainConfig, TerrainError, TerrainVertex};

fn terrain(allocator: &mut HostAllocator, max_blocks: usize) -> GraphicalTerrain<HostBuffer> {
    GraphicalTerrain::new(
        allocator,
        Arc::new(Material::new(1, "terrain")),
        TerrainConfig::default().with_max_block_count(max_blocks),
    )
    .unwrap()
}

/// Vertices and indices covered by the current draw count.
fn drawn(terrain: &GraphicalTerrain<HostBuffer>) -> (Vec<TerrainVertex>, Vec<u32>) {
    let count = terrain.draw_count() as usize;
    terrain.with_buffers(|vertices, indices| {
        let indices = indices.read::<u32>().unwrap()[..count].to_vec();
        let used = indices.iter().map(|&i| i as usize + 1).max().unwrap_or(0);
        let vertices = vertices.read::<TerrainVertex>().unwrap()[..used].to_vec();
        (vertices, indices)
    })
}

fn raw_bytes(terrain: &GraphicalTerrain<HostBuffer>) -> (Vec<u8>, Vec<u8>) {
    terrain.with_buffers(|vertices, indices| (vertices.bytes().to_vec(), indices.bytes().to_vec()))
}

#[test]
fn single_top_face_at_origin() {
    let mut allocator = HostAllocator::new();
    let terrain = terrain(&mut allocator, 16);

    assert!(terrain.add_block(ChunkPos::ORIGIN, BlockFaceDescriptor::at(0, 0, 0, BlockFaces::TOP)));
    assert!(terrain.rebuild_if_dirty().unwrap());
    assert_eq!(terrain.draw_count(), 6);

    let (vertices, indices) = drawn(&terrain);
    assert_eq!(indices, vec![0, 1, 2, 2, 3, 0]);
    assert_eq!(vertices.len(), 4);
    for vertex in &vertices {
        assert_relative_eq!(vertex.position[1], 1.0);
        assert_eq!(vertex.normal(), Vec3::Y);
    }

    // The four corners span the unit square in x/z.
    let (min, max) = vertices.iter().fold(
        (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
        |(min, max), v| (min.min(v.position()), max.max(v.position())),
    );
    assert_relative_eq!(min.x, 0.0);
    assert_relative_eq!(min.z, 0.0);
    assert_relative_eq!(max.x, 1.0);
    assert_relative_eq!(max.z, 1.0);
}

#[test]
fn purge_then_rebuild_draws_nothing() {
    let mut allocator = HostAllocator::new();
    let terrain = terrain(&mut allocator, 16);

    terrain.add_block(ChunkPos::ORIGIN, BlockFaceDescriptor::at(0, 0, 0, BlockFaces::all()));
    terrain.rebuild_if_dirty().unwrap();
    assert_eq!(terrain.draw_count(), 36);

    assert_eq!(terrain.purge_chunks(&[ChunkPos::ORIGIN]), 1);
    assert!(terrain.is_dirty());
    assert!(terrain.rebuild_if_dirty().unwrap());

    assert_eq!(terrain.draw_count(), 0);
    assert_eq!(terrain.block_count(), 0);
    assert_eq!(terrain.chunk_count(), 0);
}

#[test]
fn purge_leaves_other_chunks_untouched() {
    let mut allocator = HostAllocator::new();
    let terrain = terrain(&mut allocator, 64);
    let kept = ChunkPos::new(1, 0, 0);
    let purged = ChunkPos::new(-1, 0, 0);

    for x in 0..4 {
        terrain.add_block(kept, BlockFaceDescriptor::at(32 + x, 0, 0, BlockFaces::TOP));
        let faces = BlockFaces::TOP | BlockFaces::BOTTOM;
        terrain.add_block(purged, BlockFaceDescriptor::at(-32 + x, 0, 0, faces));
    }

    assert_eq!(terrain.purge_chunks(&[purged]), 4);
    terrain.rebuild_if_dirty().unwrap();
    assert_eq!(terrain.draw_count(), 4 * 6);

    terrain.with_registry(|registry| {
        assert!(!registry.contains_chunk(purged));
        assert_eq!(registry.chunk(kept).map(<[_]>::len), Some(4));
    });
    let (vertices, _) = drawn(&terrain);
    assert!(vertices.iter().all(|v| v.position[0] >= 32.0));
    assert!(vertices.iter().all(|v| v.normal() == Face::Top.normal()));
}

#[test]
fn identical_sequences_produce_identical_buffers() {
    let run = || {
        let mut allocator = HostAllocator::new();
        let terrain = terrain(&mut allocator, 512);
        for i in 0..300 {
            let faces = BlockFaces::from_bits_truncate((i * 7 + 3) as u8);
            let chunk = ChunkPos::new(i % 5, (i / 5) % 3, -(i % 4));
            let origin = chunk.origin();
            let position = origin + Vec3::new((i % 32) as f32, 0.0, 1.0);
            let block = BlockFaceDescriptor::new(position, faces);
            terrain.add_block(chunk, block);
        }
        terrain.purge_chunks(&[ChunkPos::new(2, 1, -2), ChunkPos::new(4, 0, 0)]);
        terrain.rebuild_if_dirty().unwrap();
        (terrain.draw_count(), raw_bytes(&terrain))
    };

    let (count_a, bytes_a) = run();
    let (count_b, bytes_b) = run();
    assert!(count_a > 0);
    assert_eq!(count_a, count_b);
    assert_eq!(bytes_a, bytes_b);
}

#[test]
fn index_count_follows_visible_faces() {
    let mut allocator = HostAllocator::new();
    let terrain = terrain(&mut allocator, 64);
    let mut faces = 0;
    for bits in 0..64u8 {
        let set = BlockFaces::from_bits_truncate(bits);
        faces += set.count();
        terrain.add_block(ChunkPos::ORIGIN, BlockFaceDescriptor::at(i32::from(bits), 0, 0, set));
    }

    terrain.rebuild_if_dirty().unwrap();
    assert_eq!(terrain.draw_count(), faces * 6);
    let (vertices, indices) = drawn(&terrain);
    assert_eq!(vertices.len() as u32, faces * 4);
    for (quad, chunk) in indices.chunks_exact(6).enumerate() {
        let s = quad as u32 * 4;
        assert_eq!(chunk, [s, s + 1, s + 2, s + 2, s + 3, s]);
    }
}

#[test]
fn inserts_beyond_capacity_are_dropped() {
    let mut allocator = HostAllocator::new();
    let max = 25;
    let terrain = terrain(&mut allocator, max);

    let stored = (0..=max as i32)
        .filter(|&x| {
            terrain.add_block(ChunkPos::ORIGIN, BlockFaceDescriptor::at(x, 0, 0, BlockFaces::all()))
        })
        .count();

    assert_eq!(stored, max);
    assert_eq!(terrain.block_count(), max);
    terrain.rebuild_if_dirty().unwrap();
    assert_eq!(terrain.draw_count() as usize, max * 36);
}

#[test]
fn second_rebuild_is_a_no_op() {
    let mut allocator = HostAllocator::new();
    let terrain = terrain(&mut allocator, 8);
    terrain.add_block(ChunkPos::ORIGIN, BlockFaceDescriptor::at(0, 0, 0, BlockFaces::FRONT));

    assert!(terrain.rebuild_if_dirty().unwrap());
    assert!(!terrain.rebuild_if_dirty().unwrap());

    let stats = allocator.stats();
    assert_eq!(stats.maps, 2, "one map per buffer");
    assert_eq!(stats.unmaps, 2);
}

#[test]
fn map_failure_keeps_terrain_dirty() {
    let mut allocator = HostAllocator::new();
    let terrain = terrain(&mut allocator, 8);
    terrain.add_block(ChunkPos::ORIGIN, BlockFaceDescriptor::at(0, 0, 0, BlockFaces::TOP));
    terrain.rebuild_if_dirty().unwrap();

    terrain.add_block(ChunkPos::ORIGIN, BlockFaceDescriptor::at(1, 0, 0, BlockFaces::TOP));
    allocator.fail_next_maps(1);
    let err = terrain.rebuild_if_dirty().unwrap_err();
    assert!(matches!(err, TerrainError::Gpu(_)));
    assert!(terrain.is_dirty());
    assert_eq!(terrain.draw_count(), 6);

    assert!(terrain.rebuild_if_dirty().unwrap());
    assert!(!terrain.is_dirty());
    assert_eq!(terrain.draw_count(), 12);
    let stats = allocator.stats();
    assert_eq!(stats.maps, stats.unmaps);
}

#[test]
fn index_map_failure_drops_discarded_vertices_from_draw() {
    let mut allocator = HostAllocator::new().with_discard_poison(true);
    let terrain = terrain(&mut allocator, 8);
    terrain.add_block(ChunkPos::ORIGIN, BlockFaceDescriptor::at(0, 0, 0, BlockFaces::TOP));
    terrain.rebuild_if_dirty().unwrap();

    // The vertex map succeeds and discards the drawn vertices before the
    // index map fails.
    terrain.add_block(ChunkPos::ORIGIN, BlockFaceDescriptor::at(1, 0, 0, BlockFaces::TOP));
    allocator.fail_next_maps_of(BufferKind::Index, 1);
    assert!(terrain.rebuild_if_dirty().is_err());
    assert!(terrain.is_dirty());
    assert_eq!(terrain.draw_count(), 0);
    terrain.with_buffers(|vertices, _| {
        assert!(vertices.bytes().iter().all(|&b| b == DISCARD_POISON));
    });

    assert!(terrain.rebuild_if_dirty().unwrap());
    assert_eq!(terrain.draw_count(), 12);
    let (vertices, _) = drawn(&terrain);
    assert!(vertices.iter().all(|v| v.normal() == Vec3::Y));
    let stats = allocator.stats();
    assert_eq!(stats.maps, stats.unmaps);
}

#[test]
fn unmap_failure_drops_draw_until_next_rebuild() {
    let mut allocator = HostAllocator::new();
    let terrain = terrain(&mut allocator, 8);
    terrain.add_block(ChunkPos::ORIGIN, BlockFaceDescriptor::at(0, 0, 0, BlockFaces::TOP));
    terrain.rebuild_if_dirty().unwrap();

    terrain.add_block(ChunkPos::ORIGIN, BlockFaceDescriptor::at(1, 0, 0, BlockFaces::LEFT));
    allocator.fail_next_unmaps(1);
    let err = terrain.rebuild_if_dirty().unwrap_err();
    assert!(matches!(err, TerrainError::Gpu(_)));
    assert!(terrain.is_dirty());
    assert_eq!(terrain.draw_count(), 0);

    assert!(terrain.rebuild_if_dirty().unwrap());
    assert!(!terrain.is_dirty());
    assert_eq!(terrain.draw_count(), 12);
    let stats = allocator.stats();
    assert_eq!(stats.maps, 6);
    assert_eq!(stats.maps, stats.unmaps);
}

#[test]
fn rebuild_overwrites_discarded_contents() {
    let mut allocator = HostAllocator::new().with_discard_poison(true);
    let terrain = terrain(&mut allocator, 4);
    terrain.add_block(ChunkPos::ORIGIN, BlockFaceDescriptor::at(2, 3, 4, BlockFaces::RIGHT));
    terrain.rebuild_if_dirty().unwrap();

    let (vertex_bytes, index_bytes) = raw_bytes(&terrain);
    let drawn_vertex_bytes = 4 * TerrainVertex::STRIDE as usize;
    let drawn_index_bytes = 6 * std::mem::size_of::<u32>();
    assert!(vertex_bytes[drawn_vertex_bytes..].iter().all(|&b| b == DISCARD_POISON));
    assert!(index_bytes[drawn_index_bytes..].iter().all(|&b| b == DISCARD_POISON));

    let (vertices, _) = drawn(&terrain);
    let offset = Vec3::new(2.0, 3.0, 4.0);
    for (vertex, corner) in vertices.iter().zip(Face::Right.corners()) {
        assert_eq!(vertex.position(), offset + corner);
        assert_eq!(vertex.normal(), Vec3::X);
    }
}
