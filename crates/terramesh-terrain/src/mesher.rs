//! Quad emission into pre-sized vertex and index slices.
//!
//! Every visible face of every block becomes four vertices and six indices.
//! Blocks are visited in registry order and faces in canonical order, so the
//! same registry state always produces the same bytes. Nothing here
//! allocates.

use terramesh_core::constants::{INDICES_PER_FACE, VERTICES_PER_FACE};
use terramesh_core::face::{FACE_CORNERS, QUAD_INDICES};
use terramesh_core::BlockFaceDescriptor;

use crate::registry::BlockRegistry;
use crate::vertex::{TerrainVertex, PACKED_FACES};

/// Vertex and index totals for a number of faces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshCounts {
    pub faces: usize,
    pub vertices: usize,
    pub indices: usize,
}

impl MeshCounts {
    /// Totals for `faces` quads.
    pub const fn for_faces(faces: usize) -> Self {
        Self {
            faces,
            vertices: faces * VERTICES_PER_FACE,
            indices: faces * INDICES_PER_FACE,
        }
    }

    /// Totals the registry will produce when built.
    pub fn for_registry(registry: &BlockRegistry) -> Self {
        Self::for_faces(registry.face_count())
    }
}

/// Build the registry's mesh into `vertices` and `indices`.
///
/// Returns the number of indices written, which is the draw's element count.
///
/// # Panics
///
/// Panics if the slices cannot hold every visible face. Buffers are sized
/// from the registry capacity, so this only happens when that invariant is
/// broken.
#[cfg_attr(
    feature = "profiling-tracy",
    tracing::instrument(level = "trace", skip_all)
)]
pub fn build_mesh(
    registry: &BlockRegistry,
    vertices: &mut [TerrainVertex],
    indices: &mut [u32],
) -> u32 {
    build_blocks(registry.iter(), vertices, indices)
}

/// Build quads for an arbitrary sequence of blocks.
///
/// Same contract as [`build_mesh`].
pub fn build_blocks<'a, I>(blocks: I, vertices: &mut [TerrainVertex], indices: &mut [u32]) -> u32
where
    I: IntoIterator<Item = &'a BlockFaceDescriptor>,
{
    let mut vertex_count = 0usize;
    let mut index_count = 0usize;

    for block in blocks {
        for face in block.faces.faces() {
            let vertex_end = vertex_count + VERTICES_PER_FACE;
            let index_end = index_count + INDICES_PER_FACE;
            assert!(
                vertex_end <= vertices.len() && index_end <= indices.len(),
                "terrain mesh overflow: quad needs {vertex_end} vertices / {index_end} indices, \
                 buffers hold {} / {}",
                vertices.len(),
                indices.len(),
            );

            let packed = &PACKED_FACES[face.index()];
            let corners = &FACE_CORNERS[face.index()];
            let quad = vertices[vertex_count..vertex_end]
                .iter_mut()
                .zip(corners.iter().zip(&packed.uvs));
            for (vertex, (corner, uv)) in quad {
                *vertex = TerrainVertex {
                    position: (block.position + *corner).to_array(),
                    normal: packed.normal,
                    uv: *uv,
                };
            }

            let base = vertex_count as u32;
            for (index, offset) in indices[index_count..index_end]
                .iter_mut()
                .zip(QUAD_INDICES)
            {
                *index = base + offset;
            }

            vertex_count = vertex_end;
            index_count = index_end;
        }
    }

    index_count as u32
}
