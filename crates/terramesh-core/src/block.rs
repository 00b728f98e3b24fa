//! Block face descriptors.

use glam::Vec3;

use crate::face::{BlockFaces, Face};

/// A block as seen by the mesher: where it is and which faces show.
///
/// Descriptors are immutable once stored. Replacing a block means purging
/// its chunk and adding the new descriptors again.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BlockFaceDescriptor {
    /// World-space position of the block's minimum corner
    pub position: Vec3,
    /// Faces to emit
    pub faces: BlockFaces,
}

impl BlockFaceDescriptor {
    /// Create a new descriptor
    #[inline]
    pub const fn new(position: Vec3, faces: BlockFaces) -> Self {
        Self { position, faces }
    }

    /// Create a descriptor for a block at integer coordinates
    #[inline]
    pub fn at(x: i32, y: i32, z: i32, faces: BlockFaces) -> Self {
        Self::new(Vec3::new(x as f32, y as f32, z as f32), faces)
    }

    /// Returns true if `face` is visible
    #[inline]
    pub const fn has_face(&self, face: Face) -> bool {
        self.faces.has(face)
    }

    /// Number of quads this block contributes to a mesh
    #[inline]
    pub const fn face_count(&self) -> u32 {
        self.faces.count()
    }

    /// Returns true if no face is visible
    #[inline]
    pub const fn is_hidden(&self) -> bool {
        self.faces.is_empty()
    }
}
