//! Block faces and their fixed geometry.
//!
//! Every visible face of a block becomes one quad: four corners in the order
//! listed in [`FACE_CORNERS`], drawn as two triangles through
//! [`QUAD_INDICES`]. Corners are offsets inside the unit cube `[0, 1]^3`
//! anchored at the block position.
//!
//! Winding: for every face, `(c1 - c0) x (c2 - c0)` points against the
//! outward normal, i.e. corners run clockwise when the face is seen from
//! outside the block. Both triangles of [`QUAD_INDICES`] keep that winding.

use bitflags::bitflags;
use glam::{Vec2, Vec3};

/// One of the six axis-aligned faces of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Face {
    /// +Y
    Top = 0,
    /// -Y
    Bottom = 1,
    /// +Z
    Front = 2,
    /// -Z
    Back = 3,
    /// -X
    Left = 4,
    /// +X
    Right = 5,
}

impl Face {
    /// All faces in canonical emission order.
    pub const ALL: [Self; 6] = [
        Self::Top,
        Self::Bottom,
        Self::Front,
        Self::Back,
        Self::Left,
        Self::Right,
    ];

    /// Index of this face into the geometry tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Visibility flag for this face.
    #[inline]
    pub const fn flag(self) -> BlockFaces {
        match self {
            Self::Top => BlockFaces::TOP,
            Self::Bottom => BlockFaces::BOTTOM,
            Self::Front => BlockFaces::FRONT,
            Self::Back => BlockFaces::BACK,
            Self::Left => BlockFaces::LEFT,
            Self::Right => BlockFaces::RIGHT,
        }
    }

    /// Outward unit normal.
    #[inline]
    pub const fn normal(self) -> Vec3 {
        FACE_NORMALS[self.index()]
    }

    /// Quad corners in emission order.
    #[inline]
    pub const fn corners(self) -> [Vec3; 4] {
        FACE_CORNERS[self.index()]
    }

    /// Texture coordinates matching [`Face::corners`].
    #[inline]
    pub const fn uvs(self) -> [Vec2; 4] {
        FACE_UVS[self.index()]
    }
}

bitflags! {
    /// Set of visible faces of a block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BlockFaces: u8 {
        /// Top face (+Y) is visible.
        const TOP    = 0b0000_0001;
        /// Bottom face (-Y) is visible.
        const BOTTOM = 0b0000_0010;
        /// Front face (+Z) is visible.
        const FRONT  = 0b0000_0100;
        /// Back face (-Z) is visible.
        const BACK   = 0b0000_1000;
        /// Left face (-X) is visible.
        const LEFT   = 0b0001_0000;
        /// Right face (+X) is visible.
        const RIGHT  = 0b0010_0000;
    }
}

impl BlockFaces {
    /// Returns `true` if `face` is visible.
    #[inline]
    #[must_use]
    pub const fn has(self, face: Face) -> bool {
        self.contains(face.flag())
    }

    /// Number of visible faces.
    #[inline]
    #[must_use]
    pub const fn count(self) -> u32 {
        self.bits().count_ones()
    }

    /// Visible faces in canonical order.
    pub fn faces(self) -> impl Iterator<Item = Face> {
        Face::ALL.into_iter().filter(move |face| self.has(*face))
    }
}

impl From<Face> for BlockFaces {
    fn from(face: Face) -> Self {
        face.flag()
    }
}

impl FromIterator<Face> for BlockFaces {
    fn from_iter<I: IntoIterator<Item = Face>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |faces, face| faces | face.flag())
    }
}

/// Index pattern of one quad, relative to its first vertex.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Outward normals, indexed by [`Face::index`].
///
/// Left points along -X and Right along +X, the side their corners lie on.
pub const FACE_NORMALS: [Vec3; 6] = [
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 0.0, -1.0),
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::new(1.0, 0.0, 0.0),
];

/// Corner offsets in emission order, indexed by [`Face::index`].
pub const FACE_CORNERS: [[Vec3; 4]; 6] = [
    // Top
    [
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(0.0, 1.0, 1.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
    ],
    // Bottom
    [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 0.0),
    ],
    // Front
    [
        Vec3::new(0.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(0.0, 0.0, 1.0),
    ],
    // Back
    [
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 0.0),
    ],
    // Left
    [
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 1.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(0.0, 0.0, 0.0),
    ],
    // Right
    [
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
    ],
];

const UV_00: Vec2 = Vec2::new(0.0, 0.0);
const UV_01: Vec2 = Vec2::new(0.0, 1.0);
const UV_10: Vec2 = Vec2::new(1.0, 0.0);
const UV_11: Vec2 = Vec2::new(1.0, 1.0);

/// Texture coordinates per corner, indexed by [`Face::index`].
pub const FACE_UVS: [[Vec2; 4]; 6] = [
    [UV_00, UV_10, UV_11, UV_01],
    [UV_00, UV_01, UV_11, UV_10],
    [UV_00, UV_10, UV_11, UV_01],
    [UV_00, UV_01, UV_11, UV_10],
    [UV_00, UV_10, UV_11, UV_01],
    [UV_00, UV_01, UV_11, UV_10],
];

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
        (b - a).cross(c - a)
    }

    #[test]
    fn both_triangles_wind_against_normal() {
        for face in Face::ALL {
            let c = face.corners();
            let n = face.normal();
            for tri in QUAD_INDICES.chunks_exact(3) {
                let t = triangle_normal(
                    c[tri[0] as usize],
                    c[tri[1] as usize],
                    c[tri[2] as usize],
                );
                assert_relative_eq!(t.normalize().dot(n), -1.0);
            }
        }
    }

    #[test]
    fn corners_lie_on_face_plane() {
        for face in Face::ALL {
            let n = face.normal();
            // Plane offset is 1 for positive faces, 0 for negative ones.
            let offset = n.max_element().max(0.0);
            for corner in face.corners() {
                assert_relative_eq!(corner.dot(n).abs(), offset);
            }
        }
    }

    #[test]
    fn corners_span_unit_square() {
        for face in Face::ALL {
            let c = face.corners();
            let area = triangle_normal(c[0], c[1], c[2]).length()
                + triangle_normal(c[2], c[3], c[0]).length();
            // Two triangles, each contributing twice its area.
            assert_relative_eq!(area, 2.0);
        }
    }

    #[test]
    fn uvs_cover_unit_square() {
        for face in Face::ALL {
            let mut uvs = face.uvs().map(|uv| (uv.x as u8, uv.y as u8));
            uvs.sort_unstable();
            assert_eq!(uvs, [(0, 0), (0, 1), (1, 0), (1, 1)]);
        }
    }

    #[test]
    fn paired_faces_have_opposite_normals() {
        for pair in FACE_NORMALS.chunks_exact(2) {
            assert_eq!(pair[0], -pair[1]);
        }
        assert_eq!(Face::Left.normal(), Vec3::NEG_X);
        assert_eq!(Face::Right.normal(), Vec3::X);
    }

    #[test]
    fn flags_follow_canonical_order() {
        for (i, face) in Face::ALL.into_iter().enumerate() {
            assert_eq!(face.index(), i);
            assert_eq!(face.flag().bits(), 1 << i);
        }
        assert_eq!(BlockFaces::all().count(), 6);
    }

    #[test]
    fn faces_iterates_in_canonical_order() {
        let faces = BlockFaces::RIGHT | BlockFaces::TOP | BlockFaces::BACK;
        let order: Vec<Face> = faces.faces().collect();
        assert_eq!(order, vec![Face::Top, Face::Back, Face::Right]);
        assert_eq!(faces.count(), 3);
    }

    #[test]
    fn collect_faces() {
        let faces: BlockFaces = [Face::Left, Face::Bottom].into_iter().collect();
        assert!(faces.has(Face::Left));
        assert!(faces.has(Face::Bottom));
        assert!(!faces.has(Face::Top));
        assert_eq!(BlockFaces::from(Face::Front), BlockFaces::FRONT);
    }
}
