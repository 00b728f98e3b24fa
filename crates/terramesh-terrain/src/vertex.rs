//! Packed terrain vertex format.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use half::f16;
use terramesh_core::face::{FACE_NORMALS, FACE_UVS};
use terramesh_gpu::{VertexFormat, VertexLayout, VertexSemantic};

/// One terrain vertex as stored in the vertex buffer.
///
/// 24 bytes: position as 3×f32, normal as 4×f16 (w unused, zero) and
/// texture coordinates as 2×f16.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f16; 4],
    pub uv: [f16; 2],
}

const _: () = assert!(std::mem::size_of::<TerrainVertex>() == 24);

impl TerrainVertex {
    /// Size of one vertex in bytes.
    pub const STRIDE: u32 = std::mem::size_of::<Self>() as u32;

    /// Pack a vertex from full-precision attributes.
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: [
                f16::from_f32(normal.x),
                f16::from_f32(normal.y),
                f16::from_f32(normal.z),
                f16::ZERO,
            ],
            uv: [f16::from_f32(uv.x), f16::from_f32(uv.y)],
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::new(
            self.normal[0].to_f32(),
            self.normal[1].to_f32(),
            self.normal[2].to_f32(),
        )
    }

    pub fn uv(&self) -> Vec2 {
        Vec2::new(self.uv[0].to_f32(), self.uv[1].to_f32())
    }

    /// Attribute layout matching this struct.
    pub fn layout() -> VertexLayout {
        VertexLayout::new()
            .with(VertexSemantic::Position, VertexFormat::Float32x3)
            .with(VertexSemantic::Normal, VertexFormat::Float16x4)
            .with(VertexSemantic::TexCoord, VertexFormat::Float16x2)
    }
}

/// Per-face attributes already converted to the packed half formats.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PackedFace {
    pub normal: [f16; 4],
    pub uvs: [[f16; 2]; 4],
}

/// Packed normals and UVs, indexed by `Face::index`.
pub(crate) const PACKED_FACES: [PackedFace; 6] = pack_faces();

const fn pack_faces() -> [PackedFace; 6] {
    let mut packed = [PackedFace {
        normal: [f16::ZERO; 4],
        uvs: [[f16::ZERO; 2]; 4],
    }; 6];

    let mut face = 0;
    while face < 6 {
        let n = FACE_NORMALS[face];
        packed[face].normal = [
            f16::from_f32_const(n.x),
            f16::from_f32_const(n.y),
            f16::from_f32_const(n.z),
            f16::ZERO,
        ];
        let mut corner = 0;
        while corner < 4 {
            let uv = FACE_UVS[face][corner];
            packed[face].uvs[corner] = [f16::from_f32_const(uv.x), f16::from_f32_const(uv.y)];
            corner += 1;
        }
        face += 1;
    }
    packed
}
