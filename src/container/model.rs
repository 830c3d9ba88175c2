//! Builder input model: stripified, quantization-ready geometry grouped into
//! vertex-set flavors.

use crate::strip::Strip;
use crate::types::{Bounds, Material};

/// The three vertex-set flavors of the container. Declaration order is the
/// buffer/record order; the mesh-set table uses [`VertexSetKind::MESH_SET_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexSetKind {
    /// Vertices, normals, and UVs.
    UvNormal,
    /// Vertices and normals only.
    NormalOnly,
    /// Vertices, normals, UVs, and bone weights.
    Skinned,
}

impl VertexSetKind {
    /// Mesh-set records go out in this order regardless of buffer order.
    pub const MESH_SET_ORDER: [VertexSetKind; 3] = [
        VertexSetKind::UvNormal,
        VertexSetKind::Skinned,
        VertexSetKind::NormalOnly,
    ];

    pub fn set_flags(self) -> u32 {
        match self {
            VertexSetKind::UvNormal => 0x101,
            VertexSetKind::NormalOnly => 0x102,
            VertexSetKind::Skinned => 0x201,
        }
    }

    pub fn face_flags(self) -> u32 {
        match self {
            VertexSetKind::UvNormal => 0x00C9_002A,
            VertexSetKind::NormalOnly => 0x0009_000A,
            VertexSetKind::Skinned => 0x1085_000A,
        }
    }

    pub fn has_uvs(self) -> bool {
        !matches!(self, VertexSetKind::NormalOnly)
    }

    pub fn has_weights(self) -> bool {
        matches!(self, VertexSetKind::Skinned)
    }

    /// Fixed 20-byte display-list preamble of a face blob. Byte 11 selects
    /// the vertex descriptor variant: 0x03 with UVs, 0x00 without.
    pub fn face_header(self) -> [u8; 20] {
        let mut header = [
            0x08, 0x50, 0x00, 0x00, 0x1E, 0x00, 0x08, 0x60, 0x00, 0x00, 0x00, 0x03, 0x10, 0x00,
            0x00, 0x10, 0x08, 0x00, 0x00, 0x00,
        ];
        if !self.has_uvs() {
            header[11] = 0x00;
        }
        header
    }

    /// Attribute byte following the preamble.
    pub fn attribute_byte(self) -> u8 {
        if self.has_uvs() { 0x14 } else { 0x04 }
    }
}

/// One vertex's weight row: two bone slots plus the first bone's weight
/// (the second weight is implicit).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightRow {
    pub bones: [u8; 2],
    pub weight: f32,
}

/// One mesh after preparation: per-vertex normals, deduplicated UVs, strips.
#[derive(Debug, Clone)]
pub struct PreparedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex, parallel to `positions`.
    pub normals: Vec<[f32; 3]>,
    /// Unique UVs; strip UV indices point into this.
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Per-vertex, parallel to `positions`.
    pub weights: Option<Vec<WeightRow>>,
    pub strips: Vec<Strip>,
    pub bounds: Bounds,
    pub bone: u32,
    pub bone_group: i32,
    pub material: usize,
}

impl PreparedMesh {
    pub fn uv_count(&self) -> usize {
        self.uvs.as_ref().map_or(0, Vec::len)
    }
}

/// All meshes of one flavor, sharing concatenated attribute buffers.
#[derive(Debug, Clone)]
pub struct VertexSet {
    pub kind: VertexSetKind,
    pub meshes: Vec<PreparedMesh>,
}

impl VertexSet {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }

    pub fn uv_count(&self) -> usize {
        self.meshes.iter().map(PreparedMesh::uv_count).sum()
    }
}

/// Everything the container builder needs, in write-ready form.
#[derive(Debug, Clone)]
pub struct PreparedModel {
    /// Present flavors, in [`VertexSetKind`] declaration order.
    pub sets: Vec<VertexSet>,
    pub materials: Vec<Material>,
    pub texture_names: Vec<String>,
    /// Opaque bone records, 0x80 bytes each.
    pub rig: Vec<u8>,
    /// Aggregate bounds over every vertex of every mesh.
    pub bounds: Bounds,
    pub bone_group_count: u32,
}

impl PreparedModel {
    pub fn mesh_count(&self) -> usize {
        self.sets.iter().map(|s| s.meshes.len()).sum()
    }

    pub fn bone_count(&self) -> usize {
        self.rig.len() / 0x80
    }
}
