use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Bounding sphere: center + radius, as consumed by the engine's mesh records.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub center: [f32; 3],
    pub radius: f32,
}

impl Bounds {
    /// Bounding-box center with the max vertex distance as radius.
    pub fn from_positions(positions: &[[f32; 3]]) -> Self {
        if positions.is_empty() {
            return Self::default();
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in positions {
            let v = Vec3::from_array(*p);
            min = min.min(v);
            max = max.max(v);
        }
        let center = (min + max) * 0.5;

        let mut radius = 0.0f32;
        for p in positions {
            radius = radius.max(center.distance(Vec3::from_array(*p)));
        }

        Self {
            center: center.to_array(),
            radius,
        }
    }
}

/// One bone influence on a vertex. At most two per vertex are representable
/// in the container; more is an input error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneInfluence {
    pub group: u8,
    pub weight: f32,
}

/// Normalized per-mesh data handed over by the host application.
///
/// Indices are triangulated (`indices.len() % 3 == 0`); normals and UVs are
/// per-loop, parallel to `indices`. Weights, when present, are per-vertex.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshData {
    #[serde(default)]
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub loop_normals: Vec<[f32; 3]>,
    #[serde(default)]
    pub loop_uvs: Option<Vec<[f32; 2]>>,
    /// Per-vertex bone influences; presence marks the mesh as skinned.
    #[serde(default)]
    pub weights: Option<Vec<Vec<BoneInfluence>>>,
    pub material: usize,
    /// Bone visibility word from the rig lookup.
    #[serde(default)]
    pub bone: u32,
    #[serde(default)]
    pub bone_group: i32,
    /// Precomputed bounding sphere; derived from positions when absent.
    #[serde(default)]
    pub bounds: Option<Bounds>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_uvs(&self) -> bool {
        self.loop_uvs.is_some()
    }

    pub fn is_skinned(&self) -> bool {
        self.weights.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_mesh() {
        let mesh = MeshData::default();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(!mesh.has_uvs());
        assert!(!mesh.is_skinned());
    }

    #[test]
    fn quad_two_triangles() {
        let mesh = MeshData {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            loop_normals: vec![[0.0, 0.0, 1.0]; 6],
            ..Default::default()
        };

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn bounds_from_unit_square() {
        let bounds = Bounds::from_positions(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        assert_relative_eq!(bounds.center[0], 0.5);
        assert_relative_eq!(bounds.center[1], 0.5);
        assert_relative_eq!(bounds.center[2], 0.0);
        assert_relative_eq!(bounds.radius, (0.5f32 * 0.5 + 0.5 * 0.5).sqrt());
    }

    #[test]
    fn bounds_empty_positions() {
        let bounds = Bounds::from_positions(&[]);
        assert_eq!(bounds, Bounds::default());
    }
}
