use serde::{Deserialize, Serialize};

use super::{Material, MeshData};

/// The normalized scene document handed over by the host application.
///
/// This is the whole collaborator contract: the exporter has no knowledge of
/// how the host produced it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<Material>,
    #[serde(default)]
    pub texture_names: Vec<String>,
    #[serde(default)]
    pub bone_group_count: u32,
}

/// Summary statistics over a loaded scene.
#[derive(Debug)]
pub struct SceneStats {
    pub total_meshes: usize,
    pub total_vertices: usize,
    pub total_triangles: usize,
    pub skinned_meshes: usize,
    pub meshes_with_uvs: usize,
    pub material_count: usize,
    pub texture_count: usize,
}

impl Scene {
    pub fn stats(&self) -> SceneStats {
        SceneStats {
            total_meshes: self.meshes.len(),
            total_vertices: self.meshes.iter().map(|m| m.vertex_count()).sum(),
            total_triangles: self.meshes.iter().map(|m| m.triangle_count()).sum(),
            skinned_meshes: self.meshes.iter().filter(|m| m.is_skinned()).count(),
            meshes_with_uvs: self.meshes.iter().filter(|m| m.has_uvs()).count(),
            material_count: self.materials.len(),
            texture_count: self.texture_names.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_over_mixed_scene() {
        let scene = Scene {
            meshes: vec![
                MeshData {
                    positions: vec![[0.0; 3]; 3],
                    indices: vec![0, 1, 2],
                    loop_normals: vec![[0.0, 0.0, 1.0]; 3],
                    loop_uvs: Some(vec![[0.0, 0.0]; 3]),
                    ..Default::default()
                },
                MeshData {
                    positions: vec![[0.0; 3]; 4],
                    indices: vec![0, 1, 2, 0, 2, 3],
                    loop_normals: vec![[0.0, 0.0, 1.0]; 6],
                    weights: Some(vec![Vec::new(); 4]),
                    loop_uvs: Some(vec![[0.0, 0.0]; 6]),
                    ..Default::default()
                },
            ],
            materials: vec![Material::default()],
            texture_names: vec!["checker.gvr".into()],
            bone_group_count: 3,
        };

        let stats = scene.stats();
        assert_eq!(stats.total_meshes, 2);
        assert_eq!(stats.total_vertices, 7);
        assert_eq!(stats.total_triangles, 3);
        assert_eq!(stats.skinned_meshes, 1);
        assert_eq!(stats.meshes_with_uvs, 2);
        assert_eq!(stats.material_count, 1);
        assert_eq!(stats.texture_count, 1);
    }

    #[test]
    fn scene_json_round_trip() {
        let scene = Scene {
            meshes: vec![MeshData {
                name: "plane".into(),
                positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                indices: vec![0, 1, 2],
                loop_normals: vec![[0.0, 0.0, 1.0]; 3],
                material: 0,
                bone: 0x46,
                ..Default::default()
            }],
            materials: vec![Material::default()],
            ..Default::default()
        };

        let json = serde_json::to_string(&scene).unwrap();
        let back: Scene = serde_json::from_str(&json).unwrap();
        assert_eq!(back.meshes.len(), 1);
        assert_eq!(back.meshes[0].name, "plane");
        assert_eq!(back.meshes[0].bone, 0x46);
    }
}
