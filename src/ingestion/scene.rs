//! Normalized scene document loader.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::types::Scene;

/// Load and deserialize a scene JSON document.
pub fn load_scene(path: &Path) -> Result<Scene> {
    let file = File::open(path)?;
    let scene: Scene = serde_json::from_reader(BufReader::new(file))?;

    let stats = scene.stats();
    info!(
        meshes = stats.total_meshes,
        vertices = stats.total_vertices,
        triangles = stats.total_triangles,
        materials = stats.material_count,
        textures = stats.texture_count,
        "scene loaded"
    );

    Ok(scene)
}
