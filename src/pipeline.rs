//! Export orchestration: ingest, validate, prepare, build, write.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::container::builder::BuildOptions;
use crate::container::{self, PreparedMesh, PreparedModel, VertexSet, VertexSetKind, WeightRow};
use crate::error::{GnoError, Result};
use crate::ingestion;
use crate::strip::strippify;
use crate::types::{Bounds, MeshData, Scene};

#[derive(Debug)]
pub struct ExportSummary {
    pub mesh_count: usize,
    pub strip_count: usize,
    pub file_size: usize,
    pub output: PathBuf,
}

/// Drives one scene-to-container export.
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<ExportSummary> {
        let scene = ingestion::load_scene(&self.config.input)?;
        validate_scene(&scene)?;

        if self.config.dry_run {
            let stats = scene.stats();
            info!(
                meshes = stats.total_meshes,
                skinned = stats.skinned_meshes,
                with_uvs = stats.meshes_with_uvs,
                "dry run, nothing written"
            );
            return Ok(ExportSummary {
                mesh_count: stats.total_meshes,
                strip_count: 0,
                file_size: 0,
                output: self.config.output.clone(),
            });
        }

        let rig = ingestion::load_rig(&self.config.rig, self.config.rig_format)?;
        let model = prepare_model(&scene, rig, self.config.strict_topology)?;

        let file_name = self
            .config
            .output
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| {
                GnoError::Encoding(format!(
                    "output path {} has no usable file name",
                    self.config.output.display()
                ))
            })?
            .to_owned();

        let built = container::build(
            &model,
            &BuildOptions {
                include_texture_list: self.config.include_texture_list,
                file_name,
            },
        )?;

        atomic_write(&self.config.output, &built.bytes)?;

        let strip_count: usize = model
            .sets
            .iter()
            .flat_map(|s| &s.meshes)
            .map(|m| m.strips.len())
            .sum();
        info!(
            output = %self.config.output.display(),
            bytes = built.bytes.len(),
            meshes = model.mesh_count(),
            strips = strip_count,
            "export complete"
        );

        Ok(ExportSummary {
            mesh_count: model.mesh_count(),
            strip_count,
            file_size: built.bytes.len(),
            output: self.config.output.clone(),
        })
    }
}

/// Reject malformed input before any geometry processing starts.
fn validate_scene(scene: &Scene) -> Result<()> {
    if scene.meshes.iter().all(MeshData::is_empty) {
        return Err(GnoError::Scene("scene contains no geometry".into()));
    }

    for mat in &scene.materials {
        for slot in &mat.textures {
            if slot.texture >= scene.texture_names.len() {
                return Err(GnoError::Material(format!(
                    "material {:?} references texture {} but only {} are named",
                    mat.name,
                    slot.texture,
                    scene.texture_names.len()
                )));
            }
        }
    }

    for mesh in &scene.meshes {
        if mesh.is_empty() {
            continue;
        }

        if mesh.material >= scene.materials.len() {
            return Err(GnoError::Material(format!(
                "mesh {:?} references material {} but only {} exist",
                mesh.name,
                mesh.material,
                scene.materials.len()
            )));
        }

        if mesh.loop_normals.len() != mesh.indices.len() {
            return Err(GnoError::Scene(format!(
                "mesh {:?}: {} loop normals for {} indices",
                mesh.name,
                mesh.loop_normals.len(),
                mesh.indices.len()
            )));
        }

        if let Some(uvs) = &mesh.loop_uvs {
            if uvs.len() != mesh.indices.len() {
                return Err(GnoError::Scene(format!(
                    "mesh {:?}: {} loop uvs for {} indices",
                    mesh.name,
                    uvs.len(),
                    mesh.indices.len()
                )));
            }
        }

        if let Some(&max) = mesh.indices.iter().max() {
            if max as usize >= mesh.positions.len() {
                return Err(GnoError::Scene(format!(
                    "mesh {:?}: index {max} exceeds {} vertices",
                    mesh.name,
                    mesh.positions.len()
                )));
            }
        }

        if let Some(weights) = &mesh.weights {
            if weights.len() != mesh.positions.len() {
                return Err(GnoError::Weight(format!(
                    "mesh {:?}: {} weight entries for {} vertices",
                    mesh.name,
                    weights.len(),
                    mesh.positions.len()
                )));
            }
            for (v, influences) in weights.iter().enumerate() {
                if influences.is_empty() || influences.len() > 2 {
                    return Err(GnoError::Weight(format!(
                        "mesh {:?}: vertex {v} has {} bone influences, expected 1 or 2",
                        mesh.name,
                        influences.len()
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Stripify and quantization-prepare every mesh, grouped into flavors.
pub fn prepare_model(scene: &Scene, rig: Vec<u8>, strict: bool) -> Result<PreparedModel> {
    let mut grouped: [Vec<PreparedMesh>; 3] = Default::default();

    for mesh in &scene.meshes {
        if mesh.is_empty() {
            warn!(name = %mesh.name, "skipping empty mesh");
            continue;
        }
        let (kind, prepared) = prepare_mesh(mesh, strict)?;
        let slot = match kind {
            VertexSetKind::UvNormal => 0,
            VertexSetKind::NormalOnly => 1,
            VertexSetKind::Skinned => 2,
        };
        grouped[slot].push(prepared);
    }

    let kinds = [
        VertexSetKind::UvNormal,
        VertexSetKind::NormalOnly,
        VertexSetKind::Skinned,
    ];
    let sets: Vec<VertexSet> = kinds
        .into_iter()
        .zip(grouped)
        .filter(|(_, meshes)| !meshes.is_empty())
        .map(|(kind, meshes)| VertexSet { kind, meshes })
        .collect();

    let all_positions: Vec<[f32; 3]> = sets
        .iter()
        .flat_map(|s| &s.meshes)
        .flat_map(|m| m.positions.iter().copied())
        .collect();

    Ok(PreparedModel {
        bounds: Bounds::from_positions(&all_positions),
        sets,
        materials: scene.materials.clone(),
        texture_names: scene.texture_names.clone(),
        rig,
        bone_group_count: scene.bone_group_count,
    })
}

fn prepare_mesh(mesh: &MeshData, strict: bool) -> Result<(VertexSetKind, PreparedMesh)> {
    let kind = if mesh.has_uvs() {
        if mesh.is_skinned() {
            VertexSetKind::Skinned
        } else {
            VertexSetKind::UvNormal
        }
    } else {
        if mesh.is_skinned() {
            warn!(name = %mesh.name, "mesh has weights but no uvs, weights dropped");
        }
        VertexSetKind::NormalOnly
    };

    let indices: Vec<usize> = mesh.indices.iter().map(|&i| i as usize).collect();

    let (uvs, uv_loop_indices) = match (&mesh.loop_uvs, kind.has_uvs()) {
        (Some(loop_uvs), true) => {
            let (unique, loop_indices) = dedup_uvs(loop_uvs);
            (Some(unique), Some(loop_indices))
        }
        _ => (None, None),
    };

    let strips = strippify(&indices, uv_loop_indices.as_deref(), strict)?;

    let weights = if kind.has_weights() {
        Some(weight_rows(mesh)?)
    } else {
        None
    };

    debug!(
        name = %mesh.name,
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        strips = strips.len(),
        "mesh prepared"
    );

    let prepared = PreparedMesh {
        name: mesh.name.clone(),
        normals: vertex_normals(&indices, &mesh.loop_normals, mesh.positions.len()),
        bounds: mesh
            .bounds
            .unwrap_or_else(|| Bounds::from_positions(&mesh.positions)),
        positions: mesh.positions.clone(),
        uvs,
        weights,
        strips,
        bone: mesh.bone,
        bone_group: mesh.bone_group,
        material: mesh.material,
    };
    Ok((kind, prepared))
}

/// Average the per-loop normals down to one normal per vertex. Strip normal
/// indices equal vertex indices, so the normal buffer must parallel the
/// vertex buffer.
fn vertex_normals(
    indices: &[usize],
    loop_normals: &[[f32; 3]],
    vertex_count: usize,
) -> Vec<[f32; 3]> {
    let mut sums = vec![Vec3::ZERO; vertex_count];
    let mut counts = vec![0u32; vertex_count];

    for (&v, n) in indices.iter().zip(loop_normals) {
        sums[v] += Vec3::from_array(*n);
        counts[v] += 1;
    }

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            if count == 0 {
                [0.0; 3]
            } else {
                (sum / count as f32).to_array()
            }
        })
        .collect()
}

/// First-occurrence UV deduplication: unique UV list plus per-loop indices
/// into it.
fn dedup_uvs(loop_uvs: &[[f32; 2]]) -> (Vec<[f32; 2]>, Vec<usize>) {
    let mut unique = Vec::new();
    let mut loop_indices = Vec::with_capacity(loop_uvs.len());
    let mut seen: HashMap<(u32, u32), usize> = HashMap::new();

    for uv in loop_uvs {
        let key = (uv[0].to_bits(), uv[1].to_bits());
        let index = *seen.entry(key).or_insert_with(|| {
            unique.push(*uv);
            unique.len() - 1
        });
        loop_indices.push(index);
    }

    (unique, loop_indices)
}

/// One weight row per vertex. A single influence pins the vertex fully to
/// its bone; with two, the second weight is implicit.
fn weight_rows(mesh: &MeshData) -> Result<Vec<WeightRow>> {
    let weights = mesh.weights.as_ref().ok_or_else(|| {
        GnoError::Weight(format!("mesh {:?} classified skinned without weights", mesh.name))
    })?;

    Ok(weights
        .iter()
        .map(|influences| match influences[..] {
            [only] => WeightRow {
                bones: [only.group, 0],
                weight: 1.0,
            },
            [first, second] => WeightRow {
                bones: [first.group, second.group],
                weight: first.weight,
            },
            // validate_scene already rejected other arities
            _ => WeightRow {
                bones: [0, 0],
                weight: 1.0,
            },
        })
        .collect())
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("gno.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
