//! End-to-end exports through the public API, with container-level checks on
//! the produced files.

use std::fs;
use std::path::{Path, PathBuf};

use gno_export::config::{ExportConfig, RigFormat};
use gno_export::error::GnoError;
use gno_export::ingestion;
use gno_export::types::{BoneInfluence, Material, MeshData, Scene, TextureSlot};
use gno_export::Exporter;

fn write_scene(dir: &Path, scene: &Scene) -> PathBuf {
    let path = dir.join("scene.json");
    fs::write(&path, serde_json::to_vec(scene).unwrap()).unwrap();
    path
}

fn write_rig(dir: &Path, bones: usize) -> (PathBuf, Vec<u8>) {
    let blob: Vec<u8> = (0..bones * 0x80).map(|i| (i % 251) as u8).collect();
    let path = dir.join("rig.bin");
    fs::write(&path, &blob).unwrap();
    (path, blob)
}

fn config(dir: &Path, scene: &Scene) -> ExportConfig {
    let input = write_scene(dir, scene);
    let (rig, _) = write_rig(dir, 2);
    ExportConfig {
        input,
        output: dir.join("model.gno"),
        rig,
        rig_format: RigFormat::Raw,
        include_texture_list: true,
        strict_topology: true,
        dry_run: false,
    }
}

fn uv_quad(name: &str) -> MeshData {
    MeshData {
        name: name.into(),
        positions: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
        loop_normals: vec![[0.0, 0.0, 1.0]; 6],
        loop_uvs: Some(vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
        ]),
        material: 0,
        bone: 0x46,
        ..Default::default()
    }
}

fn plain_tri(name: &str) -> MeshData {
    MeshData {
        name: name.into(),
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        indices: vec![0, 1, 2],
        loop_normals: vec![[0.0, 1.0, 0.0]; 3],
        material: 0,
        bone: 0x46,
        ..Default::default()
    }
}

fn skinned_quad(name: &str) -> MeshData {
    MeshData {
        weights: Some(vec![
            vec![BoneInfluence {
                group: 0,
                weight: 1.0,
            }],
            vec![BoneInfluence {
                group: 1,
                weight: 1.0,
            }],
            vec![
                BoneInfluence {
                    group: 0,
                    weight: 0.5,
                },
                BoneInfluence {
                    group: 1,
                    weight: 0.5,
                },
            ],
            vec![BoneInfluence {
                group: 1,
                weight: 1.0,
            }],
        ]),
        bone_group: -1,
        ..uv_quad(name)
    }
}

fn full_scene() -> Scene {
    Scene {
        meshes: vec![
            uv_quad("body"),
            plain_tri("fin"),
            skinned_quad("cloth"),
        ],
        materials: vec![
            Material {
                name: "skin".into(),
                textures: vec![TextureSlot {
                    texture: 0,
                    kind: Default::default(),
                }],
                ..Default::default()
            },
            Material::default(),
        ],
        texture_names: vec!["skin.gvr".into()],
        bone_group_count: 2,
    }
}

fn read_u32_le(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

fn read_u32_be(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes(bytes[at..at + 4].try_into().unwrap())
}

/// Walk the chunk chain from the start of the file up to and including NEND.
fn chunk_tags(bytes: &[u8]) -> Vec<[u8; 4]> {
    let mut tags = Vec::new();
    let mut at = 0usize;
    while at + 8 <= bytes.len() {
        let tag: [u8; 4] = bytes[at..at + 4].try_into().unwrap();
        tags.push(tag);
        if &tag == b"NEND" {
            break;
        }
        at += 8 + read_u32_le(bytes, at + 4) as usize;
    }
    tags
}

#[test]
fn exports_complete_container() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), &full_scene());
    let summary = Exporter::new(config.clone()).run().unwrap();

    assert_eq!(summary.mesh_count, 3);
    assert!(summary.strip_count >= 3);

    let bytes = fs::read(&config.output).unwrap();
    assert_eq!(summary.file_size, bytes.len());
    assert_eq!(bytes.len() % 32, 0);
    assert_eq!(
        chunk_tags(&bytes),
        vec![*b"NGIF", *b"NGTL", *b"NGOB", *b"NOF0", *b"NFN0", *b"NEND"]
    );
}

#[test]
fn info_header_points_at_offset_table() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), &full_scene());
    Exporter::new(config.clone()).run().unwrap();

    let bytes = fs::read(&config.output).unwrap();
    assert_eq!(&bytes[0..4], b"NGIF");
    assert_eq!(read_u32_le(&bytes, 4), 24);

    let nof0_body = read_u32_be(&bytes, 16) as usize;
    let nof0_file = read_u32_be(&bytes, 20) as usize;
    assert_eq!(nof0_file, nof0_body + 0x20);
    assert_eq!(&bytes[nof0_file..nof0_file + 4], b"NOF0");
}

#[test]
fn offset_table_entries_are_valid_pointers() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), &full_scene());
    Exporter::new(config.clone()).run().unwrap();

    let bytes = fs::read(&config.output).unwrap();
    let body = &bytes[0x20..];
    let nof0 = read_u32_be(&bytes, 16) as usize;

    let count = read_u32_be(body, nof0 + 8) as usize;
    assert!(count > 0);
    for i in 0..count {
        let field = read_u32_be(body, nof0 + 0x10 + i * 4) as usize;
        assert_eq!(field % 4, 0, "pointer field {field:#x} misaligned");
        assert!(field + 4 <= nof0, "pointer field {field:#x} out of bounds");
        let target = read_u32_be(body, field) as usize;
        assert!(target < nof0, "pointer target {target:#x} out of bounds");
    }
}

#[test]
fn file_name_chunk_carries_output_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), &full_scene());
    Exporter::new(config.clone()).run().unwrap();

    let bytes = fs::read(&config.output).unwrap();
    let pos = bytes.windows(4).position(|w| w == b"NFN0").unwrap();
    let name = &bytes[pos + 0x10..pos + 0x10 + 9];
    assert_eq!(name, b"model.gno");
}

#[test]
fn rig_round_trips_through_exported_model() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), &full_scene());
    let (rig_path, blob) = write_rig(dir.path(), 3);
    config.rig = rig_path;
    Exporter::new(config.clone()).run().unwrap();

    let extracted =
        ingestion::load_rig(&config.output, RigFormat::Gno).unwrap();
    assert_eq!(extracted, blob);
}

#[test]
fn texture_list_can_be_omitted() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), &full_scene());
    config.include_texture_list = false;
    Exporter::new(config.clone()).run().unwrap();

    let bytes = fs::read(&config.output).unwrap();
    assert_eq!(
        chunk_tags(&bytes),
        vec![*b"NGIF", *b"NGOB", *b"NOF0", *b"NFN0", *b"NEND"]
    );
    // Object chunk index in the info header drops to 1.
    assert_eq!(read_u32_be(&bytes, 8), 1);
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), &full_scene());
    config.dry_run = true;
    let summary = Exporter::new(config.clone()).run().unwrap();

    assert_eq!(summary.file_size, 0);
    assert!(!config.output.exists());
}

#[test]
fn overweighted_vertex_fails_export() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = full_scene();
    scene.meshes[2].weights.as_mut().unwrap()[0] = vec![
        BoneInfluence {
            group: 0,
            weight: 0.3
        };
        3
    ];
    let config = config(dir.path(), &scene);
    let err = Exporter::new(config.clone()).run().unwrap_err();
    assert!(matches!(err, GnoError::Weight(_)));
    assert!(!config.output.exists());
}

#[test]
fn missing_rig_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), &full_scene());
    config.rig = dir.path().join("absent.bin");
    let err = Exporter::new(config).run().unwrap_err();
    assert!(matches!(err, GnoError::Io(_)));
}

#[test]
fn non_manifold_scene_respects_topology_mode() {
    let fan = MeshData {
        name: "fan".into(),
        positions: vec![[0.0; 3]; 5],
        indices: vec![0, 1, 2, 0, 1, 3, 0, 1, 4],
        loop_normals: vec![[0.0, 0.0, 1.0]; 9],
        material: 0,
        ..Default::default()
    };
    let scene = Scene {
        meshes: vec![fan],
        materials: vec![Material::default()],
        ..Default::default()
    };

    let dir = tempfile::tempdir().unwrap();
    let strict = config(dir.path(), &scene);
    let err = Exporter::new(strict.clone()).run().unwrap_err();
    assert!(matches!(err, GnoError::Topology(_)));

    let mut lenient = strict;
    lenient.strict_topology = false;
    let summary = Exporter::new(lenient).run().unwrap();
    assert_eq!(summary.mesh_count, 1);
}
