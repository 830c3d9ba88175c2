//! Whole-container assembly.
//!
//! The body is built fully in memory with body-relative offsets; the engine
//! rebases everything by 0x20 when it skips the info header. Assembly runs in
//! three passes: write the body with a placeholder object chunk header, patch
//! the placeholder once the offset table position is known, then prepend the
//! 32-byte `NGIF` info chunk.

use tracing::debug;

use crate::container::encode::{quantize_normal3, quantize_uv, quantize_weight};
use crate::container::model::{PreparedModel, VertexSet, VertexSetKind};
use crate::container::writer::{ChunkWriter, align32};
use crate::error::{GnoError, Result};

/// Size of the prepended `NGIF` chunk.
pub const INFO_HEADER_SIZE: u32 = 0x20;
/// Size of one opaque bone record in the rig blob.
pub const BONE_RECORD_SIZE: usize = 0x80;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Emit the `NGTL` texture list chunk ahead of the object chunk.
    pub include_texture_list: bool,
    /// File name recorded in the `NFN0` chunk.
    pub file_name: String,
}

/// Body-relative positions of the landmarks tests and callers care about.
#[derive(Debug, Clone, Copy)]
pub struct ContainerLayout {
    pub ngob_offset: u32,
    pub object_offset: u32,
    pub nof0_offset: u32,
    pub relocation_count: usize,
}

/// A finished container: final file bytes (info header included) plus layout.
#[derive(Debug)]
pub struct BuiltContainer {
    pub bytes: Vec<u8>,
    pub layout: ContainerLayout,
}

/// Build the complete container file for a prepared model.
pub fn build(model: &PreparedModel, opts: &BuildOptions) -> Result<BuiltContainer> {
    if model.rig.is_empty() || model.rig.len() % BONE_RECORD_SIZE != 0 {
        return Err(GnoError::Rig(format!(
            "rig blob length {:#x} is not a positive multiple of {:#x}",
            model.rig.len(),
            BONE_RECORD_SIZE
        )));
    }

    let mut w = ChunkWriter::with_capacity(0x1_0000);

    if opts.include_texture_list {
        write_texture_list(&mut w, &model.texture_names)?;
    }

    // Placeholder object chunk header, patched below.
    let ngob_offset = w.position();
    w.write_tag(b"NGOB");
    w.pad(12);

    let bone_offset = w.position();
    w.write_bytes(&model.rig);

    let material_structs_offset = write_materials(&mut w, model)?;

    let set_buffers: Vec<SetBuffers> = model
        .sets
        .iter()
        .map(|set| write_vertex_buffers(&mut w, set))
        .collect::<Result<_>>()?;

    let set_info_offsets: Vec<u32> = set_buffers
        .iter()
        .map(|buffers| write_vertex_set_info(&mut w, buffers))
        .collect();

    let set_list_offset = w.position();
    for &info_offset in &set_info_offsets {
        w.write_u32_be(0x1);
        w.write_offset(info_offset);
    }

    let face_infos = write_face_blobs(&mut w, model)?;

    let face_struct_offsets: Vec<u32> = face_infos
        .iter()
        .map(|face| {
            let offset = w.position();
            w.write_u32_be(face.flags);
            w.write_offset(face.offset);
            w.write_u32_be(face.size);
            w.write_u32_be(0);
            offset
        })
        .collect();

    let face_list_offset = w.position();
    for &offset in &face_struct_offsets {
        w.write_u32_be(0x4);
        w.write_offset(offset);
    }

    let mesh_record_offsets = write_mesh_records(&mut w, model);
    let mesh_set_offset = write_mesh_set_records(&mut w, model, &mesh_record_offsets);

    // Object record, the patch target of the placeholder header.
    let object_offset = w.position();
    w.write_f32_be(model.bounds.center[0]);
    w.write_f32_be(model.bounds.center[1]);
    w.write_f32_be(model.bounds.center[2]);
    w.write_f32_be(model.bounds.radius);

    w.write_u32_be(model.materials.len() as u32);
    w.write_offset(material_structs_offset);

    w.write_u32_be(model.sets.len() as u32);
    w.write_offset(set_list_offset);

    w.write_u32_be(face_infos.len() as u32);
    w.write_offset(face_list_offset);

    w.write_u32_be(model.bone_count() as u32);
    w.write_u32_be(0xC);
    w.write_offset(bone_offset);

    w.write_u32_be(model.bone_group_count);

    w.write_u32_be(mesh_set_count(model) as u32);
    w.write_offset(mesh_set_offset);

    w.write_u32_be(0x4);
    w.align32();

    let nof0_offset = w.position();
    write_offset_table(&mut w);
    write_file_name(&mut w, &opts.file_name)?;
    write_end_chunk(&mut w);

    let relocation_count = w.relocations().len();
    let mut body = w.into_bytes();
    patch_object_header(&mut body, ngob_offset, nof0_offset, object_offset);

    let mut bytes = Vec::with_capacity(INFO_HEADER_SIZE as usize + body.len());
    let ngob_chunk_index = if opts.include_texture_list { 2 } else { 1 };
    bytes.extend_from_slice(&info_header(nof0_offset, ngob_chunk_index));
    bytes.extend_from_slice(&body);

    debug!(
        body_len = body.len(),
        relocations = relocation_count,
        object_offset,
        "container assembled"
    );

    Ok(BuiltContainer {
        bytes,
        layout: ContainerLayout {
            ngob_offset,
            object_offset,
            nof0_offset,
            relocation_count,
        },
    })
}

/// Fill in the object chunk header: little-endian chunk size and big-endian
/// object record offset. Idempotent over the same landmarks.
pub fn patch_object_header(body: &mut [u8], ngob_offset: u32, nof0_offset: u32, object_offset: u32) {
    let size = nof0_offset - ngob_offset - 8;
    let at = ngob_offset as usize + 4;
    body[at..at + 4].copy_from_slice(&size.to_le_bytes());
    body[at + 4..at + 8].copy_from_slice(&object_offset.to_be_bytes());
}

/// The 32-byte `NGIF` info chunk prepended to the body.
pub fn info_header(nof0_body_offset: u32, ngob_chunk_index: u32) -> [u8; INFO_HEADER_SIZE as usize] {
    let mut header = [0u8; INFO_HEADER_SIZE as usize];
    header[0..4].copy_from_slice(b"NGIF");
    header[4..8].copy_from_slice(&24u32.to_le_bytes());
    let fields = [
        ngob_chunk_index,
        INFO_HEADER_SIZE,
        nof0_body_offset,
        nof0_body_offset + INFO_HEADER_SIZE,
        0x1C0,
        0x1,
    ];
    for (i, v) in fields.iter().enumerate() {
        header[8 + i * 4..12 + i * 4].copy_from_slice(&v.to_be_bytes());
    }
    header
}

fn fit_u16(value: usize, what: &str) -> Result<u16> {
    u16::try_from(value)
        .map_err(|_| GnoError::Encoding(format!("{what} {value} does not fit in 16 bits")))
}

fn write_texture_list(w: &mut ChunkWriter, texture_names: &[String]) -> Result<()> {
    for name in texture_names {
        if !name.is_ascii() {
            return Err(GnoError::Encoding(format!(
                "texture name {name:?} is not ASCII"
            )));
        }
    }

    let descriptor_table_end = texture_names.len() as u32 * 0x14 + 0x10;
    let string_table_len: u32 = texture_names.iter().map(|n| n.len() as u32 + 1).sum();
    let chunk_size = align32(descriptor_table_end + string_table_len + 0x8);

    w.write_tag(b"NGTL");
    w.write_u32_le(chunk_size - 0x8);
    w.write_u32_be(descriptor_table_end);
    w.pad(4);

    // 20-byte descriptor per texture, pointing into the string table.
    let mut string_offset = descriptor_table_end + 0x8;
    for name in texture_names {
        w.pad(4);
        w.write_offset(string_offset);
        w.write_u32_be(0x0005_0001);
        w.pad(8);
        string_offset += name.len() as u32 + 1;
    }

    w.write_u32_be(texture_names.len() as u32);
    w.write_offset(0x10);

    for name in texture_names {
        w.write_bytes(name.as_bytes());
        w.write_u8(0);
    }
    w.align32();

    Ok(())
}

fn write_materials(w: &mut ChunkWriter, model: &PreparedModel) -> Result<u32> {
    const SHADING_TAIL: [u32; 10] = [0x1, 0x4, 0x5, 0x5, 0x2, 0x0, 0x6, 0x7, 0x0, 0x0];

    let mut material_offsets = Vec::with_capacity(model.materials.len());
    for mat in &model.materials {
        material_offsets.push(w.position());

        w.write_u32_be(mat.flags());
        for f in [
            mat.color[0],
            mat.color[1],
            mat.color[2],
            mat.alpha,
            mat.color[0],
            mat.color[1],
            mat.color[2],
            0.9,
            0.9,
            0.9,
            2.0,
            0.299_999_98,
        ] {
            w.write_f32_be(f);
        }
        for v in SHADING_TAIL {
            w.write_u32_be(v);
        }

        for slot in mat.ordered_textures() {
            w.write_u32_be(slot.kind.flags());
            w.write_u32_be(slot.texture as u32);
            w.write_u32_be(0x8000_0000);
            w.write_u32_be(0);
            w.write_f32_be(1.0);
        }
    }

    let material_structs_offset = w.position();
    for (mat, &offset) in model.materials.iter().zip(&material_offsets) {
        let slots = mat.textures.len();
        if slots > 8 {
            return Err(GnoError::Material(format!(
                "material {:?} has {slots} texture slots, at most 8 are supported",
                mat.name
            )));
        }
        w.write_u16_be((1u16 << (slots + 1)) - 1);
        w.write_u16_be(0xFFFF);
        w.write_offset(offset);
    }
    w.align4();

    Ok(material_structs_offset)
}

/// Offsets and counts of one flavor's concatenated attribute buffers.
struct SetBuffers {
    vertices_offset: u32,
    vertex_count: u16,
    normals_offset: u32,
    normal_count: u16,
    uvs: Option<(u32, u16)>,
    weights: Option<(u32, u16)>,
}

fn write_vertex_buffers(w: &mut ChunkWriter, set: &VertexSet) -> Result<SetBuffers> {
    let vertices_offset = w.position();
    for mesh in &set.meshes {
        for p in &mesh.positions {
            w.write_f32_be(p[0]);
            w.write_f32_be(p[1]);
            w.write_f32_be(p[2]);
        }
    }
    w.align4();

    let normals_offset = w.position();
    let mut normal_count = 0usize;
    for mesh in &set.meshes {
        for &n in &mesh.normals {
            for c in quantize_normal3(n) {
                w.write_i8(c);
            }
        }
        normal_count += mesh.normals.len();
    }
    w.align4();

    let uvs = if set.kind.has_uvs() {
        let offset = w.position();
        for mesh in &set.meshes {
            for uv in mesh.uvs.iter().flatten() {
                let [u, v] = quantize_uv(*uv);
                w.write_i16_be(u);
                w.write_i16_be(v);
            }
        }
        w.align4();
        Some((offset, fit_u16(set.uv_count(), "uv count")?))
    } else {
        None
    };

    let weights = if set.kind.has_weights() {
        let offset = w.position();
        let mut count = 0usize;
        for mesh in &set.meshes {
            for row in mesh.weights.iter().flatten() {
                w.write_u8(row.bones[0]);
                w.write_u8(row.bones[1]);
                w.write_u16_be(quantize_weight(row.weight));
                count += 1;
            }
        }
        w.align4();
        Some((offset, fit_u16(count, "weight count")?))
    } else {
        None
    };

    Ok(SetBuffers {
        vertices_offset,
        vertex_count: fit_u16(set.vertex_count(), "vertex count")?,
        normals_offset,
        normal_count: fit_u16(normal_count, "normal count")?,
        uvs,
        weights,
    })
}

/// 56-byte info struct: seven 8-byte rows, absent attributes zeroed.
fn write_vertex_set_info(w: &mut ChunkWriter, buffers: &SetBuffers) -> u32 {
    let info_offset = w.position();

    w.write_u16_be(0x1);
    w.write_u16_be(buffers.vertex_count);
    w.write_offset(buffers.vertices_offset);

    w.write_u16_be(0x3);
    w.write_u16_be(buffers.normal_count);
    w.write_offset(buffers.normals_offset);

    w.pad(8);

    match buffers.uvs {
        Some((offset, count)) => {
            w.write_u16_be(0x2);
            w.write_u16_be(count);
            w.write_offset(offset);
        }
        None => w.pad(8),
    }

    w.pad(8);

    match buffers.weights {
        Some((offset, count)) => {
            w.write_u16_be(0x1);
            w.write_u16_be(count);
            w.write_offset(offset);
        }
        None => w.pad(8),
    }

    w.pad(8);

    info_offset
}

struct FaceBlob {
    flags: u32,
    offset: u32,
    size: u32,
}

/// Display-list blob per mesh: strip opcodes with flavor-wide index bases.
fn write_face_blobs(w: &mut ChunkWriter, model: &PreparedModel) -> Result<Vec<FaceBlob>> {
    let mut blobs = Vec::with_capacity(model.mesh_count());

    for set in &model.sets {
        let mut vertex_base = 0usize;
        let mut normal_base = 0usize;
        let mut uv_base = 0usize;

        for mesh in &set.meshes {
            w.align32();
            let offset = w.position();

            w.write_bytes(&set.kind.face_header());
            w.write_u8(set.kind.attribute_byte());

            for strip in &mesh.strips {
                w.write_u8(0x99);
                w.write_u16_be(fit_u16(strip.len(), "strip length")?);

                for i in 0..strip.len() {
                    w.write_u16_be(fit_u16(strip.vertices[i] + vertex_base, "vertex index")?);
                    w.write_u16_be(fit_u16(strip.normals[i] + normal_base, "normal index")?);
                    if let Some(uvs) = &strip.uvs {
                        w.write_u16_be(fit_u16(uvs[i] + uv_base, "uv index")?);
                    }
                }
            }

            w.align32();
            blobs.push(FaceBlob {
                flags: set.kind.face_flags(),
                offset,
                size: w.position() - offset,
            });

            vertex_base += mesh.positions.len();
            normal_base += mesh.normals.len();
            uv_base += mesh.uv_count();
        }
    }

    Ok(blobs)
}

/// Per-set starting offsets of the mesh record runs.
fn write_mesh_records(w: &mut ChunkWriter, model: &PreparedModel) -> Vec<u32> {
    let mut starts = Vec::with_capacity(model.sets.len());
    let mut face_index = 0u32;

    for (set_index, set) in model.sets.iter().enumerate() {
        starts.push(w.position());
        for mesh in &set.meshes {
            w.write_f32_be(mesh.bounds.center[0]);
            w.write_f32_be(mesh.bounds.center[1]);
            w.write_f32_be(mesh.bounds.center[2]);
            w.write_f32_be(mesh.bounds.radius);
            w.write_u32_be(mesh.bone);
            w.write_i32_be(mesh.bone_group);
            w.write_u32_be(mesh.material as u32);
            w.write_u32_be(set_index as u32);
            w.write_u32_be(face_index);
            face_index += 1;
        }
    }

    starts
}

fn mesh_set_count(model: &PreparedModel) -> usize {
    model.sets.len()
}

/// Mesh-set table, in the engine's fixed flavor order rather than buffer order.
fn write_mesh_set_records(w: &mut ChunkWriter, model: &PreparedModel, starts: &[u32]) -> u32 {
    let offset = w.position();
    for kind in VertexSetKind::MESH_SET_ORDER {
        let Some(index) = model.sets.iter().position(|s| s.kind == kind) else {
            continue;
        };
        w.write_u32_be(kind.set_flags());
        w.write_u32_be(model.sets[index].meshes.len() as u32);
        w.write_offset(starts[index]);
        w.pad(8);
    }
    offset
}

fn write_offset_table(w: &mut ChunkWriter) {
    let relocations = w.relocations().to_vec();
    let count = relocations.len() as u32;
    let table_start = w.position() + 0x10;
    let size = align32(table_start + count * 4) - table_start + 0x8;

    w.write_tag(b"NOF0");
    w.write_u32_le(size);
    w.write_u32_be(count);
    w.pad(4);
    for offset in relocations {
        w.write_u32_be(offset);
    }
}

fn write_file_name(w: &mut ChunkWriter, file_name: &str) -> Result<()> {
    if !file_name.is_ascii() {
        return Err(GnoError::Encoding(format!(
            "output file name {file_name:?} is not ASCII"
        )));
    }

    w.align32();
    let size = align32(file_name.len() as u32 + 0x11) - 0x8;
    w.write_tag(b"NFN0");
    w.write_u32_le(size);
    w.pad(8);
    w.write_bytes(file_name.as_bytes());
    w.write_u8(0);
    Ok(())
}

fn write_end_chunk(w: &mut ChunkWriter) {
    w.align32();
    w.write_tag(b"NEND");
    w.write_u32_le(0x8);
    w.align32();
}
