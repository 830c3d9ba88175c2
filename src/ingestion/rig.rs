//! Rig (bone blob) loading.
//!
//! The container carries skeleton data as opaque 0x80-byte bone records. They
//! come either from a raw dump or extracted out of an existing model file.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::RigFormat;
use crate::container::builder::BONE_RECORD_SIZE;
use crate::error::{GnoError, Result};

/// Load the bone blob for the exported model.
pub fn load_rig(path: &Path, format: RigFormat) -> Result<Vec<u8>> {
    let bytes = fs::read(path)?;
    let blob = match format {
        RigFormat::Raw => bytes,
        RigFormat::Gno => extract_bone_blob(&bytes)?,
    };

    if blob.is_empty() || blob.len() % BONE_RECORD_SIZE != 0 {
        return Err(GnoError::Rig(format!(
            "rig {} holds {:#x} bytes, not a positive multiple of {BONE_RECORD_SIZE:#x}",
            path.display(),
            blob.len()
        )));
    }

    info!(
        path = %path.display(),
        bones = blob.len() / BONE_RECORD_SIZE,
        "rig loaded"
    );
    Ok(blob)
}

/// Pull the bone records out of an existing container file.
///
/// Walks to the object chunk named by the info header, follows the object
/// record to its bone table, and copies `bone_count * 0x80` bytes.
pub fn extract_bone_blob(bytes: &[u8]) -> Result<Vec<u8>> {
    let ngob_chunk_index = read_u32_be(bytes, 0x8)? as usize;

    // Chunk sizes are little-endian; skip chunks up to the object chunk.
    let mut at = 0usize;
    for _ in 0..ngob_chunk_index {
        let size = read_u32_le(bytes, at + 4)? as usize;
        at += 8 + size;
    }

    let object_offset = read_u32_be(bytes, at + 8)? as usize;
    // Object record offsets are body-relative; the file carries a 0x20-byte
    // info header in front of the body.
    let record = object_offset + 0x20;

    let bone_count = read_u32_be(bytes, record + 0x28)? as usize;
    let bone_offset = read_u32_be(bytes, record + 0x30)? as usize;

    let start = bone_offset + 0x20;
    let end = start + bone_count * BONE_RECORD_SIZE;
    bytes
        .get(start..end)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| {
            GnoError::Rig(format!(
                "bone table {start:#x}..{end:#x} lies outside the {:#x}-byte file",
                bytes.len()
            ))
        })
}

fn read_u32_be(bytes: &[u8], at: usize) -> Result<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_be_bytes(b.try_into().unwrap_or_default()))
        .ok_or_else(|| GnoError::Rig(format!("file truncated at {at:#x}")))
}

fn read_u32_le(bytes: &[u8], at: usize) -> Result<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes(b.try_into().unwrap_or_default()))
        .ok_or_else(|| GnoError::Rig(format!("file truncated at {at:#x}")))
}
