//! In-memory chunk writer with relocation tracking.
//!
//! The container mixes endiannesses: chunk tags and chunk size fields are
//! little-endian, payloads are big-endian. Every pointer field written through
//! [`ChunkWriter::write_offset`] is recorded so the offset table chunk can be
//! emitted at the end, in write order.

/// Byte buffer with position-tracked writes and a relocation list.
#[derive(Debug, Default)]
pub struct ChunkWriter {
    buf: Vec<u8>,
    relocations: Vec<u32>,
}

impl ChunkWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            relocations: Vec::new(),
        }
    }

    pub fn position(&self) -> u32 {
        self.buf.len() as u32
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn relocations(&self) -> &[u32] {
        &self.relocations
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Chunk tags go out in byte order, unaffected by endianness.
    pub fn write_tag(&mut self, tag: &[u8; 4]) {
        self.buf.extend_from_slice(tag);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.buf.push(v as u8);
    }

    pub fn write_u16_be(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_i16_be(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u32_be(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_i32_be(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u32_le(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f32_be(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn pad(&mut self, count: usize) {
        self.buf.resize(self.buf.len() + count, 0);
    }

    /// Zero-fill up to a 4-byte boundary.
    pub fn align4(&mut self) {
        while self.buf.len() & 0x3 != 0 {
            self.buf.push(0);
        }
    }

    /// Zero-fill up to a 32-byte boundary.
    pub fn align32(&mut self) {
        while self.buf.len() & 0x1F != 0 {
            self.buf.push(0);
        }
    }

    /// Write a pointer field: the field's own position joins the relocation
    /// list, the value is the body-relative target.
    pub fn write_offset(&mut self, target: u32) {
        self.relocations.push(self.position());
        self.write_u32_be(target);
    }
}

/// Round up to a 32-byte boundary.
pub fn align32(value: u32) -> u32 {
    (value + 0x1F) & !0x1F
}
