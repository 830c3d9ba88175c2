//! Fixed-point quantizers for the GameCube vertex attribute formats.
//!
//! Normals are signed 1.6 fixed point in a byte, UVs signed 8.8 in a short
//! with the V axis flipped into texture space, weights unsigned 2.14.

/// One normal component: `round(n * 64)`, clamped to the i8 range.
pub fn quantize_normal(n: f32) -> i8 {
    (n * 64.0).round().clamp(i8::MIN as f32, i8::MAX as f32) as i8
}

pub fn quantize_normal3(n: [f32; 3]) -> [i8; 3] {
    [
        quantize_normal(n[0]),
        quantize_normal(n[1]),
        quantize_normal(n[2]),
    ]
}

/// One UV pair. U maps directly, V is flipped (`1 - v`) into the top-down
/// texture convention before scaling by 256.
pub fn quantize_uv(uv: [f32; 2]) -> [i16; 2] {
    let u = (uv[0] * 256.0).round();
    let v = (-(uv[1] - 1.0) * 256.0).round();
    [
        u.clamp(i16::MIN as f32, i16::MAX as f32) as i16,
        v.clamp(i16::MIN as f32, i16::MAX as f32) as i16,
    ]
}

/// A bone weight in `[0, 1]`: `round(w * 16384)`.
pub fn quantize_weight(w: f32) -> u16 {
    (w * 16384.0).round().clamp(0.0, u16::MAX as f32) as u16
}
