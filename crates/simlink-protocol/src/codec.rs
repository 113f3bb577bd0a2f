//! Variable codec: typed values to and from their little-endian wire form.
//!
//! Every decoder takes the exact slice belonging to one variable. Float writes
//! always produce eight bytes; the write path registers its definition as a
//! 64-bit float so the simulator converts on its side.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

fn fixed<const N: usize>(bytes: &[u8], kind: &'static str) -> ProtocolResult<[u8; N]> {
    <[u8; N]>::try_from(bytes)
        .ok()
        .ok_or_else(|| ProtocolError::size_mismatch(kind, N, bytes.len()))
}

pub(crate) fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset.checked_add(4)?)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
}

fn read_f64_le(data: &[u8], offset: usize) -> Option<f64> {
    data.get(offset..offset.checked_add(8)?)
        .and_then(|b| b.try_into().ok())
        .map(f64::from_le_bytes)
}

/// Encode a 64-bit float.
pub fn encode_f64(value: f64) -> [u8; 8] {
    value.to_le_bytes()
}

/// Decode a 64-bit float from an 8-byte slice.
pub fn decode_f64(bytes: &[u8]) -> ProtocolResult<f64> {
    fixed::<8>(bytes, "float64").map(f64::from_le_bytes)
}

/// Decode a 32-bit float from a 4-byte slice.
pub fn decode_f32(bytes: &[u8]) -> ProtocolResult<f32> {
    fixed::<4>(bytes, "float32").map(f32::from_le_bytes)
}

/// Encode an angle given in degrees as radians.
pub fn encode_degrees(degrees: f64) -> [u8; 8] {
    encode_f64(degrees.to_radians())
}

/// Decode an angle transmitted in radians and return degrees.
pub fn decode_degrees(bytes: &[u8]) -> ProtocolResult<f64> {
    decode_f64(bytes).map(f64::to_degrees)
}

/// Encode a 32-bit signed integer.
pub fn encode_i32(value: i32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Decode a 32-bit signed integer.
pub fn decode_i32(bytes: &[u8]) -> ProtocolResult<i32> {
    fixed::<4>(bytes, "int32").map(i32::from_le_bytes)
}

/// Decode a 64-bit signed integer.
pub fn decode_i64(bytes: &[u8]) -> ProtocolResult<i64> {
    fixed::<8>(bytes, "int64").map(i64::from_le_bytes)
}

/// Decode a boolean carried as a 32-bit integer; any non-zero value is true.
pub fn decode_bool(bytes: &[u8]) -> ProtocolResult<bool> {
    decode_i32(bytes).map(|v| v != 0)
}

/// Encode a string into a zero-padded field of `width` bytes.
///
/// The field always keeps room for the terminating null.
pub fn encode_string(value: &str, width: usize) -> ProtocolResult<Vec<u8>> {
    let raw = value.as_bytes();
    if raw.len() >= width {
        return Err(ProtocolError::StringTooLong {
            len: raw.len().saturating_add(1),
            width,
        });
    }
    let mut field = vec![0u8; width];
    if let Some(dst) = field.get_mut(..raw.len()) {
        dst.copy_from_slice(raw);
    }
    Ok(field)
}

/// Decode a null-terminated string.
///
/// Stops at the first null byte or the end of the slice, whichever comes
/// first. Invalid UTF-8 is replaced rather than rejected.
pub fn decode_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = bytes.get(..end).unwrap_or_default();
    String::from_utf8_lossy(text).into_owned()
}

/// Latitude/longitude/altitude triple.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLonAlt {
    /// Latitude, degrees
    pub latitude: f64,
    /// Longitude, degrees
    pub longitude: f64,
    /// Altitude, meters
    pub altitude: f64,
}

impl LatLonAlt {
    /// Wire size in bytes
    pub const SIZE: usize = 24;

    /// Create a new position
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Encode to the wire layout
    pub fn encode(&self) -> [u8; Self::SIZE] {
        encode_triple(self.latitude, self.longitude, self.altitude)
    }

    /// Decode from a 24-byte slice
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let (latitude, longitude, altitude) = decode_triple(bytes, "latlonalt")?;
        Ok(Self {
            latitude,
            longitude,
            altitude,
        })
    }
}

/// X/Y/Z triple.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Xyz {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Xyz {
    /// Wire size in bytes
    pub const SIZE: usize = 24;

    /// Create a new vector
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Encode to the wire layout
    pub fn encode(&self) -> [u8; Self::SIZE] {
        encode_triple(self.x, self.y, self.z)
    }

    /// Decode from a 24-byte slice
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let (x, y, z) = decode_triple(bytes, "xyz")?;
        Ok(Self { x, y, z })
    }
}

fn encode_triple(a: f64, b: f64, c: f64) -> [u8; 24] {
    let mut buffer = [0u8; 24];
    for (chunk, value) in buffer.chunks_exact_mut(8).zip([a, b, c]) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    buffer
}

fn decode_triple(bytes: &[u8], kind: &'static str) -> ProtocolResult<(f64, f64, f64)> {
    if bytes.len() != 24 {
        return Err(ProtocolError::size_mismatch(kind, 24, bytes.len()));
    }
    match (
        read_f64_le(bytes, 0),
        read_f64_le(bytes, 8),
        read_f64_le(bytes, 16),
    ) {
        (Some(a), Some(b), Some(c)) => Ok((a, b, c)),
        _ => Err(ProtocolError::size_mismatch(kind, 24, bytes.len())),
    }
}
