//! Datum kinds and the unit-to-width table.
//!
//! The simulator lays out a data notification as the concatenation of one
//! fixed-width field per registered variable. The width of each field follows
//! from the variable's unit string, which this module maps onto a
//! [`DatumKind`].

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Wire representation of a single variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatumKind {
    /// 32-bit signed integer (booleans travel as this)
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit float
    Float32,
    /// 64-bit float, the default for numeric units
    Float64,
    /// 8-byte null-terminated string
    String8,
    /// 32-byte null-terminated string
    String32,
    /// 64-byte null-terminated string
    String64,
    /// 128-byte null-terminated string
    String128,
    /// 256-byte null-terminated string
    String256,
    /// 260-byte null-terminated string
    String260,
    /// Variable-length string; has no fixed width
    StringV,
    /// Latitude/longitude/altitude triple of 64-bit floats
    LatLonAlt,
    /// X/Y/Z triple of 64-bit floats
    Xyz,
}

impl DatumKind {
    /// Map a unit string onto its datum kind.
    ///
    /// Booleans are 32-bit integers, `StringN` names a fixed string class,
    /// the two composite structure names select their triples, and every
    /// other unit is a 64-bit float.
    pub fn from_unit(unit: &str) -> Self {
        let unit = unit.trim();
        if unit.eq_ignore_ascii_case("bool") || unit.eq_ignore_ascii_case("boolean") {
            return DatumKind::Int32;
        }
        if unit.eq_ignore_ascii_case("SIMCONNECT_DATA_LATLONALT") {
            return DatumKind::LatLonAlt;
        }
        if unit.eq_ignore_ascii_case("SIMCONNECT_DATA_XYZ") {
            return DatumKind::Xyz;
        }
        match unit.to_ascii_lowercase().as_str() {
            "string8" => DatumKind::String8,
            "string32" => DatumKind::String32,
            "string64" => DatumKind::String64,
            "string128" => DatumKind::String128,
            "string256" => DatumKind::String256,
            "string260" => DatumKind::String260,
            "string" | "stringv" | "variable length string" => DatumKind::StringV,
            _ => DatumKind::Float64,
        }
    }

    /// Fixed wire width in bytes, or `None` for variable-length kinds.
    pub fn size(self) -> Option<usize> {
        match self {
            DatumKind::Int32 | DatumKind::Float32 => Some(4),
            DatumKind::Int64 | DatumKind::Float64 | DatumKind::String8 => Some(8),
            DatumKind::String32 => Some(32),
            DatumKind::String64 => Some(64),
            DatumKind::String128 => Some(128),
            DatumKind::String256 => Some(256),
            DatumKind::String260 => Some(260),
            DatumKind::LatLonAlt | DatumKind::Xyz => Some(24),
            DatumKind::StringV => None,
        }
    }

    /// Numeric datum type code sent with a data definition entry.
    pub fn wire_code(self) -> u32 {
        match self {
            DatumKind::Int32 => 1,
            DatumKind::Int64 => 2,
            DatumKind::Float32 => 3,
            DatumKind::Float64 => 4,
            DatumKind::String8 => 5,
            DatumKind::String32 => 6,
            DatumKind::String64 => 7,
            DatumKind::String128 => 8,
            DatumKind::String256 => 9,
            DatumKind::String260 => 10,
            DatumKind::StringV => 11,
            DatumKind::LatLonAlt => 15,
            DatumKind::Xyz => 16,
        }
    }

    /// Whether values of this kind decode as text.
    pub fn is_string(self) -> bool {
        matches!(
            self,
            DatumKind::String8
                | DatumKind::String32
                | DatumKind::String64
                | DatumKind::String128
                | DatumKind::String256
                | DatumKind::String260
                | DatumKind::StringV
        )
    }

    /// Short lowercase name used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            DatumKind::Int32 => "int32",
            DatumKind::Int64 => "int64",
            DatumKind::Float32 => "float32",
            DatumKind::Float64 => "float64",
            DatumKind::String8 => "string8",
            DatumKind::String32 => "string32",
            DatumKind::String64 => "string64",
            DatumKind::String128 => "string128",
            DatumKind::String256 => "string256",
            DatumKind::String260 => "string260",
            DatumKind::StringV => "stringv",
            DatumKind::LatLonAlt => "latlonalt",
            DatumKind::Xyz => "xyz",
        }
    }
}

/// Wire width for a unit string.
///
/// Unsized units are logged and yield 0; callers must treat a zero width as
/// "cannot slice this variable".
pub fn size_of(unit: &str) -> usize {
    let kind = DatumKind::from_unit(unit);
    match kind.size() {
        Some(size) => size,
        None => {
            warn!(unit, kind = kind.name(), "Unknown size for unit");
            0
        }
    }
}
