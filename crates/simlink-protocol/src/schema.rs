//! Variable descriptors, define sets and schema-driven batch slicing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{
    self, LatLonAlt, Xyz, decode_bool, decode_degrees, decode_f32, decode_f64, decode_i32,
    decode_i64,
};
use crate::datum::{DatumKind, size_of};
use crate::error::ProtocolResult;
use crate::ids::DefineId;

/// Identity of one simulation variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableDescriptor {
    /// Simulator variable name, e.g. `PLANE ALTITUDE`
    pub name: String,
    /// Unit string; also selects the wire width
    pub unit: String,
    /// Whether the simulator accepts writes to this variable
    pub settable: bool,
}

impl VariableDescriptor {
    /// Create a read-only descriptor
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            settable: false,
        }
    }

    /// Create a descriptor that accepts writes
    pub fn settable(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            settable: true,
            ..Self::new(name, unit)
        }
    }

    /// Datum kind implied by the unit
    pub fn datum_kind(&self) -> DatumKind {
        DatumKind::from_unit(&self.unit)
    }

    /// Wire width implied by the unit; 0 when unsized
    pub fn size(&self) -> usize {
        size_of(&self.unit)
    }
}

/// Ordered, immutable list of descriptors registered under one definition.
///
/// Position in the list is the contract for where each variable's field sits
/// in a data notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineSet {
    id: DefineId,
    variables: Vec<VariableDescriptor>,
}

impl DefineSet {
    /// Create a define set
    pub fn new(id: DefineId, variables: Vec<VariableDescriptor>) -> Self {
        Self { id, variables }
    }

    /// Definition handle
    pub fn id(&self) -> DefineId {
        self.id
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the set holds no variables
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Variables in registration order
    pub fn variables(&self) -> &[VariableDescriptor] {
        &self.variables
    }

    /// Total payload width, or `None` if any variable is unsized
    pub fn payload_size(&self) -> Option<usize> {
        self.variables
            .iter()
            .map(|v| v.datum_kind().size())
            .try_fold(0usize, |acc, size| acc.checked_add(size?))
    }
}

/// One variable sliced out of a data notification.
///
/// `data` has exactly the width of the descriptor's datum kind; the typed
/// accessors decode it on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedVariable {
    /// Descriptor the slice belongs to
    pub descriptor: VariableDescriptor,
    /// Raw little-endian field
    pub data: Vec<u8>,
}

/// A decoded value of any datum kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimValue {
    /// Integer kinds
    Int(i64),
    /// Float kinds
    Float(f64),
    /// String kinds
    Text(String),
    /// Position triple
    LatLonAlt(LatLonAlt),
    /// Vector triple
    Xyz(Xyz),
}

impl DecodedVariable {
    /// Variable name
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Unit string
    pub fn unit(&self) -> &str {
        &self.descriptor.unit
    }

    /// Decode as a 64-bit float
    pub fn as_f64(&self) -> ProtocolResult<f64> {
        decode_f64(&self.data)
    }

    /// Decode a radian value and convert it to degrees
    pub fn as_degrees(&self) -> ProtocolResult<f64> {
        decode_degrees(&self.data)
    }

    /// Decode as a 32-bit integer
    pub fn as_i32(&self) -> ProtocolResult<i32> {
        decode_i32(&self.data)
    }

    /// Decode as a boolean
    pub fn as_bool(&self) -> ProtocolResult<bool> {
        decode_bool(&self.data)
    }

    /// Decode as a null-terminated string
    pub fn as_string(&self) -> String {
        codec::decode_string(&self.data)
    }

    /// Decode as a latitude/longitude/altitude triple
    pub fn as_lat_lon_alt(&self) -> ProtocolResult<LatLonAlt> {
        LatLonAlt::decode(&self.data)
    }

    /// Decode as an X/Y/Z triple
    pub fn as_xyz(&self) -> ProtocolResult<Xyz> {
        Xyz::decode(&self.data)
    }

    /// Decode according to the descriptor's datum kind
    pub fn value(&self) -> ProtocolResult<SimValue> {
        let kind = self.descriptor.datum_kind();
        Ok(match kind {
            DatumKind::Int32 => SimValue::Int(i64::from(decode_i32(&self.data)?)),
            DatumKind::Int64 => SimValue::Int(decode_i64(&self.data)?),
            DatumKind::Float32 => SimValue::Float(f64::from(decode_f32(&self.data)?)),
            DatumKind::Float64 => SimValue::Float(decode_f64(&self.data)?),
            DatumKind::LatLonAlt => SimValue::LatLonAlt(LatLonAlt::decode(&self.data)?),
            DatumKind::Xyz => SimValue::Xyz(Xyz::decode(&self.data)?),
            _ => SimValue::Text(self.as_string()),
        })
    }
}

/// Why a data notification could not be turned into a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Reported variable count differs from the registered set
    #[error("Definition has {expected} variables but notification reports {reported}")]
    CountMismatch {
        /// Registered length
        expected: usize,
        /// Count carried by the notification
        reported: u32,
    },

    /// A variable's unit has no fixed width, so later offsets are unknowable
    #[error("Variable {index} ({name}) has unsized unit {unit:?}")]
    Unsized {
        /// Position in the set
        index: usize,
        /// Variable name
        name: String,
        /// Offending unit
        unit: String,
    },

    /// The payload ends inside a variable's field
    #[error("Variable {index} ({name}) needs bytes up to {needed}, payload has {available}")]
    Truncated {
        /// Position in the set
        index: usize,
        /// Variable name
        name: String,
        /// End offset the variable needs
        needed: usize,
        /// Payload length
        available: usize,
    },
}

/// Slice a data payload into one [`DecodedVariable`] per descriptor.
///
/// Fields are consumed sequentially in registration order. The whole batch is
/// rejected on a count mismatch, on the first unsized variable, or on the
/// first field that would run past the payload; a partial batch is never
/// returned.
pub fn decode_batch(
    set: &DefineSet,
    define_count: u32,
    payload: &[u8],
) -> Result<Vec<DecodedVariable>, DecodeError> {
    if usize::try_from(define_count).ok() != Some(set.len()) {
        return Err(DecodeError::CountMismatch {
            expected: set.len(),
            reported: define_count,
        });
    }

    let mut batch = Vec::with_capacity(set.len());
    let mut offset = 0usize;
    for (index, descriptor) in set.variables().iter().enumerate() {
        let size = descriptor.size();
        if size == 0 {
            return Err(DecodeError::Unsized {
                index,
                name: descriptor.name.clone(),
                unit: descriptor.unit.clone(),
            });
        }
        let end = offset.saturating_add(size);
        let Some(field) = payload.get(offset..end) else {
            return Err(DecodeError::Truncated {
                index,
                name: descriptor.name.clone(),
                needed: end,
                available: payload.len(),
            });
        };
        batch.push(DecodedVariable {
            descriptor: descriptor.clone(),
            data: field.to_vec(),
        });
        offset = end;
    }
    Ok(batch)
}
