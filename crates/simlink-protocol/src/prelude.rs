//! Prelude module for convenient imports

pub use crate::codec::{
    LatLonAlt, Xyz, decode_bool, decode_degrees, decode_f64, decode_i32, decode_string,
    encode_degrees, encode_f64, encode_i32, encode_string,
};
pub use crate::datum::{DatumKind, size_of};
pub use crate::error::{ProtocolError, ProtocolResult};
pub use crate::ids::{DefineId, EventId, ObjectId};
pub use crate::record::{
    EventFilenameRecord, EventRecord, ExceptionCode, ExceptionRecord, Notification, OpenRecord,
    RecordHeader, RecordKind, SimObjectDataRecord, Version4, encode_empty,
};
pub use crate::schema::{
    DecodeError, DecodedVariable, DefineSet, SimValue, VariableDescriptor, decode_batch,
};
