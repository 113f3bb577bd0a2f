//! Wire vocabulary for the simlink flight-simulator client.
//!
//! This crate owns everything that can be decided from bytes alone, with no
//! connection state:
//!
//! - [`ids`]: definition, event and object handles
//! - [`record`]: the record header and the tagged-union [`Notification`] parser,
//!   plus encoders for every record kind
//! - [`datum`]: datum kinds and the unit-to-width table
//! - [`codec`]: typed values to and from their little-endian wire form
//! - [`schema`]: variable descriptors, define sets and batch slicing
//! - [`error`]: protocol error types
//!
//! # Example
//!
//! ```
//! use simlink_protocol::prelude::*;
//!
//! let set = DefineSet::new(DefineId(0), vec![VariableDescriptor::new("PLANE ALTITUDE", "Feet")]);
//! let payload = encode_f64(10000.0);
//! let record = SimObjectDataRecord {
//!     request_id: 0,
//!     object_id: ObjectId::USER,
//!     define_id: DefineId(0),
//!     flags: 0,
//!     entry_number: 0,
//!     out_of: 0,
//!     define_count: 1,
//!     data: &payload,
//! };
//! let bytes = record.encode();
//!
//! if let Ok(Notification::SimObjectData(data)) = Notification::parse(&bytes) {
//!     let batch = decode_batch(&set, data.define_count, data.data).unwrap_or_default();
//!     assert_eq!(batch.len(), 1);
//! }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod codec;
pub mod datum;
pub mod error;
pub mod ids;
pub mod prelude;
pub mod record;
pub mod schema;

pub use codec::{LatLonAlt, Xyz};
pub use datum::{DatumKind, size_of};
pub use error::{ProtocolError, ProtocolResult};
pub use ids::{DefineId, EventId, ObjectId};
pub use record::{
    EventFilenameRecord, EventRecord, ExceptionCode, ExceptionRecord, Notification, OpenRecord,
    RecordHeader, RecordKind, SimObjectDataRecord, Version4,
};
pub use schema::{
    DecodeError, DecodedVariable, DefineSet, SimValue, VariableDescriptor, decode_batch,
};
