//! Notification records.
//!
//! Every notification starts with a 12-byte [`RecordHeader`] whose `kind`
//! selects the fixed layout that follows. [`Notification::parse`] reads the
//! header first and then extracts the variant's fields by explicit offset from
//! the same buffer; nothing is reinterpreted in place.
//!
//! Each record type also has an `encode` method producing the exact bytes the
//! simulator would send, which transports and tests use to synthesize traffic.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{decode_string, read_u32_le};
use crate::error::{ProtocolError, ProtocolResult};
use crate::ids::{DefineId, EventId, ObjectId};

/// Version stamped into encoded record headers.
pub const RECORD_VERSION: u32 = 4;

/// Width of the application name field in an open record.
pub const APPLICATION_NAME_LEN: usize = 256;

/// Width of the file name field in a filename event record.
pub const FILENAME_LEN: usize = 260;

/// Record-kind discriminant at the start of every notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Nothing pending
    Null,
    /// The simulator rejected an earlier command
    Exception,
    /// The connection was accepted
    Open,
    /// The simulator is shutting down
    Quit,
    /// A subscribed or transmitted event fired
    Event,
    /// A simulation object was added or removed
    EventObjectAddRemove,
    /// An event carrying a file name
    EventFilename,
    /// A per-frame event
    EventFrame,
    /// Variable data for one object
    SimObjectData,
    /// Variable data for objects selected by type
    SimObjectDataByType,
    /// Any other tag; ignored by the client
    Unrecognized(u32),
}

impl RecordKind {
    /// Decode a raw tag
    pub fn from_u32(raw: u32) -> Self {
        match raw {
            0 => RecordKind::Null,
            1 => RecordKind::Exception,
            2 => RecordKind::Open,
            3 => RecordKind::Quit,
            4 => RecordKind::Event,
            5 => RecordKind::EventObjectAddRemove,
            6 => RecordKind::EventFilename,
            7 => RecordKind::EventFrame,
            8 => RecordKind::SimObjectData,
            9 => RecordKind::SimObjectDataByType,
            other => RecordKind::Unrecognized(other),
        }
    }

    /// Raw tag value
    pub fn as_u32(self) -> u32 {
        match self {
            RecordKind::Null => 0,
            RecordKind::Exception => 1,
            RecordKind::Open => 2,
            RecordKind::Quit => 3,
            RecordKind::Event => 4,
            RecordKind::EventObjectAddRemove => 5,
            RecordKind::EventFilename => 6,
            RecordKind::EventFrame => 7,
            RecordKind::SimObjectData => 8,
            RecordKind::SimObjectDataByType => 9,
            RecordKind::Unrecognized(raw) => raw,
        }
    }
}

/// Common header of every notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Reported record length in bytes, header included
    pub size: u32,
    /// Protocol version of the sender
    pub version: u32,
    /// Record kind
    pub kind: RecordKind,
}

impl RecordHeader {
    /// Header size in bytes
    pub const SIZE: usize = 12;

    /// Create a header for a record of `size` total bytes
    pub fn new(kind: RecordKind, size: u32) -> Self {
        Self {
            size,
            version: RECORD_VERSION,
            kind,
        }
    }

    /// Encode the header to bytes
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buffer = [0u8; Self::SIZE];
        for (chunk, value) in buffer
            .chunks_exact_mut(4)
            .zip([self.size, self.version, self.kind.as_u32()])
        {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        buffer
    }

    /// Decode a header from bytes
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        match (
            read_u32_le(bytes, 0),
            read_u32_le(bytes, 4),
            read_u32_le(bytes, 8),
        ) {
            (Some(size), Some(version), Some(kind)) => Ok(Self {
                size,
                version,
                kind: RecordKind::from_u32(kind),
            }),
            _ => Err(ProtocolError::truncated(
                "record header",
                Self::SIZE,
                bytes.len(),
            )),
        }
    }
}

/// Reads consecutive little-endian fields after the header.
struct FieldReader<'a> {
    record: &'static str,
    data: &'a [u8],
    offset: usize,
}

impl<'a> FieldReader<'a> {
    fn new(record: &'static str, data: &'a [u8]) -> Self {
        Self {
            record,
            data,
            offset: RecordHeader::SIZE,
        }
    }

    fn u32(&mut self) -> ProtocolResult<u32> {
        let value = read_u32_le(self.data, self.offset).ok_or_else(|| {
            ProtocolError::truncated(self.record, self.offset.saturating_add(4), self.data.len())
        })?;
        self.offset = self.offset.saturating_add(4);
        Ok(value)
    }

    fn bytes(&mut self, len: usize) -> ProtocolResult<&'a [u8]> {
        let end = self.offset.saturating_add(len);
        let slice = self
            .data
            .get(self.offset..end)
            .ok_or_else(|| ProtocolError::truncated(self.record, end, self.data.len()))?;
        self.offset = end;
        Ok(slice)
    }

    fn rest(&self) -> &'a [u8] {
        self.data.get(self.offset..).unwrap_or_default()
    }
}

/// Builds an encoded record: header placeholder, fields, then size patch.
struct RecordWriter {
    buffer: Vec<u8>,
}

impl RecordWriter {
    fn new(kind: RecordKind) -> Self {
        let mut buffer = Vec::with_capacity(64);
        buffer.extend_from_slice(&RecordHeader::new(kind, 0).encode());
        Self { buffer }
    }

    fn u32(mut self, value: u32) -> Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    fn fixed_str(mut self, value: &str, width: usize) -> Self {
        let mut field = vec![0u8; width];
        let raw = value.as_bytes();
        let len = raw.len().min(width.saturating_sub(1));
        if let (Some(dst), Some(src)) = (field.get_mut(..len), raw.get(..len)) {
            dst.copy_from_slice(src);
        }
        self.buffer.extend_from_slice(&field);
        self
    }

    fn bytes(mut self, value: &[u8]) -> Self {
        self.buffer.extend_from_slice(value);
        self
    }

    fn finish(mut self) -> Vec<u8> {
        let size = u32::try_from(self.buffer.len()).unwrap_or(u32::MAX);
        if let Some(dst) = self.buffer.get_mut(0..4) {
            dst.copy_from_slice(&size.to_le_bytes());
        }
        self.buffer
    }
}

/// Four-part version number reported in an open record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Version4 {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Build major
    pub build_major: u32,
    /// Build minor
    pub build_minor: u32,
}

impl fmt::Display for Version4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build_major, self.build_minor
        )
    }
}

/// Connection accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRecord {
    /// Simulator application name
    pub application_name: String,
    /// Simulator application version
    pub application_version: Version4,
    /// Version of the simulator's client interface
    pub interface_version: Version4,
}

impl OpenRecord {
    fn parse(data: &[u8]) -> ProtocolResult<Self> {
        let mut reader = FieldReader::new("open", data);
        let application_name = decode_string(reader.bytes(APPLICATION_NAME_LEN)?);
        let application_version = Version4 {
            major: reader.u32()?,
            minor: reader.u32()?,
            build_major: reader.u32()?,
            build_minor: reader.u32()?,
        };
        let interface_version = Version4 {
            major: reader.u32()?,
            minor: reader.u32()?,
            build_major: reader.u32()?,
            build_minor: reader.u32()?,
        };
        Ok(Self {
            application_name,
            application_version,
            interface_version,
        })
    }

    /// Encode to wire bytes
    pub fn encode(&self) -> Vec<u8> {
        let app = self.application_version;
        let iface = self.interface_version;
        RecordWriter::new(RecordKind::Open)
            .fixed_str(&self.application_name, APPLICATION_NAME_LEN)
            .u32(app.major)
            .u32(app.minor)
            .u32(app.build_major)
            .u32(app.build_minor)
            .u32(iface.major)
            .u32(iface.minor)
            .u32(iface.build_major)
            .u32(iface.build_minor)
            .u32(0)
            .u32(0)
            .finish()
    }
}

/// A subscribed or transmitted event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Notification group the event belongs to
    pub group_id: u32,
    /// Client event handle
    pub event_id: EventId,
    /// Event parameter
    pub data: u32,
}

impl EventRecord {
    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            group_id: reader.u32()?,
            event_id: EventId(reader.u32()?),
            data: reader.u32()?,
        })
    }

    /// Encode to wire bytes
    pub fn encode(&self) -> Vec<u8> {
        self.write(RecordWriter::new(RecordKind::Event)).finish()
    }

    fn write(&self, writer: RecordWriter) -> RecordWriter {
        writer
            .u32(self.group_id)
            .u32(self.event_id.0)
            .u32(self.data)
    }
}

/// An event that carries a file name (flight or aircraft loaded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilenameRecord {
    /// Event fields
    pub event: EventRecord,
    /// Decoded file name
    pub filename: String,
    /// Reserved flags
    pub flags: u32,
}

impl EventFilenameRecord {
    /// Encode to wire bytes
    pub fn encode(&self) -> Vec<u8> {
        self.event
            .write(RecordWriter::new(RecordKind::EventFilename))
            .fixed_str(&self.filename, FILENAME_LEN)
            .u32(self.flags)
            .finish()
    }
}

/// Code carried by an exception record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExceptionCode(pub u32);

const EXCEPTION_NAMES: &[&str] = &[
    "NONE",
    "ERROR",
    "SIZE_MISMATCH",
    "UNRECOGNIZED_ID",
    "UNOPENED",
    "VERSION_MISMATCH",
    "TOO_MANY_GROUPS",
    "NAME_UNRECOGNIZED",
    "TOO_MANY_EVENT_NAMES",
    "EVENT_ID_DUPLICATE",
    "TOO_MANY_MAPS",
    "TOO_MANY_OBJECTS",
    "TOO_MANY_REQUESTS",
    "WEATHER_INVALID_PORT",
    "WEATHER_INVALID_METAR",
    "WEATHER_UNABLE_TO_GET_OBSERVATION",
    "WEATHER_UNABLE_TO_CREATE_STATION",
    "WEATHER_UNABLE_TO_REMOVE_STATION",
    "INVALID_DATA_TYPE",
    "INVALID_DATA_SIZE",
    "DATA_ERROR",
    "INVALID_ARRAY",
    "CREATE_OBJECT_FAILED",
    "LOAD_FLIGHTPLAN_FAILED",
    "OPERATION_INVALID_FOR_OBJECT_TYPE",
    "ILLEGAL_OPERATION",
    "ALREADY_SUBSCRIBED",
    "INVALID_ENUM",
    "DEFINITION_ERROR",
    "DUPLICATE_ID",
    "DATUM_ID",
    "OUT_OF_BOUNDS",
    "ALREADY_CREATED",
    "OBJECT_OUTSIDE_REALITY_BUBBLE",
    "OBJECT_CONTAINER",
    "OBJECT_AI",
    "OBJECT_ATC",
    "OBJECT_SCHEDULE",
];

impl ExceptionCode {
    /// Simulator name of this code, or `UNKNOWN`
    pub fn name(self) -> &'static str {
        EXCEPTION_NAMES
            .get(self.0 as usize)
            .copied()
            .unwrap_or("UNKNOWN")
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

/// The simulator rejected an earlier command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionRecord {
    /// Exception code
    pub exception: ExceptionCode,
    /// Send identifier of the offending command
    pub send_id: u32,
    /// Index of the offending parameter, if known
    pub index: u32,
}

impl ExceptionRecord {
    /// Encode to wire bytes
    pub fn encode(&self) -> Vec<u8> {
        RecordWriter::new(RecordKind::Exception)
            .u32(self.exception.0)
            .u32(self.send_id)
            .u32(self.index)
            .finish()
    }
}

/// Variable data for one request.
///
/// `data` borrows the data area of the notification, bounded by the reported
/// record length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimObjectDataRecord<'a> {
    /// Request the data answers
    pub request_id: u32,
    /// Object the data describes
    pub object_id: ObjectId,
    /// Definition describing the data layout
    pub define_id: DefineId,
    /// Request flags echoed back
    pub flags: u32,
    /// Entry number when answering a by-type request
    pub entry_number: u32,
    /// Entry count when answering a by-type request
    pub out_of: u32,
    /// Number of variables the simulator packed
    pub define_count: u32,
    /// Concatenated variable fields
    pub data: &'a [u8],
}

impl<'a> SimObjectDataRecord<'a> {
    /// Offset of the data area from the start of the record
    pub const DATA_OFFSET: usize = 40;

    fn parse(data: &'a [u8]) -> ProtocolResult<Self> {
        let mut reader = FieldReader::new("simobject data", data);
        Ok(Self {
            request_id: reader.u32()?,
            object_id: ObjectId(reader.u32()?),
            define_id: DefineId(reader.u32()?),
            flags: reader.u32()?,
            entry_number: reader.u32()?,
            out_of: reader.u32()?,
            define_count: reader.u32()?,
            data: reader.rest(),
        })
    }

    /// Encode as a single-object data record
    pub fn encode(&self) -> Vec<u8> {
        self.encode_as(RecordKind::SimObjectData)
    }

    /// Encode as a by-type data record
    pub fn encode_by_type(&self) -> Vec<u8> {
        self.encode_as(RecordKind::SimObjectDataByType)
    }

    fn encode_as(&self, kind: RecordKind) -> Vec<u8> {
        RecordWriter::new(kind)
            .u32(self.request_id)
            .u32(self.object_id.0)
            .u32(self.define_id.0)
            .u32(self.flags)
            .u32(self.entry_number)
            .u32(self.out_of)
            .u32(self.define_count)
            .bytes(self.data)
            .finish()
    }
}

/// One decoded notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<'a> {
    /// Nothing pending
    Null,
    /// Connection accepted
    Open(OpenRecord),
    /// Simulator quitting
    Quit,
    /// Event fired
    Event(EventRecord),
    /// Event with file name fired
    EventFilename(EventFilenameRecord),
    /// Command rejected
    Exception(ExceptionRecord),
    /// Data for one object
    SimObjectData(SimObjectDataRecord<'a>),
    /// Data for an object selected by type
    SimObjectDataByType(SimObjectDataRecord<'a>),
    /// A kind the client does not handle
    Unrecognized(RecordKind),
}

impl<'a> Notification<'a> {
    /// Parse a raw notification buffer.
    ///
    /// The header's reported size bounds every read; bytes past it are
    /// ignored even when the buffer is longer.
    pub fn parse(buffer: &'a [u8]) -> ProtocolResult<Self> {
        let header = RecordHeader::decode(buffer)?;
        let reported = (header.size as usize).min(buffer.len());
        let data = buffer.get(..reported).unwrap_or(buffer);

        Ok(match header.kind {
            RecordKind::Null => Notification::Null,
            RecordKind::Open => Notification::Open(OpenRecord::parse(data)?),
            RecordKind::Quit => Notification::Quit,
            RecordKind::Event => {
                let mut reader = FieldReader::new("event", data);
                Notification::Event(EventRecord::read(&mut reader)?)
            }
            RecordKind::EventFilename => {
                let mut reader = FieldReader::new("event filename", data);
                let event = EventRecord::read(&mut reader)?;
                let filename = decode_string(reader.bytes(FILENAME_LEN)?);
                let flags = reader.u32()?;
                Notification::EventFilename(EventFilenameRecord {
                    event,
                    filename,
                    flags,
                })
            }
            RecordKind::Exception => {
                let mut reader = FieldReader::new("exception", data);
                Notification::Exception(ExceptionRecord {
                    exception: ExceptionCode(reader.u32()?),
                    send_id: reader.u32()?,
                    index: reader.u32()?,
                })
            }
            RecordKind::SimObjectData => {
                Notification::SimObjectData(SimObjectDataRecord::parse(data)?)
            }
            RecordKind::SimObjectDataByType => {
                Notification::SimObjectDataByType(SimObjectDataRecord::parse(data)?)
            }
            kind @ (RecordKind::EventObjectAddRemove
            | RecordKind::EventFrame
            | RecordKind::Unrecognized(_)) => Notification::Unrecognized(kind),
        })
    }

    /// Record kind of this notification
    pub fn kind(&self) -> RecordKind {
        match self {
            Notification::Null => RecordKind::Null,
            Notification::Open(_) => RecordKind::Open,
            Notification::Quit => RecordKind::Quit,
            Notification::Event(_) => RecordKind::Event,
            Notification::EventFilename(_) => RecordKind::EventFilename,
            Notification::Exception(_) => RecordKind::Exception,
            Notification::SimObjectData(_) => RecordKind::SimObjectData,
            Notification::SimObjectDataByType(_) => RecordKind::SimObjectDataByType,
            Notification::Unrecognized(kind) => *kind,
        }
    }
}

/// Encode a record that has no body (null, quit) or an arbitrary tag.
pub fn encode_empty(kind: RecordKind) -> Vec<u8> {
    RecordWriter::new(kind).finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_header_encode_decode() -> TestResult {
        let header = RecordHeader::new(RecordKind::SimObjectData, 48);
        let decoded = RecordHeader::decode(&header.encode())?;
        assert_eq!(decoded, header);
        Ok(())
    }

    #[test]
    fn test_header_decode_insufficient_bytes() {
        assert!(RecordHeader::decode(&[0u8; 8]).is_err());
    }

    #[test]
    fn test_kind_tags_roundtrip() {
        for raw in 0..12 {
            assert_eq!(RecordKind::from_u32(raw).as_u32(), raw);
        }
        assert_eq!(RecordKind::from_u32(42), RecordKind::Unrecognized(42));
    }

    #[test]
    fn test_parse_event() -> TestResult {
        let record = EventRecord {
            group_id: 0,
            event_id: EventId(3),
            data: 1,
        };
        let bytes = record.encode();
        assert_eq!(bytes.len(), 24);
        assert_eq!(Notification::parse(&bytes)?, Notification::Event(record));
        Ok(())
    }

    #[test]
    fn test_parse_event_filename() -> TestResult {
        let record = EventFilenameRecord {
            event: EventRecord {
                group_id: 0,
                event_id: EventId(1),
                data: 0,
            },
            filename: "SimObjects\\Airplanes\\C172\\aircraft.cfg".to_string(),
            flags: 0,
        };
        let bytes = record.encode();
        let parsed = Notification::parse(&bytes)?;
        assert_eq!(parsed, Notification::EventFilename(record));
        Ok(())
    }

    #[test]
    fn test_parse_open() -> TestResult {
        let record = OpenRecord {
            application_name: "Flight Simulator".to_string(),
            application_version: Version4 {
                major: 11,
                minor: 0,
                build_major: 282174,
                build_minor: 999,
            },
            interface_version: Version4 {
                major: 11,
                ..Version4::default()
            },
        };
        let bytes = record.encode();
        let parsed = Notification::parse(&bytes)?;
        assert_eq!(parsed, Notification::Open(record));
        Ok(())
    }

    #[test]
    fn test_parse_exception_names_code() -> TestResult {
        let record = ExceptionRecord {
            exception: ExceptionCode(7),
            send_id: 12,
            index: 1,
        };
        match Notification::parse(&record.encode())? {
            Notification::Exception(parsed) => {
                assert_eq!(parsed.exception.name(), "NAME_UNRECOGNIZED");
                assert_eq!(parsed.send_id, 12);
            }
            other => return Err(format!("unexpected {other:?}").into()),
        }
        assert_eq!(ExceptionCode(999).name(), "UNKNOWN");
        Ok(())
    }

    #[test]
    fn test_parse_simobject_data() -> TestResult {
        let payload = 10000.0f64.to_le_bytes();
        let record = SimObjectDataRecord {
            request_id: 0,
            object_id: ObjectId::USER,
            define_id: DefineId(0),
            flags: 0,
            entry_number: 1,
            out_of: 1,
            define_count: 1,
            data: &payload,
        };
        let bytes = record.encode();
        assert_eq!(bytes.len(), SimObjectDataRecord::DATA_OFFSET + 8);
        match Notification::parse(&bytes)? {
            Notification::SimObjectData(parsed) => {
                assert_eq!(parsed.define_id, DefineId(0));
                assert_eq!(parsed.data, &payload[..]);
            }
            other => return Err(format!("unexpected {other:?}").into()),
        }
        Ok(())
    }

    #[test]
    fn test_reported_size_bounds_data_area() -> TestResult {
        let payload = [7u8; 16];
        let record = SimObjectDataRecord {
            request_id: 2,
            object_id: ObjectId::USER,
            define_id: DefineId(2),
            flags: 0,
            entry_number: 0,
            out_of: 0,
            define_count: 2,
            data: &payload,
        };
        let mut bytes = record.encode_by_type();
        bytes.extend_from_slice(&[0xAA; 8]);
        match Notification::parse(&bytes)? {
            Notification::SimObjectDataByType(parsed) => assert_eq!(parsed.data.len(), 16),
            other => return Err(format!("unexpected {other:?}").into()),
        }
        Ok(())
    }

    #[test]
    fn test_truncated_event_is_error() {
        let bytes = EventRecord {
            group_id: 0,
            event_id: EventId(0),
            data: 0,
        }
        .encode();
        assert!(matches!(
            Notification::parse(&bytes[..16]),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_frame_events_are_unrecognized() -> TestResult {
        let bytes = encode_empty(RecordKind::EventFrame);
        assert_eq!(
            Notification::parse(&bytes)?,
            Notification::Unrecognized(RecordKind::EventFrame)
        );
        assert_eq!(Notification::parse(&encode_empty(RecordKind::Quit))?, Notification::Quit);
        Ok(())
    }
}
