//! Prelude module for convenient imports

pub use crate::client::{
    Completion, ConnectionState, EventStream, RecordStream, SimClient, SimulatorInfo,
    VariableStream,
};
pub use crate::config::{ClientConfig, SubscriptionOptions};
pub use crate::consumers::EventNotification;
pub use crate::error::{ClientError, ClientResult, TransportError, TransportResult};
pub use crate::mapping::{FromRecord, MappedRecord, RecordMapping};
pub use crate::memory::MemoryTransport;
pub use crate::stats::DispatchStatsSnapshot;
pub use crate::transport::{RequestPeriod, TextColor, TextKind, Transport};

pub use simlink_protocol::prelude::*;
