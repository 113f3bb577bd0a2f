//! Async client for a flight simulator's telemetry and control API
//!
//! The client opens a [`Transport`], runs one background dispatch task that
//! polls it, and routes every notification to whoever asked for it.
//!
//! # Architecture
//!
//! - [`transport`]: the connection boundary and the commands sent over it
//! - [`memory`]: queue-backed transport for tests and offline use
//! - [`registry`]: define sets, keyed by dense [`DefineId`]s
//! - [`consumers`]: data channels and event callbacks
//! - [`dispatch`]: the notification loop
//! - [`client`]: the [`SimClient`] facade
//! - [`mapping`]: field-name records on top of variable batches
//! - [`config`], [`stats`], [`error`]
//!
//! # Delivery
//!
//! Data batches go to bounded channels. When a channel is full the loop waits
//! at most one poll interval and then drops the batch, so a slow consumer
//! loses data instead of stalling every other subscription.
//!
//! # Example
//!
//! ```no_run
//! use simlink_client::prelude::*;
//! use std::time::Duration;
//!
//! async fn altitude(transport: MemoryTransport) -> ClientResult<()> {
//!     let client = SimClient::connect(transport, ClientConfig::default()).await?;
//!     client.wait_until_open(Duration::from_secs(5)).await?;
//!
//!     let mut stream = client
//!         .subscribe_variables(vec![VariableDescriptor::new("PLANE ALTITUDE", "Feet")])
//!         .await?;
//!     if let Some(batch) = stream.recv().await {
//!         for variable in &batch {
//!             println!("{} = {}", variable.name(), variable.as_f64()?);
//!         }
//!     }
//!     client.close().await
//! }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod config;
pub mod consumers;
pub mod dispatch;
pub mod error;
pub mod mapping;
pub mod memory;
pub mod prelude;
pub mod registry;
pub mod stats;
pub mod transport;

pub use client::{
    Completion, ConnectionState, EventStream, RecordStream, SimClient, SimulatorInfo,
    VariableStream,
};
pub use config::{ClientConfig, SubscriptionOptions};
pub use consumers::EventNotification;
pub use dispatch::{DispatchOutcome, DropReason};
pub use error::{ClientError, ClientResult, TransportError, TransportResult};
pub use mapping::{FromRecord, MappedRecord, RecordMapping};
pub use memory::MemoryTransport;
pub use stats::DispatchStatsSnapshot;
pub use transport::{Command, RequestPeriod, TextColor, TextKind, Transport};

pub use simlink_protocol::{DecodedVariable, DefineId, EventId, ObjectId, VariableDescriptor};
