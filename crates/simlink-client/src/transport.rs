//! Transport abstraction for the simulator connection
//!
//! The transport owns the raw connection handle. The client only ever opens
//! it, closes it, sends [`Command`]s and pulls raw notification buffers; all
//! decoding happens in the dispatch loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use simlink_protocol::{DatumKind, DefineId, EventId, ObjectId};

use crate::error::TransportResult;

/// How often the simulator answers a data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPeriod {
    /// Stop sending
    Never,
    /// Send once; the client renews the request after each delivery
    #[default]
    Once,
    /// Every visual frame
    VisualFrame,
    /// Every simulation frame
    SimFrame,
    /// Once per second
    Second,
}

impl RequestPeriod {
    /// Numeric value sent with a data request
    pub fn wire_code(self) -> u32 {
        match self {
            RequestPeriod::Never => 0,
            RequestPeriod::Once => 1,
            RequestPeriod::VisualFrame => 2,
            RequestPeriod::SimFrame => 3,
            RequestPeriod::Second => 4,
        }
    }

    /// Whether the client must re-request after every delivery
    pub fn needs_renewal(self) -> bool {
        self == RequestPeriod::Once
    }
}

/// Colour of on-screen text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextColor {
    /// Black
    Black,
    /// White
    #[default]
    White,
    /// Red
    Red,
    /// Green
    Green,
    /// Blue
    Blue,
    /// Yellow
    Yellow,
    /// Magenta
    Magenta,
    /// Cyan
    Cyan,
}

impl TextColor {
    fn index(self) -> u32 {
        match self {
            TextColor::Black => 0,
            TextColor::White => 1,
            TextColor::Red => 2,
            TextColor::Green => 3,
            TextColor::Blue => 4,
            TextColor::Yellow => 5,
            TextColor::Magenta => 6,
            TextColor::Cyan => 7,
        }
    }
}

/// How on-screen text is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    /// Scrolling banner
    Scroll(TextColor),
    /// Static line
    Print(TextColor),
}

impl Default for TextKind {
    fn default() -> Self {
        TextKind::Print(TextColor::White)
    }
}

impl TextKind {
    /// Numeric value sent with a text command
    pub fn wire_code(self) -> u32 {
        match self {
            TextKind::Scroll(color) => color.index(),
            TextKind::Print(color) => 0x0100 | color.index(),
        }
    }
}

/// One outbound command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Append one variable to a data definition
    AddToDefinition {
        /// Definition being built
        define_id: DefineId,
        /// Position of the variable in the caller's list
        datum_id: u32,
        /// Variable name
        name: String,
        /// Unit string
        unit: String,
        /// Wire representation requested
        datum: DatumKind,
    },
    /// Drop every variable of a definition
    ClearDefinition {
        /// Definition to clear
        define_id: DefineId,
    },
    /// Ask for data laid out by a definition
    RequestData {
        /// Request handle echoed in the answer
        request_id: u32,
        /// Layout of the answer
        define_id: DefineId,
        /// Object to read
        object_id: ObjectId,
        /// Answer period
        period: RequestPeriod,
        /// Request flags
        flags: u32,
    },
    /// Write data laid out by a definition
    SetData {
        /// Layout of `data`
        define_id: DefineId,
        /// Object to write
        object_id: ObjectId,
        /// Encoded fields
        data: Vec<u8>,
    },
    /// Subscribe to a named system event
    SubscribeSystemEvent {
        /// Client handle for the event
        event_id: EventId,
        /// Simulator event name
        name: String,
    },
    /// Map a named input event to a client handle and fire it
    TransmitEvent {
        /// Client handle for the event
        event_id: EventId,
        /// Simulator event name
        name: String,
        /// Object receiving the event
        object_id: ObjectId,
        /// Event parameter
        data: u32,
    },
    /// Display text on screen
    ShowText {
        /// Handle notified when the text is dismissed
        event_id: EventId,
        /// Presentation
        kind: TextKind,
        /// Display time
        duration: Duration,
        /// Null-terminated text
        text: Vec<u8>,
    },
}

impl Command {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddToDefinition { .. } => "add_to_definition",
            Command::ClearDefinition { .. } => "clear_definition",
            Command::RequestData { .. } => "request_data",
            Command::SetData { .. } => "set_data",
            Command::SubscribeSystemEvent { .. } => "subscribe_system_event",
            Command::TransmitEvent { .. } => "transmit_event",
            Command::ShowText { .. } => "show_text",
        }
    }
}

/// Connection to a running simulator.
///
/// Implementations must be safe to call from the dispatch task and from any
/// number of caller tasks at once. After [`close`](Transport::close),
/// [`next_notification`](Transport::next_notification) must return
/// [`TransportError::Closed`](crate::error::TransportError::Closed).
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Open the connection under the given application name
    async fn open(&self, application_name: &str) -> TransportResult<()>;

    /// Close the connection; closing twice is not an error
    async fn close(&self) -> TransportResult<()>;

    /// Send one command
    async fn send(&self, command: Command) -> TransportResult<()>;

    /// Fetch the next raw notification, or `None` if nothing is pending
    async fn next_notification(&self) -> TransportResult<Option<Vec<u8>>>;
}
