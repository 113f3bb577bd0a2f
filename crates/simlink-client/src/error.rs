//! Client and transport error types

use std::io;

use simlink_protocol::ProtocolError;
use thiserror::Error;

/// Errors reported by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established
    #[error("Failed to open connection: {0}")]
    Open(String),

    /// The connection is closed; no further traffic is possible
    #[error("Transport is closed")]
    Closed,

    /// The simulator refused one command
    #[error("Command rejected: {0}")]
    Rejected(String),

    /// Polling for the next notification failed
    #[error("Poll failed: {0}")]
    Poll(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Check if this error ends the connection
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransportError::Closed | TransportError::Open(_))
    }

    /// Check if the dispatch loop may simply retry on its next cycle
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TransportError::Poll(_) | TransportError::Io(_) | TransportError::Rejected(_)
        )
    }

    /// Create a rejection error
    pub fn rejected(reason: impl Into<String>) -> Self {
        TransportError::Rejected(reason.into())
    }
}

/// Specialized Result type for transport operations
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors returned synchronously by [`SimClient`](crate::client::SimClient)
/// operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure while opening or sending a command
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Every descriptor of a registration was rejected
    #[error("None of the {requested} requested variables were accepted")]
    EmptyDefinition {
        /// Number of descriptors submitted
        requested: usize,
    },

    /// Write attempted on a read-only variable
    #[error("Variable {0:?} is not settable")]
    NotSettable(String),

    /// The client has been closed
    #[error("Client is closed")]
    Closed,

    /// A completion or connection confirmation did not arrive in time
    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// The dispatch loop ended before a completion fired
    #[error("Completion was dropped before it fired")]
    CompletionDropped,

    /// Encoding or decoding failed
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A mapped record is missing a field or has the wrong kind
    #[error("Record mapping error: {0}")]
    Mapping(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Create a timeout error
    pub fn timeout(timeout_ms: u64) -> Self {
        ClientError::Timeout { timeout_ms }
    }

    /// Create a mapping error
    pub fn mapping(msg: impl Into<String>) -> Self {
        ClientError::Mapping(msg.into())
    }

    /// Check if this error means the connection is gone
    pub fn is_fatal(&self) -> bool {
        match self {
            ClientError::Transport(e) => e.is_terminal(),
            ClientError::Closed | ClientError::CompletionDropped => true,
            _ => false,
        }
    }
}

/// Specialized Result type for client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;
