//! Protocol-level error types

use thiserror::Error;

/// Errors raised while parsing or encoding wire records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The buffer ends before a fixed-layout field
    #[error("Record truncated: {record} needs {needed} bytes, got {actual}")]
    Truncated {
        /// Record or field being read
        record: &'static str,
        /// Bytes required
        needed: usize,
        /// Bytes available
        actual: usize,
    },

    /// A value slice does not have the width its datum kind requires
    #[error("Size mismatch for {kind}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Datum kind name
        kind: &'static str,
        /// Expected width
        expected: usize,
        /// Actual width
        actual: usize,
    },

    /// A string does not fit its fixed-width field
    #[error("String of {len} bytes does not fit a {width}-byte field")]
    StringTooLong {
        /// Encoded length including the terminator
        len: usize,
        /// Field width
        width: usize,
    },
}

impl ProtocolError {
    /// Create a truncation error
    pub fn truncated(record: &'static str, needed: usize, actual: usize) -> Self {
        ProtocolError::Truncated {
            record,
            needed,
            actual,
        }
    }

    /// Create a size mismatch error
    pub fn size_mismatch(kind: &'static str, expected: usize, actual: usize) -> Self {
        ProtocolError::SizeMismatch {
            kind,
            expected,
            actual,
        }
    }
}

/// Specialized Result type for protocol operations
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
