//! Integer handles shared between the client and the simulator.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Handle of one registered data definition.
///
/// Read definitions are numbered densely from zero in registration order, so
/// the value doubles as an index into the schema registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefineId(pub u32);

impl DefineId {
    /// Reserved definition used for single-variable writes.
    ///
    /// Kept far above the sequential read numbering so the two never collide.
    pub const EPHEMERAL_WRITE: DefineId = DefineId(0x7FFF_0000);

    /// Position of this definition in a dense registry.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DefineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "define#{}", self.0)
    }
}

/// Handle of one client event (system-event subscription, transmitted input
/// event, or text display completion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u32);

impl EventId {
    /// Position of this event in a dense registry.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// Simulation object a data request or write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// The user's aircraft.
    pub const USER: ObjectId = ObjectId(0);
}

impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::USER
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ephemeral_write_id_is_outside_dense_range() {
        assert!(DefineId::EPHEMERAL_WRITE.index() > u16::MAX as usize);
    }

    #[test]
    fn test_ids_serialize_transparently() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&DefineId(7))?, "7");
        assert_eq!(serde_json::from_str::<ObjectId>("0")?, ObjectId::USER);
        Ok(())
    }

    #[test]
    fn test_display() {
        assert_eq!(DefineId(3).to_string(), "define#3");
        assert_eq!(EventId(12).to_string(), "event#12");
    }
}
