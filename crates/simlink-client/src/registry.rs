//! Schema registry.
//!
//! Define sets live in a dense, append-only vector indexed by [`DefineId`].
//! A slot is reserved before the definition commands go out and filled once
//! they finish, so the dispatch loop never sees a half-built set: until the
//! slot is filled, lookups report the id as unknown.

use std::sync::Arc;

use parking_lot::Mutex;
use simlink_protocol::{DatumKind, DefineId, DefineSet, VariableDescriptor};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::transport::{Command, Transport};

/// Result of one registration.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The stored set, holding only accepted descriptors
    pub set: Arc<DefineSet>,
    /// Original positions of the accepted descriptors
    pub accepted: Vec<usize>,
}

impl Registration {
    /// Handle of the registered set
    pub fn define_id(&self) -> DefineId {
        self.set.id()
    }
}

/// Append-only store of define sets.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    sets: Mutex<Vec<Option<Arc<DefineSet>>>>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn reserve(&self) -> DefineId {
        let mut sets = self.sets.lock();
        let id = DefineId(u32::try_from(sets.len()).unwrap_or(u32::MAX));
        sets.push(None);
        id
    }

    fn commit(&self, set: Arc<DefineSet>) {
        let mut sets = self.sets.lock();
        if let Some(slot) = sets.get_mut(set.id().index()) {
            *slot = Some(set);
        }
    }

    /// Register a new define set.
    ///
    /// Sends one definition entry per descriptor, tagged with its position.
    /// Entries the simulator rejects are skipped; the stored set keeps the
    /// accepted ones in their original order. A terminal transport error
    /// aborts the registration and leaves the reserved id unused.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EmptyDefinition`] when no descriptor was
    /// accepted, or the transport error that ended the connection.
    pub async fn register(
        &self,
        transport: &dyn Transport,
        descriptors: Vec<VariableDescriptor>,
    ) -> ClientResult<Registration> {
        let define_id = self.reserve();
        let requested = descriptors.len();
        let mut accepted = Vec::with_capacity(requested);
        let mut variables = Vec::with_capacity(requested);

        for (position, descriptor) in descriptors.into_iter().enumerate() {
            let command = Command::AddToDefinition {
                define_id,
                datum_id: u32::try_from(position).unwrap_or(u32::MAX),
                name: descriptor.name.clone(),
                unit: descriptor.unit.clone(),
                datum: descriptor.datum_kind(),
            };
            match transport.send(command).await {
                Ok(()) => {
                    accepted.push(position);
                    variables.push(descriptor);
                }
                Err(e) if e.is_terminal() => return Err(e.into()),
                Err(e) => {
                    warn!(
                        %define_id,
                        variable = %descriptor.name,
                        unit = %descriptor.unit,
                        error = %e,
                        "Variable rejected; skipping it in definition"
                    );
                }
            }
        }

        if variables.is_empty() {
            return Err(ClientError::EmptyDefinition { requested });
        }

        debug!(
            %define_id,
            accepted = variables.len(),
            requested,
            "Registered define set"
        );
        let set = Arc::new(DefineSet::new(define_id, variables));
        self.commit(Arc::clone(&set));
        Ok(Registration { set, accepted })
    }

    /// Look up a committed set
    pub fn lookup(&self, id: DefineId) -> Option<Arc<DefineSet>> {
        self.sets.lock().get(id.index()).cloned().flatten()
    }

    /// Number of ids issued so far, committed or not
    pub fn issued(&self) -> usize {
        self.sets.lock().len()
    }

    /// Define the single-variable write schema.
    ///
    /// The entry always declares a 64-bit float so the 8-byte encoding of the
    /// value matches whatever the variable's own unit is.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the entry could not be sent.
    pub async fn define_write(
        &self,
        transport: &dyn Transport,
        descriptor: &VariableDescriptor,
    ) -> ClientResult<DefineId> {
        transport
            .send(Command::AddToDefinition {
                define_id: DefineId::EPHEMERAL_WRITE,
                datum_id: 0,
                name: descriptor.name.clone(),
                unit: descriptor.unit.clone(),
                datum: DatumKind::Float64,
            })
            .await?;
        Ok(DefineId::EPHEMERAL_WRITE)
    }

    /// Release a definition on the simulator side.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the command could not be sent.
    pub async fn clear(&self, transport: &dyn Transport, define_id: DefineId) -> ClientResult<()> {
        transport
            .send(Command::ClearDefinition { define_id })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTransport;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    async fn open_transport() -> Result<MemoryTransport, Box<dyn std::error::Error>> {
        let transport = MemoryTransport::new().without_open_record();
        transport.open("registry-test").await?;
        Ok(transport)
    }

    #[tokio::test]
    async fn test_ids_are_sequential() -> TestResult {
        let transport = open_transport().await?;
        let registry = SchemaRegistry::new();

        let first = registry
            .register(&transport, vec![VariableDescriptor::new("PLANE ALTITUDE", "Feet")])
            .await?;
        let second = registry
            .register(&transport, vec![VariableDescriptor::new("PLANE ALTITUDE", "Feet")])
            .await?;

        assert_eq!(first.define_id(), DefineId(0));
        assert_eq!(second.define_id(), DefineId(1));
        assert!(registry.lookup(DefineId(1)).is_some());
        assert!(registry.lookup(DefineId(2)).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_entries_tagged_with_position() -> TestResult {
        let transport = open_transport().await?;
        let registry = SchemaRegistry::new();
        registry
            .register(
                &transport,
                vec![
                    VariableDescriptor::new("SIM ON GROUND", "Bool"),
                    VariableDescriptor::new("PLANE ALTITUDE", "Feet"),
                ],
            )
            .await?;

        let datum_ids: Vec<u32> = transport
            .sent_commands()
            .iter()
            .filter_map(|c| match c {
                Command::AddToDefinition { datum_id, .. } => Some(*datum_id),
                _ => None,
            })
            .collect();
        assert_eq!(datum_ids, vec![0, 1]);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_descriptor_is_skipped() -> TestResult {
        let transport = open_transport().await?;
        transport.reject_variable("BOGUS");
        let registry = SchemaRegistry::new();

        let registration = registry
            .register(
                &transport,
                vec![
                    VariableDescriptor::new("PLANE ALTITUDE", "Feet"),
                    VariableDescriptor::new("BOGUS", "Feet"),
                    VariableDescriptor::new("AIRSPEED INDICATED", "Knots"),
                ],
            )
            .await?;

        let names: Vec<&str> = registration
            .set
            .variables()
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["PLANE ALTITUDE", "AIRSPEED INDICATED"]);
        assert_eq!(registration.accepted, vec![0, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn test_all_rejected_is_error_and_id_not_reused() -> TestResult {
        let transport = open_transport().await?;
        transport.reject_variable("BOGUS");
        let registry = SchemaRegistry::new();

        let result = registry
            .register(&transport, vec![VariableDescriptor::new("BOGUS", "Feet")])
            .await;
        assert!(matches!(
            result,
            Err(ClientError::EmptyDefinition { requested: 1 })
        ));
        assert!(registry.lookup(DefineId(0)).is_none());

        let next = registry
            .register(&transport, vec![VariableDescriptor::new("PLANE ALTITUDE", "Feet")])
            .await?;
        assert_eq!(next.define_id(), DefineId(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_closed_transport_aborts_registration() -> TestResult {
        let transport = open_transport().await?;
        transport.close().await?;
        let registry = SchemaRegistry::new();

        let result = registry
            .register(&transport, vec![VariableDescriptor::new("PLANE ALTITUDE", "Feet")])
            .await;
        assert!(matches!(result, Err(ClientError::Transport(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_write_schema_is_float64() -> TestResult {
        let transport = open_transport().await?;
        let registry = SchemaRegistry::new();
        let id = registry
            .define_write(&transport, &VariableDescriptor::settable("GEAR HANDLE POSITION", "Bool"))
            .await?;
        registry.clear(&transport, id).await?;

        let sent = transport.sent_commands();
        assert!(matches!(
            sent.first(),
            Some(Command::AddToDefinition {
                define_id: DefineId::EPHEMERAL_WRITE,
                datum: DatumKind::Float64,
                ..
            })
        ));
        assert!(matches!(
            sent.get(1),
            Some(Command::ClearDefinition {
                define_id: DefineId::EPHEMERAL_WRITE
            })
        ));
        // The write schema never occupies a dense slot.
        assert_eq!(registry.issued(), 0);
        Ok(())
    }
}
