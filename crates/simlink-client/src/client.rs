//! Client facade.
//!
//! Every operation is a short composition: register a define set and/or a
//! consumer, then send exactly one command that references the new id. The
//! answer arrives later through the dispatch task.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use simlink_protocol::codec::{encode_degrees, encode_f64};
use simlink_protocol::{
    DecodedVariable, DefineId, EventId, ExceptionRecord, OpenRecord, VariableDescriptor, Version4,
};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, SubscriptionOptions};
use crate::consumers::{ConsumerRegistry, DataSink, DataTarget, EventNotification, RequestSpec};
use crate::dispatch::Dispatcher;
use crate::error::{ClientError, ClientResult};
use crate::mapping::{FromRecord, MappedRecord, RecordMapping};
use crate::registry::{Registration, SchemaRegistry};
use crate::stats::{DispatchStats, DispatchStatsSnapshot};
use crate::transport::{Command, TextKind, Transport};

const EXCEPTION_BUFFER: usize = 64;

/// Simulator identity from the open record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorInfo {
    /// Simulator application name
    pub application_name: String,
    /// Simulator version
    pub application_version: Version4,
    /// Interface version
    pub interface_version: Version4,
}

impl From<OpenRecord> for SimulatorInfo {
    fn from(record: OpenRecord) -> Self {
        Self {
            application_name: record.application_name,
            application_version: record.application_version,
            interface_version: record.interface_version,
        }
    }
}

/// Connection lifecycle as seen by the dispatch task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport opened, simulator has not confirmed yet
    Connecting,
    /// Simulator confirmed the connection
    Open(SimulatorInfo),
    /// Simulator announced it is quitting
    Quit,
    /// Dispatch loop has stopped
    Closed,
}

/// State shared by the facade and the dispatch task.
pub(crate) struct ClientShared {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) schemas: SchemaRegistry,
    pub(crate) consumers: ConsumerRegistry,
    pub(crate) stats: DispatchStats,
    pub(crate) state: watch::Sender<ConnectionState>,
    pub(crate) exceptions: broadcast::Sender<ExceptionRecord>,
}

impl ClientShared {
    pub(crate) fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        let (exceptions, _) = broadcast::channel(EXCEPTION_BUFFER);
        Self {
            config,
            transport,
            schemas: SchemaRegistry::new(),
            consumers: ConsumerRegistry::new(),
            stats: DispatchStats::new(),
            state,
            exceptions,
        }
    }
}

/// Stream of decoded batches for one definition.
#[derive(Debug)]
pub struct VariableStream {
    registration: Registration,
    rx: mpsc::Receiver<Vec<DecodedVariable>>,
}

impl VariableStream {
    /// Next batch, or `None` once the client is gone
    pub async fn recv(&mut self) -> Option<Vec<DecodedVariable>> {
        self.rx.recv().await
    }

    /// Next batch if one is already buffered
    pub fn try_recv(&mut self) -> Option<Vec<DecodedVariable>> {
        self.rx.try_recv().ok()
    }

    /// Definition backing this stream
    pub fn define_id(&self) -> DefineId {
        self.registration.define_id()
    }

    /// Variables the simulator accepted, in batch order
    pub fn variables(&self) -> &[VariableDescriptor] {
        self.registration.set.variables()
    }

    /// Caller positions of the accepted variables
    pub fn accepted(&self) -> &[usize] {
        &self.registration.accepted
    }
}

/// Stream of mapped records for one definition.
#[derive(Debug)]
pub struct RecordStream {
    define_id: DefineId,
    fields: Arc<[String]>,
    rx: mpsc::Receiver<MappedRecord>,
}

impl RecordStream {
    /// Next record, or `None` once the client is gone
    pub async fn recv(&mut self) -> Option<MappedRecord> {
        self.rx.recv().await
    }

    /// Next record converted into a caller type
    pub async fn recv_as<T: FromRecord>(&mut self) -> Option<ClientResult<T>> {
        self.rx.recv().await.map(|record| record.decode())
    }

    /// Definition backing this stream
    pub fn define_id(&self) -> DefineId {
        self.define_id
    }

    /// Fields whose variables were accepted
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Stream of occurrences of one named system event.
///
/// Dropping the stream retires its event id; later occurrences are dropped
/// by the dispatch task without reaching any callback.
#[derive(Debug)]
pub struct EventStream {
    event_id: EventId,
    name: String,
    rx: mpsc::Receiver<EventNotification>,
    shared: Weak<ClientShared>,
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.consumers.retire_event(self.event_id);
            debug!(event_id = %self.event_id, event = %self.name, "Event stream dropped; consumer retired");
        }
    }
}

impl EventStream {
    /// Next occurrence, or `None` once the client is gone
    pub async fn recv(&mut self) -> Option<EventNotification> {
        self.rx.recv().await
    }

    /// Next occurrence if one is already buffered
    pub fn try_recv(&mut self) -> Option<EventNotification> {
        self.rx.try_recv().ok()
    }

    /// Handle the event was registered under
    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Simulator event name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Signal fired by the first notification for a one-shot event id.
#[derive(Debug)]
pub struct Completion {
    event_id: EventId,
    rx: oneshot::Receiver<EventNotification>,
}

impl Completion {
    /// Handle the completion is keyed by
    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Wait for the completion.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Timeout`] if nothing arrives in time, or
    /// [`ClientError::CompletionDropped`] if the client shut down first.
    pub async fn wait(self, timeout: Duration) -> ClientResult<EventNotification> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(notification)) => Ok(notification),
            Ok(Err(_)) => Err(ClientError::CompletionDropped),
            Err(_) => Err(ClientError::timeout(duration_ms(timeout))),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Connection to a simulator.
///
/// Created by [`SimClient::connect`], which opens the transport and starts
/// the dispatch task. Dropping the client closes the transport, which in turn
/// stops the task.
pub struct SimClient {
    shared: Arc<ClientShared>,
    task: Mutex<Option<JoinHandle<()>>>,
    write_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for SimClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimClient")
            .field("application_name", &self.shared.config.application_name)
            .field("state", &*self.shared.state.borrow())
            .finish()
    }
}

impl SimClient {
    /// Open the transport and start the dispatch task.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] for a bad configuration, or the
    /// transport's open failure.
    pub async fn connect<T>(transport: T, config: ClientConfig) -> ClientResult<Self>
    where
        T: Transport + 'static,
    {
        Self::connect_shared(Arc::new(transport), config).await
    }

    /// Same as [`SimClient::connect`] for a transport already behind an `Arc`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] for a bad configuration, or the
    /// transport's open failure.
    pub async fn connect_shared(
        transport: Arc<dyn Transport>,
        config: ClientConfig,
    ) -> ClientResult<Self> {
        config.validate()?;
        transport.open(&config.application_name).await?;
        info!(application = %config.application_name, "Transport opened");

        let shared = Arc::new(ClientShared::new(transport, config));
        let task = tokio::spawn(Dispatcher::new(Arc::clone(&shared)).run());

        Ok(Self {
            shared,
            task: Mutex::new(Some(task)),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    fn ensure_open(&self) -> ClientResult<()> {
        if *self.shared.state.borrow() == ConnectionState::Closed {
            return Err(ClientError::Closed);
        }
        Ok(())
    }

    /// Subscribe to a batch of variables with the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EmptyDefinition`] if the simulator accepted none
    /// of the variables, or a transport error.
    pub async fn subscribe_variables(
        &self,
        descriptors: Vec<VariableDescriptor>,
    ) -> ClientResult<VariableStream> {
        let options = self.shared.config.subscription_defaults();
        self.subscribe_variables_with(descriptors, options).await
    }

    /// Subscribe to a batch of variables.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EmptyDefinition`] if the simulator accepted none
    /// of the variables, or a transport error.
    pub async fn subscribe_variables_with(
        &self,
        descriptors: Vec<VariableDescriptor>,
        options: SubscriptionOptions,
    ) -> ClientResult<VariableStream> {
        self.ensure_open()?;
        let registration = self
            .shared
            .schemas
            .register(self.shared.transport.as_ref(), descriptors)
            .await?;
        let (tx, rx) = mpsc::channel(self.shared.config.data_channel_capacity);
        self.start_request(registration.define_id(), DataSink::Batch(tx), options)
            .await?;
        Ok(VariableStream { registration, rx })
    }

    /// Subscribe to a mapped record.
    ///
    /// Fields whose variable the simulator rejects are left out of every
    /// record; [`MappedRecord::get`] returns `None` for them.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EmptyDefinition`] if the simulator accepted none
    /// of the variables, or a transport error.
    pub async fn subscribe_record(&self, mapping: RecordMapping) -> ClientResult<RecordStream> {
        self.ensure_open()?;
        let registration = self
            .shared
            .schemas
            .register(self.shared.transport.as_ref(), mapping.descriptors())
            .await?;
        let fields = mapping.fields_at(&registration.accepted);
        let (tx, rx) = mpsc::channel(self.shared.config.data_channel_capacity);
        let define_id = registration.define_id();
        let sink = DataSink::Record {
            fields: Arc::clone(&fields),
            tx,
        };
        self.start_request(define_id, sink, self.shared.config.subscription_defaults())
            .await?;
        Ok(RecordStream {
            define_id,
            fields,
            rx,
        })
    }

    /// Subscribe to records of a [`FromRecord`] type.
    ///
    /// # Errors
    ///
    /// Same as [`SimClient::subscribe_record`].
    pub async fn subscribe_as<T: FromRecord>(&self) -> ClientResult<RecordStream> {
        self.subscribe_record(T::mapping()).await
    }

    async fn start_request(
        &self,
        define_id: DefineId,
        sink: DataSink,
        options: SubscriptionOptions,
    ) -> ClientResult<()> {
        self.shared.consumers.register_data(
            define_id,
            DataTarget {
                sink,
                request: RequestSpec {
                    object_id: options.object_id,
                    period: options.period,
                },
            },
        );
        self.shared
            .transport
            .send(Command::RequestData {
                request_id: define_id.0,
                define_id,
                object_id: options.object_id,
                period: options.period,
                flags: 0,
            })
            .await?;
        debug!(%define_id, object_id = %options.object_id, period = ?options.period, "Data requested");
        Ok(())
    }

    /// Write one variable on the default object.
    ///
    /// The value is always sent as an 8-byte float.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotSettable`] for a read-only descriptor, or a
    /// transport error.
    pub async fn set_variable(&self, descriptor: &VariableDescriptor, value: f64) -> ClientResult<()> {
        self.write(descriptor, encode_f64(value)).await
    }

    /// Write an angle given in degrees; the simulator receives radians.
    ///
    /// # Errors
    ///
    /// Same as [`SimClient::set_variable`].
    pub async fn set_variable_degrees(
        &self,
        descriptor: &VariableDescriptor,
        degrees: f64,
    ) -> ClientResult<()> {
        self.write(descriptor, encode_degrees(degrees)).await
    }

    async fn write(&self, descriptor: &VariableDescriptor, bytes: [u8; 8]) -> ClientResult<()> {
        self.ensure_open()?;
        if !descriptor.settable {
            return Err(ClientError::NotSettable(descriptor.name.clone()));
        }

        // The write schema id is shared, so writes go one at a time.
        let _guard = self.write_lock.lock().await;
        let transport = self.shared.transport.as_ref();
        let define_id = self.shared.schemas.define_write(transport, descriptor).await?;
        let sent = transport
            .send(Command::SetData {
                define_id,
                object_id: self.shared.config.default_object_id,
                data: bytes.to_vec(),
            })
            .await;
        let cleared = self.shared.schemas.clear(transport, define_id).await;
        sent?;
        cleared?;
        debug!(variable = %descriptor.name, "Variable written");
        Ok(())
    }

    /// Subscribe to a named system event as a stream.
    ///
    /// Occurrences that find the stream's buffer full are dropped. Dropping
    /// the stream ends the subscription.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the subscription could not be sent.
    pub async fn subscribe_event(&self, name: &str) -> ClientResult<EventStream> {
        let (tx, rx) = mpsc::channel(self.shared.config.event_channel_capacity);
        let event_name = name.to_string();
        let event_id = self
            .on_event(name, move |notification| {
                if tx.try_send(notification.clone()).is_err() {
                    debug!(event = %event_name, "Event subscriber behind or gone; dropping occurrence");
                }
            })
            .await?;
        Ok(EventStream {
            event_id,
            name: name.to_string(),
            rx,
            shared: Arc::downgrade(&self.shared),
        })
    }

    /// Subscribe to a named system event with a callback.
    ///
    /// The callback runs on the dispatch task for every occurrence and must
    /// not block. It stays registered for the life of the connection. A
    /// panicking callback is logged and counted; the dispatch task carries on.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the subscription could not be sent.
    pub async fn on_event<F>(&self, name: &str, callback: F) -> ClientResult<EventId>
    where
        F: Fn(&EventNotification) + Send + Sync + 'static,
    {
        self.ensure_open()?;
        let event_id = self.shared.consumers.register_continuous(Arc::new(callback));
        self.shared
            .transport
            .send(Command::SubscribeSystemEvent {
                event_id,
                name: name.to_string(),
            })
            .await?;
        debug!(%event_id, event = name, "Subscribed to system event");
        Ok(event_id)
    }

    fn one_shot(&self) -> (EventId, Completion) {
        let (tx, rx) = oneshot::channel();
        let event_id = self
            .shared
            .consumers
            .register_one_shot(Box::new(move |notification| {
                if tx.send(notification).is_err() {
                    debug!("Completion no longer awaited");
                }
            }));
        (event_id, Completion { event_id, rx })
    }

    /// Fire a named input event at the default object.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the command could not be sent.
    pub async fn transmit_event(&self, name: &str, data: u32) -> ClientResult<Completion> {
        self.ensure_open()?;
        let (event_id, completion) = self.one_shot();
        self.shared
            .transport
            .send(Command::TransmitEvent {
                event_id,
                name: name.to_string(),
                object_id: self.shared.config.default_object_id,
                data,
            })
            .await?;
        debug!(%event_id, event = name, data, "Event transmitted");
        Ok(completion)
    }

    /// Show text on screen; the completion fires when it is dismissed.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the command could not be sent.
    pub async fn show_text(
        &self,
        kind: TextKind,
        text: &str,
        duration: Duration,
    ) -> ClientResult<Completion> {
        self.ensure_open()?;
        let (event_id, completion) = self.one_shot();
        let mut bytes = Vec::with_capacity(text.len().saturating_add(1));
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        self.shared
            .transport
            .send(Command::ShowText {
                event_id,
                kind,
                duration,
                text: bytes,
            })
            .await?;
        Ok(completion)
    }

    /// Receive every exception the simulator reports from now on
    pub fn subscribe_exceptions(&self) -> broadcast::Receiver<ExceptionRecord> {
        self.shared.exceptions.subscribe()
    }

    /// Current connection state
    pub fn connection_state(&self) -> ConnectionState {
        self.shared.state.borrow().clone()
    }

    /// Watch connection state changes
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Wait for the simulator to confirm the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Timeout`] if no confirmation arrives in time and
    /// [`ClientError::Closed`] if the connection ends first.
    pub async fn wait_until_open(&self, timeout: Duration) -> ClientResult<SimulatorInfo> {
        let mut rx = self.shared.state.subscribe();
        let waited = tokio::time::timeout(
            timeout,
            rx.wait_for(|state| !matches!(state, ConnectionState::Connecting)),
        )
        .await;
        let state = match waited {
            Ok(Ok(state)) => state.clone(),
            Ok(Err(_)) => return Err(ClientError::Closed),
            Err(_) => return Err(ClientError::timeout(duration_ms(timeout))),
        };
        match state {
            ConnectionState::Open(info) => Ok(info),
            _ => Err(ClientError::Closed),
        }
    }

    /// Dispatch counters
    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Close the transport and wait for the dispatch task to finish.
    ///
    /// # Errors
    ///
    /// Returns the transport's close failure.
    pub async fn close(&self) -> ClientResult<()> {
        self.shared.transport.close().await?;
        let task = self.task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            warn!(error = %e, "Dispatch task ended abnormally");
        }
        info!("Client closed");
        Ok(())
    }
}

impl Drop for SimClient {
    fn drop(&mut self) {
        let Some(task) = self.task.lock().take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let transport = Arc::clone(&self.shared.transport);
                handle.spawn(async move {
                    if let Err(e) = transport.close().await {
                        warn!(error = %e, "Failed to close transport on drop");
                    }
                });
            }
            Err(_) => task.abort(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTransport;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn config() -> ClientConfig {
        ClientConfig::default().with_poll_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_connect_opens_with_application_name() -> TestResult {
        let transport = MemoryTransport::new();
        let client = SimClient::connect(
            transport.clone(),
            config().with_application_name("unit-client"),
        )
        .await?;
        assert_eq!(transport.application_name().as_deref(), Some("unit-client"));
        client.close().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let result =
            SimClient::connect(MemoryTransport::new(), config().with_data_channel_capacity(0)).await;
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_read_only_write_is_refused() -> TestResult {
        let transport = MemoryTransport::new();
        let client = SimClient::connect(transport.clone(), config()).await?;
        let result = client
            .set_variable(&VariableDescriptor::new("PLANE ALTITUDE", "Feet"), 1.0)
            .await;
        assert!(matches!(result, Err(ClientError::NotSettable(_))));
        assert!(
            !transport
                .sent_commands()
                .iter()
                .any(|c| matches!(c, Command::SetData { .. }))
        );
        client.close().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_operations_after_close_fail() -> TestResult {
        let client = SimClient::connect(MemoryTransport::new(), config()).await?;
        client.close().await?;
        let result = client
            .subscribe_variables(vec![VariableDescriptor::new("PLANE ALTITUDE", "Feet")])
            .await;
        assert!(matches!(result, Err(ClientError::Closed)));
        Ok(())
    }

    #[tokio::test]
    async fn test_completion_times_out() -> TestResult {
        let client = SimClient::connect(MemoryTransport::new(), config()).await?;
        let completion = client.transmit_event("PARKING_BRAKES", 0).await?;
        let result = completion.wait(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(ClientError::Timeout { timeout_ms: 20 })));
        client.close().await?;
        Ok(())
    }
}
