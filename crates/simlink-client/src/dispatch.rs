//! Dispatch loop.
//!
//! A single task owns the read side of the connection. Each cycle it sleeps
//! for the poll interval, pulls at most one notification, classifies it by
//! record kind and routes it:
//!
//! - data records are sliced against their registered define set and the
//!   whole batch is handed to that definition's consumer, then the request is
//!   renewed when its period is `Once`
//! - events go to the callback registered under their event id
//! - open, quit and exception records only update connection state, the
//!   exception broadcast and the counters
//!
//! Nothing that goes wrong inside the loop is returned to a caller; it is
//! logged, counted and the loop moves on. A panicking event callback is
//! caught and counted too. Only a closed transport ends the loop, and however
//! the task ends the transport is closed and [`ConnectionState::Closed`] is
//! published.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use simlink_protocol::{
    DecodeError, DefineId, EventFilenameRecord, EventId, EventRecord, ExceptionRecord,
    Notification, OpenRecord, RecordKind, SimObjectDataRecord, decode_batch,
};
use tracing::{debug, error, info, trace, warn};

use crate::client::{ClientShared, ConnectionState, SimulatorInfo};
use crate::consumers::{DataTarget, Delivery, EventNotification};
use crate::transport::Command;

/// Why a data notification was not delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// No define set is registered under the id
    UnknownDefinition,
    /// Count mismatch, unsized variable or truncated payload
    Decode(DecodeError),
    /// The set exists but nothing consumes it any more
    NoConsumer,
    /// The consumer's channel stayed full for a whole poll interval
    Backpressure,
    /// The consumer's receiver was dropped
    ConsumerClosed,
}

/// What handling one notification did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Connection confirmed by the simulator
    Opened,
    /// Simulator is shutting down
    Quit,
    /// Exception observed
    Exception(ExceptionRecord),
    /// Event handed to its callback
    EventDelivered(EventId),
    /// Event with no registered callback
    EventUnclaimed(EventId),
    /// Event callback panicked; the loop carried on
    CallbackPanicked(EventId),
    /// Batch handed to its consumer
    BatchDelivered(DefineId),
    /// Batch discarded
    BatchDropped(DefineId, DropReason),
    /// Record kind the loop does not act on
    Ignored(RecordKind),
    /// Buffer too short for its own header or fields
    Malformed,
}

/// Background notification pump.
pub(crate) struct Dispatcher {
    shared: Arc<ClientShared>,
    poll_interval: Duration,
}

impl Dispatcher {
    pub(crate) fn new(shared: Arc<ClientShared>) -> Self {
        let poll_interval = shared.config.poll_interval();
        Self {
            shared,
            poll_interval,
        }
    }

    /// Run until the transport reports closed, then close it and publish
    /// [`ConnectionState::Closed`].
    pub(crate) async fn run(self) {
        info!(
            poll_interval_ms = self.shared.config.poll_interval_ms,
            "Dispatch loop started"
        );
        let shutdown = ShutdownGuard::new(Arc::clone(&self.shared));

        loop {
            tokio::time::sleep(self.poll_interval).await;

            match self.shared.transport.next_notification().await {
                Ok(Some(bytes)) => {
                    self.shared.stats.inc_notification();
                    self.handle(&bytes).await;
                }
                Ok(None) => {}
                Err(e) if e.is_terminal() => {
                    info!(error = %e, "Transport closed; stopping dispatch loop");
                    break;
                }
                Err(e) => {
                    self.shared.stats.inc_poll_error();
                    debug!(error = %e, "Poll failed; retrying next cycle");
                }
            }
        }

        shutdown.close().await;
        info!("Dispatch loop stopped");
    }

    /// Classify and route one raw notification.
    pub(crate) async fn handle(&self, bytes: &[u8]) -> DispatchOutcome {
        let notification = match Notification::parse(bytes) {
            Ok(notification) => notification,
            Err(e) => {
                warn!(len = bytes.len(), error = %e, "Malformed notification; dropping");
                return DispatchOutcome::Malformed;
            }
        };
        trace!(kind = ?notification.kind(), "Notification received");

        match notification {
            Notification::Open(record) => self.handle_open(record),
            Notification::Quit => {
                info!("Simulator quit");
                self.shared.state.send_replace(ConnectionState::Quit);
                DispatchOutcome::Quit
            }
            Notification::Event(record) => self.handle_event(record, None),
            Notification::EventFilename(EventFilenameRecord {
                event, filename, ..
            }) => self.handle_event(event, Some(filename)),
            Notification::Exception(record) => self.handle_exception(record),
            Notification::SimObjectData(record) | Notification::SimObjectDataByType(record) => {
                self.handle_data(record).await
            }
            Notification::Null => DispatchOutcome::Ignored(RecordKind::Null),
            Notification::Unrecognized(kind) => {
                debug!(?kind, "Unrecognized record kind; dropping");
                DispatchOutcome::Ignored(kind)
            }
        }
    }

    fn handle_open(&self, record: OpenRecord) -> DispatchOutcome {
        info!(
            simulator = %record.application_name,
            version = %record.application_version,
            "Connection opened"
        );
        self.shared
            .state
            .send_replace(ConnectionState::Open(SimulatorInfo::from(record)));
        DispatchOutcome::Opened
    }

    fn handle_exception(&self, record: ExceptionRecord) -> DispatchOutcome {
        self.shared.stats.inc_exception();
        warn!(
            exception = record.exception.name(),
            code = record.exception.0,
            send_id = record.send_id,
            index = record.index,
            "Simulator reported an exception"
        );
        // Nobody listening is fine.
        if self.shared.exceptions.send(record).is_err() {
            trace!("No exception subscribers");
        }
        DispatchOutcome::Exception(record)
    }

    fn handle_event(&self, record: EventRecord, filename: Option<String>) -> DispatchOutcome {
        let event_id = record.event_id;
        let Some(target) = self.shared.consumers.take_event_target(event_id) else {
            self.shared.stats.inc_event_unclaimed();
            if self.shared.consumers.event_issued(event_id) {
                debug!(%event_id, "Event consumer already spent or retired; dropping");
            } else {
                warn!(%event_id, data = record.data, "Event has no registered consumer; dropping");
            }
            return DispatchOutcome::EventUnclaimed(event_id);
        };

        debug!(%event_id, data = record.data, "Delivering event");
        let notification = EventNotification {
            event_id,
            group_id: record.group_id,
            data: record.data,
            filename,
        };
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| target.invoke(notification)));
        if let Err(payload) = result {
            self.shared.stats.inc_callback_panic();
            error!(
                %event_id,
                panic = panic_message(payload.as_ref()),
                "Event callback panicked; continuing"
            );
            return DispatchOutcome::CallbackPanicked(event_id);
        }
        self.shared.stats.inc_event_delivered();
        DispatchOutcome::EventDelivered(event_id)
    }

    async fn handle_data(&self, record: SimObjectDataRecord<'_>) -> DispatchOutcome {
        let define_id = record.define_id;

        let Some(set) = self.shared.schemas.lookup(define_id) else {
            self.shared.stats.inc_unknown_definition();
            warn!(%define_id, "Data for unknown definition; dropping");
            return DispatchOutcome::BatchDropped(define_id, DropReason::UnknownDefinition);
        };

        let batch = match decode_batch(&set, record.define_count, record.data) {
            Ok(batch) => batch,
            Err(e) => {
                self.shared.stats.inc_decode_failure();
                match &e {
                    DecodeError::Truncated { .. } => {
                        warn!(%define_id, error = %e, "Variable data out of bounds; discarding batch");
                    }
                    DecodeError::CountMismatch { .. } | DecodeError::Unsized { .. } => {
                        warn!(%define_id, error = %e, "Schema mismatch; discarding batch");
                    }
                }
                // An unsized variable fails every batch for this set.
                if !matches!(e, DecodeError::Unsized { .. })
                    && let Some(target) = self.shared.consumers.data_target(define_id)
                {
                    self.renew(define_id, &target).await;
                }
                return DispatchOutcome::BatchDropped(define_id, DropReason::Decode(e));
            }
        };

        let Some(target) = self.shared.consumers.data_target(define_id) else {
            debug!(%define_id, "No consumer for definition; dropping batch");
            return DispatchOutcome::BatchDropped(define_id, DropReason::NoConsumer);
        };

        let outcome = match target.sink.deliver(batch, self.poll_interval).await {
            Delivery::Delivered => {
                self.shared.stats.inc_batch_delivered();
                DispatchOutcome::BatchDelivered(define_id)
            }
            Delivery::Full => {
                self.shared.stats.inc_batch_dropped();
                debug!(%define_id, "Consumer fell behind; batch dropped");
                DispatchOutcome::BatchDropped(define_id, DropReason::Backpressure)
            }
            Delivery::Closed => {
                debug!(%define_id, "Consumer gone; retiring subscription");
                self.shared.consumers.retire_data(define_id);
                return DispatchOutcome::BatchDropped(define_id, DropReason::ConsumerClosed);
            }
        };

        self.renew(define_id, &target).await;
        outcome
    }

    /// Ask for the next batch when the request only covers one.
    async fn renew(&self, define_id: DefineId, target: &DataTarget) {
        if !target.request.period.needs_renewal() {
            return;
        }
        let renew = Command::RequestData {
            request_id: define_id.0,
            define_id,
            object_id: target.request.object_id,
            period: target.request.period,
            flags: 0,
        };
        if let Err(e) = self.shared.transport.send(renew).await {
            warn!(%define_id, error = %e, "Failed to renew data request");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Closes the transport and publishes [`ConnectionState::Closed`] when the
/// dispatch task ends.
///
/// [`ShutdownGuard::close`] is the normal exit. If the task unwinds or is
/// aborted instead, `Drop` publishes the state and spawns the close.
struct ShutdownGuard {
    shared: Arc<ClientShared>,
    transport_closed: bool,
}

impl ShutdownGuard {
    fn new(shared: Arc<ClientShared>) -> Self {
        Self {
            shared,
            transport_closed: false,
        }
    }

    async fn close(mut self) {
        if let Err(e) = self.shared.transport.close().await {
            warn!(error = %e, "Failed to close transport");
        }
        self.transport_closed = true;
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.shared.state.send_replace(ConnectionState::Closed);
        if self.transport_closed {
            return;
        }
        warn!("Dispatch task ended abnormally; closing transport");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let transport = Arc::clone(&self.shared.transport);
                handle.spawn(async move {
                    if let Err(e) = transport.close().await {
                        warn!(error = %e, "Failed to close transport");
                    }
                });
            }
            Err(_) => warn!("No runtime left to close the transport on"),
        }
    }
}
