//! Consumer registry.
//!
//! Data consumers are keyed by [`DefineId`], event consumers by an
//! [`EventId`] this registry hands out densely. Both live in index-addressed
//! vectors behind one mutex each. Lookups clone the delivery target and drop
//! the lock before anything is delivered, so a callback or a full channel
//! never holds up a registration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use simlink_protocol::{DecodedVariable, DefineId, EventId, ObjectId};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};

use crate::mapping::MappedRecord;
use crate::transport::RequestPeriod;

/// One occurrence of a subscribed or transmitted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventNotification {
    /// Handle the event was registered under
    pub event_id: EventId,
    /// Notification group
    pub group_id: u32,
    /// Event parameter
    pub data: u32,
    /// File name carried by file-related events
    pub filename: Option<String>,
}

impl EventNotification {
    /// Event parameter read as a flag
    pub fn as_bool(&self) -> bool {
        self.data != 0
    }
}

/// Callback run for every occurrence of a continuous subscription
pub type EventCallback = Arc<dyn Fn(&EventNotification) + Send + Sync>;

/// Callback run for the first occurrence only
pub type OneShotCallback = Box<dyn FnOnce(EventNotification) + Send>;

enum EventConsumer {
    Continuous(EventCallback),
    /// `None` once fired; the slot stays so the id is never reissued
    OneShot(Option<OneShotCallback>),
    /// Subscriber went away
    Retired,
}

/// Callback taken out of the registry for one occurrence.
pub(crate) enum EventTarget {
    Continuous(EventCallback),
    OneShot(OneShotCallback),
}

impl EventTarget {
    pub(crate) fn invoke(self, notification: EventNotification) {
        match self {
            EventTarget::Continuous(callback) => callback(&notification),
            EventTarget::OneShot(callback) => callback(notification),
        }
    }
}

/// Parameters needed to renew a data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RequestSpec {
    pub(crate) object_id: ObjectId,
    pub(crate) period: RequestPeriod,
}

/// Where decoded batches for one definition go.
#[derive(Clone)]
pub(crate) enum DataSink {
    /// Raw batches
    Batch(mpsc::Sender<Vec<DecodedVariable>>),
    /// Batches keyed by caller field names, one name per accepted variable
    Record {
        fields: Arc<[String]>,
        tx: mpsc::Sender<MappedRecord>,
    },
}

/// Result of handing one batch to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    /// Channel stayed full for the whole wait
    Full,
    /// Receiver dropped
    Closed,
}

impl DataSink {
    /// Try a non-blocking send, then wait at most `wait` for room.
    pub(crate) async fn deliver(&self, batch: Vec<DecodedVariable>, wait: Duration) -> Delivery {
        match self {
            DataSink::Batch(tx) => send_bounded(tx, batch, wait).await,
            DataSink::Record { fields, tx } => {
                let record = MappedRecord::new(Arc::clone(fields), batch);
                send_bounded(tx, record, wait).await
            }
        }
    }
}

async fn send_bounded<T>(tx: &mpsc::Sender<T>, value: T, wait: Duration) -> Delivery {
    match tx.try_send(value) {
        Ok(()) => Delivery::Delivered,
        Err(TrySendError::Closed(_)) => Delivery::Closed,
        Err(TrySendError::Full(value)) => match tx.send_timeout(value, wait).await {
            Ok(()) => Delivery::Delivered,
            Err(SendTimeoutError::Timeout(_)) => Delivery::Full,
            Err(SendTimeoutError::Closed(_)) => Delivery::Closed,
        },
    }
}

/// Snapshot of a data consumer handed to the dispatch loop.
#[derive(Clone)]
pub(crate) struct DataTarget {
    pub(crate) sink: DataSink,
    pub(crate) request: RequestSpec,
}

impl fmt::Debug for DataTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sink = match self.sink {
            DataSink::Batch(_) => "batch",
            DataSink::Record { .. } => "record",
        };
        f.debug_struct("DataTarget")
            .field("sink", &sink)
            .field("request", &self.request)
            .finish()
    }
}

/// Delivery targets for data and events.
#[derive(Default)]
pub struct ConsumerRegistry {
    data: Mutex<Vec<Option<DataTarget>>>,
    events: Mutex<Vec<EventConsumer>>,
}

impl fmt::Debug for ConsumerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerRegistry")
            .field("data_consumers", &self.data_consumers())
            .field("event_ids_issued", &self.events.lock().len())
            .finish()
    }
}

impl ConsumerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register_data(&self, define_id: DefineId, target: DataTarget) {
        let mut data = self.data.lock();
        let index = define_id.index();
        if data.len() <= index {
            data.resize_with(index.saturating_add(1), || None);
        }
        if let Some(slot) = data.get_mut(index) {
            *slot = Some(target);
        }
    }

    pub(crate) fn data_target(&self, define_id: DefineId) -> Option<DataTarget> {
        self.data.lock().get(define_id.index()).cloned().flatten()
    }

    /// Stop delivering to a definition whose receiver has gone away
    pub(crate) fn retire_data(&self, define_id: DefineId) {
        if let Some(slot) = self.data.lock().get_mut(define_id.index()) {
            *slot = None;
        }
    }

    /// Number of live data consumers
    pub fn data_consumers(&self) -> usize {
        self.data.lock().iter().filter(|slot| slot.is_some()).count()
    }

    fn push_event(&self, consumer: EventConsumer) -> EventId {
        let mut events = self.events.lock();
        let id = EventId(u32::try_from(events.len()).unwrap_or(u32::MAX));
        events.push(consumer);
        id
    }

    /// Register a callback that runs for every occurrence
    pub fn register_continuous(&self, callback: EventCallback) -> EventId {
        self.push_event(EventConsumer::Continuous(callback))
    }

    /// Register a callback that runs for the first occurrence only
    pub fn register_one_shot(&self, callback: OneShotCallback) -> EventId {
        self.push_event(EventConsumer::OneShot(Some(callback)))
    }

    /// Stop delivering an event whose subscriber has gone away.
    ///
    /// The slot is kept so the id is never reissued.
    pub(crate) fn retire_event(&self, event_id: EventId) {
        if let Some(slot) = self.events.lock().get_mut(event_id.index()) {
            *slot = EventConsumer::Retired;
        }
    }

    /// Whether this registry ever handed out the id
    pub(crate) fn event_issued(&self, event_id: EventId) -> bool {
        event_id.index() < self.events.lock().len()
    }

    /// Number of event ids that still have a callback
    pub fn live_event_consumers(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|consumer| match consumer {
                EventConsumer::Continuous(_) => true,
                EventConsumer::OneShot(slot) => slot.is_some(),
                EventConsumer::Retired => false,
            })
            .count()
    }

    /// Take the callback for one occurrence.
    ///
    /// A one-shot consumer is emptied here, so a second occurrence with the
    /// same id finds nothing.
    pub(crate) fn take_event_target(&self, event_id: EventId) -> Option<EventTarget> {
        let mut events = self.events.lock();
        match events.get_mut(event_id.index())? {
            EventConsumer::Continuous(callback) => {
                Some(EventTarget::Continuous(Arc::clone(callback)))
            }
            EventConsumer::OneShot(slot) => slot.take().map(EventTarget::OneShot),
            EventConsumer::Retired => None,
        }
    }
}
