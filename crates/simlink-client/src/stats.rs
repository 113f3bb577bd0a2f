//! Dispatch loop counters.
//!
//! The loop increments these from its single task; any caller may read a
//! [`DispatchStatsSnapshot`] at any time. All counters use `Ordering::Relaxed`
//! since they are independent and only need eventual consistency.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counter snapshot returned by [`DispatchStats::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStatsSnapshot {
    /// Notifications pulled from the transport
    pub notifications: u64,
    /// Data batches handed to a consumer
    pub batches_delivered: u64,
    /// Data batches discarded because the consumer fell behind
    pub batches_dropped: u64,
    /// Data notifications for an unknown definition
    pub unknown_definitions: u64,
    /// Data notifications that failed count, width or bounds checks
    pub decode_failures: u64,
    /// Events handed to a consumer
    pub events_delivered: u64,
    /// Events with no registered consumer
    pub events_unclaimed: u64,
    /// Event callbacks that panicked
    pub callback_panics: u64,
    /// Exception records observed
    pub exceptions: u64,
    /// Recoverable transport poll failures
    pub poll_errors: u64,
}

/// Atomic counters shared between the dispatch task and callers.
#[derive(Debug, Default)]
pub struct DispatchStats {
    notifications: AtomicU64,
    batches_delivered: AtomicU64,
    batches_dropped: AtomicU64,
    unknown_definitions: AtomicU64,
    decode_failures: AtomicU64,
    events_delivered: AtomicU64,
    events_unclaimed: AtomicU64,
    callback_panics: AtomicU64,
    exceptions: AtomicU64,
    poll_errors: AtomicU64,
}

impl DispatchStats {
    /// Create zeroed counters
    pub const fn new() -> Self {
        Self {
            notifications: AtomicU64::new(0),
            batches_delivered: AtomicU64::new(0),
            batches_dropped: AtomicU64::new(0),
            unknown_definitions: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            events_delivered: AtomicU64::new(0),
            events_unclaimed: AtomicU64::new(0),
            callback_panics: AtomicU64::new(0),
            exceptions: AtomicU64::new(0),
            poll_errors: AtomicU64::new(0),
        }
    }

    pub(crate) fn inc_notification(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_batch_delivered(&self) {
        self.batches_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_batch_dropped(&self) {
        self.batches_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_unknown_definition(&self) {
        self.unknown_definitions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_event_delivered(&self) {
        self.events_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_event_unclaimed(&self) {
        self.events_unclaimed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_callback_panic(&self) {
        self.callback_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_exception(&self) {
        self.exceptions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_poll_error(&self) {
        self.poll_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            notifications: self.notifications.load(Ordering::Relaxed),
            batches_delivered: self.batches_delivered.load(Ordering::Relaxed),
            batches_dropped: self.batches_dropped.load(Ordering::Relaxed),
            unknown_definitions: self.unknown_definitions.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            events_unclaimed: self.events_unclaimed.load(Ordering::Relaxed),
            callback_panics: self.callback_panics.load(Ordering::Relaxed),
            exceptions: self.exceptions.load(Ordering::Relaxed),
            poll_errors: self.poll_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_increments() {
        let stats = DispatchStats::new();
        stats.inc_notification();
        stats.inc_notification();
        stats.inc_batch_delivered();
        stats.inc_batch_dropped();
        stats.inc_poll_error();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.notifications, 2);
        assert_eq!(snapshot.batches_delivered, 1);
        assert_eq!(snapshot.batches_dropped, 1);
        assert_eq!(snapshot.poll_errors, 1);
        assert_eq!(snapshot.exceptions, 0);
    }
}
