//! In-process transport backed by a queue.
//!
//! [`MemoryTransport`] stands in for a simulator: callers push encoded
//! notifications into its inbox and inspect the commands the client sent.
//! Clones share the same state, so a test keeps one handle while the client
//! owns another.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use simlink_protocol::{OpenRecord, Version4};

use crate::error::{TransportError, TransportResult};
use crate::transport::{Command, Transport};

#[derive(Debug, Default)]
struct MemoryState {
    open: bool,
    closed: bool,
    application_name: Option<String>,
    open_failure: Option<String>,
    announce_open: bool,
    inbox: VecDeque<Vec<u8>>,
    sent: Vec<Command>,
    rejected_names: HashSet<String>,
    pending_poll_errors: usize,
    close_count: usize,
}

/// Queue-backed transport for tests and offline use.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// Simulator name reported in the automatic open record
    pub const SIMULATOR_NAME: &'static str = "simlink memory simulator";

    /// Create a transport that answers `open` with an open record
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                announce_open: true,
                ..MemoryState::default()
            })),
        }
    }

    /// Do not queue an open record when the connection opens
    pub fn without_open_record(self) -> Self {
        self.state.lock().announce_open = false;
        self
    }

    /// Make the next `open` fail with the given reason
    pub fn fail_open(&self, reason: impl Into<String>) {
        self.state.lock().open_failure = Some(reason.into());
    }

    /// Reject data definition entries naming this variable
    pub fn reject_variable(&self, name: impl Into<String>) {
        self.state.lock().rejected_names.insert(name.into());
    }

    /// Queue a raw notification
    pub fn push_notification(&self, bytes: Vec<u8>) {
        self.state.lock().inbox.push_back(bytes);
    }

    /// Make the next `count` polls fail with a recoverable error
    pub fn inject_poll_errors(&self, count: usize) {
        self.state.lock().pending_poll_errors = count;
    }

    /// Commands sent so far
    pub fn sent_commands(&self) -> Vec<Command> {
        self.state.lock().sent.clone()
    }

    /// Notifications not yet polled
    pub fn pending_notifications(&self) -> usize {
        self.state.lock().inbox.len()
    }

    /// Application name passed to `open`
    pub fn application_name(&self) -> Option<String> {
        self.state.lock().application_name.clone()
    }

    /// Whether the connection is open
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Number of `close` calls received
    pub fn close_count(&self) -> usize {
        self.state.lock().close_count
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    async fn open(&self, application_name: &str) -> TransportResult<()> {
        let mut state = self.state.lock();
        if let Some(reason) = state.open_failure.take() {
            return Err(TransportError::Open(reason));
        }
        state.open = true;
        state.closed = false;
        state.application_name = Some(application_name.to_string());
        if state.announce_open {
            let record = OpenRecord {
                application_name: Self::SIMULATOR_NAME.to_string(),
                application_version: Version4 {
                    major: 1,
                    ..Version4::default()
                },
                interface_version: Version4 {
                    major: 1,
                    ..Version4::default()
                },
            };
            state.inbox.push_back(record.encode());
        }
        Ok(())
    }

    async fn close(&self) -> TransportResult<()> {
        let mut state = self.state.lock();
        state.open = false;
        state.closed = true;
        state.close_count = state.close_count.saturating_add(1);
        Ok(())
    }

    async fn send(&self, command: Command) -> TransportResult<()> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(TransportError::Closed);
        }
        if let Command::AddToDefinition { name, .. } = &command
            && state.rejected_names.contains(name)
        {
            return Err(TransportError::rejected(format!(
                "unrecognized variable {name:?}"
            )));
        }
        state.sent.push(command);
        Ok(())
    }

    async fn next_notification(&self) -> TransportResult<Option<Vec<u8>>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        if state.pending_poll_errors > 0 {
            state.pending_poll_errors -= 1;
            return Err(TransportError::Poll("injected poll failure".to_string()));
        }
        Ok(state.inbox.pop_front())
    }
}
