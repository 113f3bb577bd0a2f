//! Client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use simlink_protocol::ObjectId;

use crate::error::{ClientError, ClientResult};
use crate::transport::RequestPeriod;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Name announced to the simulator when opening
    pub application_name: String,
    /// Dispatch loop sleep, also the longest a full channel may hold it up
    pub poll_interval_ms: u64,
    /// Buffered batches per data subscription
    pub data_channel_capacity: usize,
    /// Buffered occurrences per event subscription
    pub event_channel_capacity: usize,
    /// Object read and written when a call does not name one
    pub default_object_id: ObjectId,
    /// Answer period used for data subscriptions
    pub request_period: RequestPeriod,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            application_name: "simlink".to_string(),
            poll_interval_ms: 100,
            data_channel_capacity: 16,
            event_channel_capacity: 32,
            default_object_id: ObjectId::USER,
            request_period: RequestPeriod::Once,
        }
    }
}

impl ClientConfig {
    /// Parse a YAML document; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] if the document does not parse
    /// or fails validation.
    pub fn from_yaml_str(yaml: &str) -> ClientResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> ClientResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.data_channel_capacity == 0 {
            return Err(ClientError::InvalidConfig(
                "data_channel_capacity must be greater than zero".to_string(),
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(ClientError::InvalidConfig(
                "event_channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Set the application name
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// Set the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the data channel capacity
    pub fn with_data_channel_capacity(mut self, capacity: usize) -> Self {
        self.data_channel_capacity = capacity;
        self
    }

    /// Set the event channel capacity
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    /// Set the default object
    pub fn with_default_object(mut self, object_id: ObjectId) -> Self {
        self.default_object_id = object_id;
        self
    }

    /// Set the data request period
    pub fn with_request_period(mut self, period: RequestPeriod) -> Self {
        self.request_period = period;
        self
    }

    /// Subscription options derived from this configuration
    pub fn subscription_defaults(&self) -> SubscriptionOptions {
        SubscriptionOptions {
            object_id: self.default_object_id,
            period: self.request_period,
        }
    }
}

/// Per-subscription overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubscriptionOptions {
    /// Object to read
    pub object_id: ObjectId,
    /// Answer period
    pub period: RequestPeriod,
}

impl SubscriptionOptions {
    /// Read a different object
    pub fn object(mut self, object_id: ObjectId) -> Self {
        self.object_id = object_id;
        self
    }

    /// Use a different period
    pub fn period(mut self, period: RequestPeriod) -> Self {
        self.period = period;
        self
    }
}
