//! Link session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::LinkError;
use crate::core::constants::{
    DEFAULT_FRAME_POLL, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_IDLE_POLL, DEFAULT_QUEUE_CAPACITY,
    MAX_FRAME_LEN,
};
use crate::protocol::Firmware;

/// Settings for one [`ConnectionSession`](super::ConnectionSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lines buffered for `next_message` before the oldest is dropped.
    pub queue_capacity: usize,

    /// How long to wait for the version reply after open.
    pub handshake_timeout: Duration,

    /// Whether to run the version handshake at all.
    pub handshake: bool,

    /// Poll interval while a frame is half read.
    pub frame_poll: Duration,

    /// Poll interval while the transport is idle.
    pub idle_poll: Duration,

    /// Longest accepted line body.
    pub max_frame_len: usize,

    /// Base station firmware generation.
    pub firmware: Firmware,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            handshake: true,
            frame_poll: DEFAULT_FRAME_POLL,
            idle_poll: DEFAULT_IDLE_POLL,
            max_frame_len: MAX_FRAME_LEN,
            firmware: Firmware::default(),
        }
    }
}

impl SessionConfig {
    /// Create a builder with default values.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// Returns an error if values are out of range.
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.queue_capacity == 0 {
            return Err(LinkError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_frame_len < 8 {
            return Err(LinkError::InvalidConfig(
                "max_frame_len must be at least 8".to_string(),
            ));
        }
        if self.frame_poll.is_zero() || self.idle_poll.is_zero() {
            return Err(LinkError::InvalidConfig(
                "poll intervals must be non-zero".to_string(),
            ));
        }

        if self.queue_capacity > 100_000 {
            tracing::warn!(
                capacity = self.queue_capacity,
                "queue_capacity is very large, stale lines may pile up"
            );
        }
        if self.idle_poll > Duration::from_secs(1) {
            tracing::warn!(
                idle_poll = ?self.idle_poll,
                "idle_poll is long, polled transports will lag"
            );
        }

        Ok(())
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the handshake deadline.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Enable or disable the version handshake.
    pub fn handshake(mut self, enabled: bool) -> Self {
        self.config.handshake = enabled;
        self
    }

    /// Set the mid-frame poll interval.
    pub fn frame_poll(mut self, interval: Duration) -> Self {
        self.config.frame_poll = interval;
        self
    }

    /// Set the idle poll interval.
    pub fn idle_poll(mut self, interval: Duration) -> Self {
        self.config.idle_poll = interval;
        self
    }

    /// Set the longest accepted line.
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.config.max_frame_len = len;
        self
    }

    /// Set the firmware generation.
    pub fn firmware(mut self, firmware: Firmware) -> Self {
        self.config.firmware = firmware;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<SessionConfig, LinkError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.handshake_timeout, Duration::from_millis(5000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects() {
        assert!(SessionConfig::builder().queue_capacity(0).build().is_err());
        assert!(SessionConfig::builder().max_frame_len(2).build().is_err());
        let err = SessionConfig::builder()
            .idle_poll(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.is_precondition());
    }
}
