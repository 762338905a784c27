//! Controller configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::QuizError;
use crate::core::constants::DEFAULT_CONNECTION_TIMEOUT;

/// Settings for a [`QuizController`](super::QuizController).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// A box silent for longer than this shows as not connected.
    pub connection_timeout: Duration,

    /// Step the question number when a scheduled reset runs.
    pub advance_on_clear: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            advance_on_clear: false,
        }
    }
}

impl ControllerConfig {
    /// Create a builder with default values.
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.connection_timeout.is_zero() {
            return Err(QuizError::Config(
                "connection_timeout must be non-zero".to_string(),
            ));
        }
        if self.connection_timeout < Duration::from_millis(500) {
            tracing::warn!(
                timeout = ?self.connection_timeout,
                "connection_timeout is short, boxes will flicker offline"
            );
        }
        Ok(())
    }
}

/// Builder for [`ControllerConfig`].
#[derive(Debug, Default)]
pub struct ControllerConfigBuilder {
    config: ControllerConfig,
}

impl ControllerConfigBuilder {
    /// Set the connection timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout = timeout;
        self
    }

    /// Enable or disable advance-on-clear.
    pub fn advance_on_clear(mut self, enabled: bool) -> Self {
        self.config.advance_on_clear = enabled;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<ControllerConfig, QuizError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
