//! Cleanup coordinator configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::cleanup::CoordinatorConfig;
use crate::domain::cleanup::{Topic, LAST_PRIVATE_CONTEXT_EXITED};

/// Upper bound for `completion_timeout_ms` (24 hours).
const MAX_COMPLETION_TIMEOUT_MS: u64 = 86_400_000;

/// Cleanup coordinator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// Topic broadcast at the start of each cycle
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Deadline for `run_cycle` in milliseconds (unset waits forever)
    pub completion_timeout_ms: Option<u64>,
}

impl CleanupConfig {
    /// Get the completion timeout as a Duration
    pub fn completion_timeout(&self) -> Option<Duration> {
        self.completion_timeout_ms.map(Duration::from_millis)
    }

    /// Build the coordinator settings from this section
    pub fn coordinator_config(&self) -> Result<CoordinatorConfig, ValidationError> {
        let topic =
            Topic::new(self.topic.as_str()).map_err(|e| ValidationError::InvalidTopic(e.to_string()))?;

        let mut config = CoordinatorConfig::default().with_topic(topic);
        if let Some(timeout) = self.completion_timeout() {
            config = config.with_completion_timeout(timeout);
        }
        Ok(config)
    }

    /// Validate cleanup configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.topic.is_empty() {
            return Err(ValidationError::MissingRequired("cleanup.topic"));
        }
        if let Some(ms) = self.completion_timeout_ms {
            if ms == 0 || ms > MAX_COMPLETION_TIMEOUT_MS {
                return Err(ValidationError::InvalidTimeout);
            }
        }
        self.coordinator_config().map(|_| ())
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            completion_timeout_ms: None,
        }
    }
}

fn default_topic() -> String {
    LAST_PRIVATE_CONTEXT_EXITED.to_string()
}
