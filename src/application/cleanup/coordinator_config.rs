//! Configuration for the cleanup coordinator.

use std::time::Duration;

use crate::domain::cleanup::Topic;

/// Coordinator settings.
///
/// | Setting | Default | Description |
/// |---------|---------|-------------|
/// | `topic` | `last-pb-context-exited` | Topic broadcast at cycle start |
/// | `completion_timeout` | none | Deadline applied by `run_cycle` |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Topic observers subscribe to.
    pub topic: Topic,

    /// How long `run_cycle` waits for the callback before giving up.
    ///
    /// `None` waits forever. Expiry never cancels the cycle; it only
    /// stops the caller from waiting on it.
    pub completion_timeout: Option<Duration>,
}

impl CoordinatorConfig {
    /// Create config with a custom topic.
    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.topic = topic;
        self
    }

    /// Create config with a completion deadline.
    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = Some(timeout);
        self
    }
}
