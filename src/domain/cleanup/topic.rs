//! Notification topic value object.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Topic broadcast when the last private browsing context exits.
pub const LAST_PRIVATE_CONTEXT_EXITED: &str = "last-pb-context-exited";

/// Validated name of a notification topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    /// Creates a topic, rejecting empty names and names containing whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("topic"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(ValidationError::invalid_format(
                "topic",
                "must not contain whitespace",
            ));
        }
        Ok(Self(name))
    }

    /// The topic fired at the end of a private browsing session.
    pub fn last_private_context_exited() -> Self {
        Self(LAST_PRIVATE_CONTEXT_EXITED.to_string())
    }

    /// Returns the topic name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Topic {
    fn default() -> Self {
        Self::last_private_context_exited()
    }
}

impl TryFrom<String> for Topic {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Topic::new(value)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
