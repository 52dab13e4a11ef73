use super::QueueLocation;
use std::fmt;

/// Unique identifier for a group of consumers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConsumerGroupIdentifier(String);

impl ConsumerGroupIdentifier {
    /// Creates a new identifier, it must stay stable across restarts
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    /// Raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConsumerGroupIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConsumerGroupIdentifier {
    fn from(identifier: &str) -> Self {
        Self::new(identifier)
    }
}

/// Definition of a consumer group
///
/// In a message queue, a group of consumers collaborates to consume messages.
/// Each message is only delivered to one consumer within the same group, identified
/// by a [`ConsumerGroupIdentifier`]. When it is created, the group starts processing messages
/// from the provided [`QueueLocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerGroupDescriptor {
    identifier: ConsumerGroupIdentifier,
    start: QueueLocation,
}

impl ConsumerGroupDescriptor {
    /// Creates a new instance from raw parts
    pub fn new(identifier: ConsumerGroupIdentifier, start: QueueLocation) -> Self {
        Self { identifier, start }
    }

    /// Unique identifier of the group
    pub fn identifier(&self) -> &ConsumerGroupIdentifier {
        &self.identifier
    }

    /// Location from where a consumer group begins to consume messages
    ///
    /// Note that it is not honored when the group already exists, it then resumes from its last acknowledged position!
    pub fn start(&self) -> QueueLocation {
        self.start
    }
}

/// Unique identifier of a consumer within a [`ConsumerGroup`](ConsumerGroupDescriptor)
pub type ConsumerIdentifier = String;
