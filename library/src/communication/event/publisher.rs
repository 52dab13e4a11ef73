use super::{Notification, QueueDescriptor};
use crate::communication::CodecError;
use crate::BoxedError;
use async_trait::async_trait;
use thiserror::Error;

/// Reasons why a notification could not be published
#[derive(Debug, Error)]
pub enum PublishError {
    /// Notification could not be serialized
    #[error("unable to encode notification")]
    Encoding(#[from] CodecError),
    /// Publisher has not been connected or was disconnected
    #[error("publisher is not connected to the broker")]
    NotConnected,
    /// Broker could not be reached
    #[error("unable to reach the broker")]
    Connection(#[source] BoxedError),
    /// Broker refused to store the notification
    #[error("broker rejected the notification")]
    Rejected(#[source] BoxedError),
}

/// Structure which allows publishing of serialized data into a queue
#[async_trait]
pub trait RawNotificationPublisher {
    /// Sends an opaque payload to a [`Queue`](QueueDescriptor) and waits for the broker to acknowledge it
    async fn publish_raw(
        &self,
        data: &[u8],
        descriptor: QueueDescriptor,
        key: Option<String>,
    ) -> Result<(), PublishError>;
}

/// Publisher for [`Notifications`](Notification)
#[async_trait]
pub trait NotificationPublisher {
    /// Publishes a [`Notification`] to its designated queue
    async fn publish<N: Notification + Send + Sync>(
        &self,
        notification: &N,
    ) -> Result<(), PublishError>;
}
