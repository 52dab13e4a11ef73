//! Serialization provided by [`serde_json`] using marker traits
//!
//! Implementors of the raw, byte-oriented publishing traits receive the higher-level, strongly
//! typed traits for free by implementing the marker traits in this module. Every notification
//! is wrapped into a [`NotificationFrame`] before it is encoded.

use super::super::event::{
    Notification, NotificationFrame, NotificationPublisher, PublishError,
    RawNotificationPublisher,
};
use super::super::encode;
use async_trait::async_trait;

/// Marker trait providing a default [`NotificationPublisher`] implementation based on [`serde_json`]
pub trait JsonNotificationPublisher: RawNotificationPublisher + Send + Sync {}

#[async_trait]
impl<P> NotificationPublisher for P
where
    P: JsonNotificationPublisher,
{
    async fn publish<N: Notification + Send + Sync>(
        &self,
        notification: &N,
    ) -> Result<(), PublishError> {
        let frame = NotificationFrame::borrowed(notification);
        let data = encode(&frame)?;

        self.publish_raw(&data, N::queue(), notification.key())
            .await
    }
}
