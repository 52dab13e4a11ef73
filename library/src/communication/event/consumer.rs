use super::{Notification, NotificationFrame, QueueEntry, RawQueueEntry};
use crate::helpers::lossy_preview;
use crate::EmptyResult;
use async_trait::async_trait;
use std::any::type_name;
use tracing::{debug, warn};

const PAYLOAD_PREVIEW_LENGTH: usize = 512;

/// Entity which may consume and process [`Notifications`](Notification)
#[async_trait]
pub trait Consumer {
    /// Notification to consume
    type Notification: Notification + Send + Sync;

    /// Processes an event notification and returns whether it succeeded or failed
    async fn consume(&self, notification: NotificationFrame<Self::Notification>) -> EmptyResult;
}

/// Result of handing a single queue entry to a [`Consumer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Consumer processed the notification successfully
    Processed,
    /// Consumer returned an error
    Failed,
    /// Payload could not be decoded or did not match the notification shape
    Malformed,
}

/// Helper functions to aid the consumption of messages
#[async_trait]
pub trait ConsumerExt {
    /// Parses the entry, hands it to the consumer and acknowledges it afterwards.
    ///
    /// Entries are acknowledged regardless of the outcome. Malformed entries and consumer
    /// failures are logged and never retried.
    async fn process_entry<E>(&self, entry: E) -> EntryOutcome
    where
        E: RawQueueEntry + Send + Sync;
}

#[async_trait]
impl<C> ConsumerExt for C
where
    C: Consumer + Send + Sync,
{
    async fn process_entry<E>(&self, mut entry: E) -> EntryOutcome
    where
        E: RawQueueEntry + Send + Sync,
    {
        let notification_type = type_name::<C::Notification>();

        let outcome = match entry.parse_payload::<C::Notification>() {
            Ok(notification) => match self.consume(notification).await {
                Ok(_) => EntryOutcome::Processed,
                Err(error) => {
                    warn!(
                        id = entry.id(),
                        notification_type,
                        %error,
                        "Failed to consume notification"
                    );
                    EntryOutcome::Failed
                }
            },
            Err(error) => {
                warn!(
                    id = entry.id(),
                    notification_type,
                    %error,
                    payload = %lossy_preview(entry.payload(), PAYLOAD_PREVIEW_LENGTH),
                    "Skipping malformed notification"
                );
                EntryOutcome::Malformed
            }
        };

        if let Err(error) = entry.acknowledge().await {
            warn!(id = entry.id(), notification_type, %error, "Failed to acknowledge notification");
        } else {
            debug!(id = entry.id(), ?outcome, "Acknowledged notification");
        }

        outcome
    }
}
