use super::{ConsumerGroupDescriptor, QueueDescriptor, RawQueueEntry};
use crate::{BoxedError, EmptyResult};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;

/// Allows consumption of notification queues using [consumer groups](ConsumerGroupDescriptor)
#[async_trait]
pub trait QueueProvider {
    /// Type of [`RawQueueEntry`] returned by the provider
    type Entry: RawQueueEntry + Send + Sync;

    /// Establishes the connection to the broker
    async fn connect(&self) -> EmptyResult;

    /// Subscribes to new notifications on a given queue joining the specified [`ConsumerGroup`](ConsumerGroupDescriptor)
    /// with the given consumer name, creating the group if it does not exist.
    ///
    /// Entries which have been delivered to this consumer before but never acknowledged are
    /// yielded first. The stream ends when no entry arrived within `idle_timeout` (if any)
    /// or the connection is lost.
    async fn consume(
        &self,
        queue: QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        batch_size: usize,
        idle_timeout: Option<Duration>,
    ) -> Result<BoxStream<'static, Result<Self::Entry, BoxedError>>, BoxedError>;

    /// Releases the connection to the broker
    async fn disconnect(&self);
}
