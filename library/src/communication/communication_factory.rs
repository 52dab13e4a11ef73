use super::event::{NotificationPublisher, QueueProvider};

/// Factory for the communication primitives of one broker implementation
///
/// Services are instantiated with a factory instead of concrete types so that they can run
/// against the in-memory broker in tests and against Redis in production.
pub trait CommunicationFactory {
    /// Provider used to consume notification queues
    type QueueProvider: QueueProvider + Send + Sync;
    /// Publisher used to emit notifications
    type NotificationPublisher: NotificationPublisher + Send + Sync;

    /// Creates a new queue provider
    fn queue_provider(&self) -> Self::QueueProvider;

    /// Creates a new notification publisher
    fn notification_publisher(&self) -> Self::NotificationPublisher;
}
