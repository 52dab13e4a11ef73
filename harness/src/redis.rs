use library::communication::implementation::redis::{
    RedisFactory, RedisPublisher, RedisQueueProvider,
};
use library::communication::CommunicationFactory;
use library::BoxedError;

/// [`CommunicationFactory`] implementation for Redis Streams
///
/// Every queue provider handed out owns a dedicated connection, as reading a stream blocks it.
/// Publishers share one multiplexed connection which has to be
/// [connected](RedisPublisher::connect) explicitly.
#[derive(Clone)]
pub struct RedisCommunicationFactory {
    factory: RedisFactory,
    publisher: RedisPublisher,
}

impl RedisCommunicationFactory {
    /// Creates a new instance for the server at the given URL without connecting to it
    pub fn new(url: &str) -> Result<Self, BoxedError> {
        let factory = RedisFactory::new(url)?;
        let publisher = RedisPublisher::new(factory.clone());

        Ok(Self { factory, publisher })
    }
}

impl CommunicationFactory for RedisCommunicationFactory {
    type QueueProvider = RedisQueueProvider;
    type NotificationPublisher = RedisPublisher;

    fn queue_provider(&self) -> Self::QueueProvider {
        RedisQueueProvider::new(self.factory.clone())
    }

    fn notification_publisher(&self) -> Self::NotificationPublisher {
        self.publisher.clone()
    }
}
