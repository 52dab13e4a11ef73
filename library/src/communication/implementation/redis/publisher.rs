use super::super::super::event::{PublishError, QueueDescriptor, RawNotificationPublisher};
use super::super::json::JsonNotificationPublisher;
use super::{RedisFactory, STREAM_ID_NEW, STREAM_ORDERING_KEY, STREAM_PAYLOAD_KEY};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::streams::StreamMaxlen;
use redis::{AsyncCommands, RedisError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// [`NotificationPublisher`](super::super::super::event::NotificationPublisher) implementation using [`XADD`](https://redis.io/commands/xadd)
///
/// The connection has to be established explicitly with [`connect`](RedisPublisher::connect)
/// before publishing, otherwise [`PublishError::NotConnected`] is returned. Clones share the connection.
#[derive(Clone)]
pub struct RedisPublisher {
    factory: RedisFactory,
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
}

impl RedisPublisher {
    /// Creates a new, disconnected instance
    pub fn new(factory: RedisFactory) -> Self {
        Self {
            factory,
            connection: Arc::new(RwLock::new(None)),
        }
    }

    /// Establishes the broker connection
    pub async fn connect(&self) -> Result<(), PublishError> {
        let connection = self
            .factory
            .multiplexed()
            .await
            .map_err(PublishError::Connection)?;

        *self.connection.write().await = Some(connection);
        debug!("Publisher connected");

        Ok(())
    }

    /// Releases the broker connection, subsequent publish calls fail
    pub async fn disconnect(&self) {
        if self.connection.write().await.take().is_some() {
            debug!("Publisher disconnected");
        }
    }
}

fn classify(error: RedisError) -> PublishError {
    if error.is_io_error() || error.is_timeout() || error.is_connection_dropped() {
        PublishError::Connection(error.into())
    } else {
        PublishError::Rejected(error.into())
    }
}

impl JsonNotificationPublisher for RedisPublisher {}

#[async_trait]
impl RawNotificationPublisher for RedisPublisher {
    async fn publish_raw(
        &self,
        data: &[u8],
        descriptor: QueueDescriptor,
        key: Option<String>,
    ) -> Result<(), PublishError> {
        let mut con = self
            .connection
            .read()
            .await
            .clone()
            .ok_or(PublishError::NotConnected)?;

        let limit = StreamMaxlen::Approx(descriptor.limit());
        let mut fields: Vec<(&str, &[u8])> = vec![(STREAM_PAYLOAD_KEY, data)];
        if let Some(key) = &key {
            fields.push((STREAM_ORDERING_KEY, key.as_bytes()));
        }

        let id: String = con
            .xadd_maxlen(descriptor.key(), limit, STREAM_ID_NEW, fields.as_slice())
            .await
            .map_err(classify)?;

        trace!(queue = descriptor.key(), %id, "Published notification");
        Ok(())
    }
}
