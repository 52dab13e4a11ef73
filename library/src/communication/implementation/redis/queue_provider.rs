use super::super::super::event::{
    ConsumerGroupDescriptor, QueueDescriptor, QueueLocation, QueueProvider,
};
use super::{
    RedisFactory, RedisQueueEntry, RedisQueueError, STREAM_ID_ADDITIONS, STREAM_ID_HEAD,
    STREAM_ID_TAIL,
};
use crate::{BoxedError, EmptyResult};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use redis::aio::Connection;
use redis::streams::{StreamId, StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, RedisResult};
use std::convert::TryInto;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Queue provider implementation using [Redis Streams](https://redis.io/topics/streams-intro)
pub struct RedisQueueProvider {
    factory: RedisFactory,
    connection: Mutex<Option<Connection>>,
}

impl RedisQueueProvider {
    /// Creates a new, disconnected instance
    pub fn new(factory: RedisFactory) -> Self {
        Self {
            factory,
            connection: Mutex::new(None),
        }
    }
}

#[async_trait]
impl QueueProvider for RedisQueueProvider {
    type Entry = RedisQueueEntry;

    /// Opens the dedicated connection used for the blocking `XREADGROUP` command
    async fn connect(&self) -> EmptyResult {
        let connection = self.factory.owned().await?;
        *self.connection.lock().await = Some(connection);
        Ok(())
    }

    /// Consumes a redis stream data structure using the following steps:
    ///
    /// 1. Create the stream and/or consumer group if it does not exist
    /// 2. Start streaming entries from the PEL until the queue head is reached
    /// 3. Wait for and stream new entries in a blocking manner
    /// 4. Bail if no messages has been received within `idle_timeout` or block indefinitely
    async fn consume(
        &self,
        queue: QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        batch_size: usize,
        idle_timeout: Option<Duration>,
    ) -> Result<BoxStream<'static, Result<Self::Entry, BoxedError>>, BoxedError> {
        let key = queue.key().to_owned();
        let group_name = group.identifier().to_string();

        let mut con = self
            .connection
            .lock()
            .await
            .take()
            .ok_or(RedisQueueError::NotConnected)?;

        create_consumer_group(&mut con, &key, group).await;

        let block_duration = idle_timeout
            .map(|d| d.as_millis().try_into().unwrap_or_default())
            .unwrap_or_default();

        let read_options = ReadOptions {
            group: group_name.clone(),
            consumer: consumer.to_owned(),
            count: batch_size,
            block: block_duration,
        };

        // Separate connection to acknowledge entries while the owned one blocks
        let ack_con = self.factory.multiplexed().await?;

        let stream = xread_stream(con, read_options, key.clone())
            .map(move |entry| {
                let entry = entry?;
                RedisQueueEntry::new(ack_con.clone(), entry, key.clone(), group_name.clone())
            })
            .boxed();

        Ok(stream)
    }

    async fn disconnect(&self) {
        self.connection.lock().await.take();
    }
}

async fn create_consumer_group(con: &mut Connection, key: &str, group: &ConsumerGroupDescriptor) {
    let start_id = match group.start() {
        QueueLocation::Head => STREAM_ID_HEAD,
        QueueLocation::Tail => STREAM_ID_TAIL,
    };

    // Fails with BUSYGROUP if it exists already which retains its position
    let created = con
        .xgroup_create_mkstream::<_, _, _, ()>(key, group.identifier().as_str(), start_id)
        .await
        .is_ok();

    debug!(key, group = %group.identifier(), created, "Joined consumer group");
}

/// Parameters of a group read, rebuilt for every request as [`StreamReadOptions`] is consumed
struct ReadOptions {
    group: String,
    consumer: String,
    count: usize,
    block: usize,
}

impl ReadOptions {
    fn build(&self) -> StreamReadOptions {
        StreamReadOptions::default()
            .group(&self.group, &self.consumer)
            .count(self.count)
            .block(self.block)
    }
}

fn xread_stream(
    con: Connection,
    options: ReadOptions,
    key: String,
) -> BoxStream<'static, Result<StreamId, BoxedError>> {
    let initial_id: String = STREAM_ID_HEAD.to_string();

    let stream = stream::unfold(
        (con, options, initial_id, key),
        |(mut con, options, id, key)| async move {
            let result: RedisResult<StreamReadReply> =
                con.xread_options(&[&key], &[&id], options.build()).await;

            match result {
                Ok(mut reply) => {
                    let stream = reply.keys.pop()?;

                    let next_id = if id == STREAM_ID_ADDITIONS {
                        // Already operating on new entries, continue doing so
                        id
                    } else if let Some(last) = stream.ids.last() {
                        // Processing pending entries after a restart, continue after the last one
                        last.id.to_owned()
                    } else {
                        // Pending entries are exhausted, move on to new ones
                        STREAM_ID_ADDITIONS.to_string()
                    };

                    Some((Ok(stream.ids), (con, options, next_id, key)))
                }
                Err(e) => {
                    error!(?e, "Encountered error reading from redis stream");
                    None
                }
            }
        },
    );

    // Entries are read in batches but yielded one at a time
    stream
        .flat_map(|result: RedisResult<Vec<StreamId>>| match result {
            Ok(batch) => stream::iter(batch).map(Ok).boxed(),
            Err(e) => stream::once(async move { Err(e.into()) }).boxed(),
        })
        .boxed()
}
