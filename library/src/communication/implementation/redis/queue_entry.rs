use super::{RedisQueueError, STREAM_PAYLOAD_KEY};
use crate::communication::event::RawQueueEntry;
use crate::{BoxedError, EmptyResult};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::streams::StreamId;
use redis::AsyncCommands;

/// Entry of a redis stream which is acknowledged using [`XACK`](https://redis.io/commands/xack)
pub struct RedisQueueEntry {
    con: MultiplexedConnection,
    key: String,
    group: String,
    id: String,
    payload: Vec<u8>,
}

impl RedisQueueEntry {
    /// Creates a new entry from a raw stream item
    pub fn new(
        con: MultiplexedConnection,
        entry: StreamId,
        key: String,
        group: String,
    ) -> Result<Self, BoxedError> {
        let payload: Vec<u8> = entry
            .get(STREAM_PAYLOAD_KEY)
            .ok_or(RedisQueueError::MissingPayload)?;

        Ok(Self {
            con,
            key,
            group,
            id: entry.id,
            payload,
        })
    }
}

#[async_trait]
impl RawQueueEntry for RedisQueueEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn acknowledge(&mut self) -> EmptyResult {
        self.con
            .xack::<_, _, _, ()>(&self.key, &self.group, &[&self.id])
            .await?;

        Ok(())
    }
}
