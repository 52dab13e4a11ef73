use super::NotificationFrame;
use crate::communication::{decode_as, CodecError};
use crate::EmptyResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Describes a notification queue and its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDescriptor {
    key: String,
    limit: usize,
}

impl QueueDescriptor {
    /// Creates a new instance from raw parts
    pub fn new(key: String, limit: usize) -> Self {
        Self { key, limit }
    }

    /// Value which is used by queue implementations to identify a queue (the topic name)
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Maximum number of notifications to be retained in the queue
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Location within the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueLocation {
    /// Start of the queue (not necessarily the first notification as a queue is limited in length)
    Head,
    /// End of the queue (exclusive of the last message)
    Tail,
}

impl QueueLocation {
    /// Translates the commonly used `fromBeginning` flag into a location
    pub fn from_beginning(from_beginning: bool) -> Self {
        if from_beginning {
            QueueLocation::Head
        } else {
            QueueLocation::Tail
        }
    }
}

/// Entry retrieved from a [`Queue`](QueueDescriptor) providing a raw payload
#[async_trait]
pub trait RawQueueEntry {
    /// Broker assigned identifier of the entry
    fn id(&self) -> &str;

    /// Payload of the item
    fn payload(&self) -> &[u8];

    /// Acknowledge the item as processed
    async fn acknowledge(&mut self) -> EmptyResult;
}

/// Useful functions for [`RawQueueEntry`] implementations
pub trait QueueEntry: RawQueueEntry {
    /// Attempts to parse the wire-format payload into a notification envelope
    fn parse_payload<N: DeserializeOwned>(&self) -> Result<NotificationFrame<N>, CodecError> {
        decode_as(self.payload())
    }
}

impl<E: RawQueueEntry> QueueEntry for E {}
