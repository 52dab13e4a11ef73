//! In-process broker implementing the same traits as the [`redis`](super::redis) implementation
//!
//! It mirrors the semantics of Redis streams closely enough to test consumers and publishers
//! without a running server: queues are trimmed to their limit, consumer groups track their
//! position and entries stay pending until they are acknowledged.

use super::super::event::{
    ConsumerGroupDescriptor, NotificationFrame, PublishError, QueueDescriptor, QueueLocation,
    QueueProvider, RawNotificationPublisher, RawQueueEntry,
};
use super::super::{decode_as, CommunicationFactory};
use super::json::JsonNotificationPublisher;
use crate::{BoxedError, EmptyResult};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::timeout;

#[derive(Debug, Error)]
enum MemoryBrokerError {
    #[error("broker is unreachable")]
    Unreachable,
}

struct StoredEntry {
    id: u64,
    payload: Arc<Vec<u8>>,
}

#[derive(Default)]
struct GroupState {
    next: u64,
    pending: BTreeSet<u64>,
}

#[derive(Default)]
struct Topic {
    entries: VecDeque<StoredEntry>,
    next_id: u64,
    groups: HashMap<String, GroupState>,
}

impl Topic {
    fn first_id(&self) -> u64 {
        self.entries
            .front()
            .map(|entry| entry.id)
            .unwrap_or(self.next_id)
    }

    fn get(&self, id: u64) -> Option<&StoredEntry> {
        let offset = id.checked_sub(self.first_id())? as usize;
        self.entries.get(offset)
    }
}

struct Inner {
    topics: Mutex<HashMap<String, Topic>>,
    changes: watch::Sender<u64>,
    reachable: AtomicBool,
}

/// Broker keeping all queues in memory, cloning it yields a handle to the same broker
#[derive(Clone)]
pub struct MemoryBroker {
    inner: Arc<Inner>,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        let (changes, _) = watch::channel(0);

        Self {
            inner: Arc::new(Inner {
                topics: Mutex::new(HashMap::new()),
                changes,
                reachable: AtomicBool::new(true),
            }),
        }
    }
}

impl MemoryBroker {
    fn topics(&self) -> MutexGuard<'_, HashMap<String, Topic>> {
        match self.inner.topics.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Simulates an outage (or its recovery), publishing and connecting fail while unreachable
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.reachable.store(reachable, Ordering::SeqCst);
    }

    fn is_reachable(&self) -> bool {
        self.inner.reachable.load(Ordering::SeqCst)
    }

    fn append(&self, topic: &str, limit: Option<usize>, payload: Vec<u8>) -> u64 {
        let id = {
            let mut topics = self.topics();
            let topic = topics.entry(topic.to_owned()).or_default();
            let id = topic.next_id;

            topic.next_id += 1;
            topic.entries.push_back(StoredEntry {
                id,
                payload: Arc::new(payload),
            });

            if let Some(limit) = limit {
                while topic.entries.len() > limit {
                    topic.entries.pop_front();
                }
            }

            id
        };

        self.inner.changes.send_modify(|counter| *counter += 1);
        id
    }

    /// Appends raw bytes to a queue, bypassing encoding and reachability
    pub fn publish_bytes(&self, topic: &str, payload: Vec<u8>) {
        self.append(topic, None, payload);
    }

    /// Raw payloads currently retained in a queue
    pub fn payloads(&self, topic: &str) -> Vec<Vec<u8>> {
        self.topics()
            .get(topic)
            .map(|topic| {
                topic
                    .entries
                    .iter()
                    .map(|entry| entry.payload.as_ref().clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Decoded notifications currently retained in a queue, skipping undecodable ones
    pub fn notifications<N: DeserializeOwned>(&self, topic: &str) -> Vec<NotificationFrame<N>> {
        self.payloads(topic)
            .iter()
            .filter_map(|payload| decode_as(payload).ok())
            .collect()
    }

    /// Number of entries delivered to a group which have not been acknowledged yet
    pub fn pending_count(&self, topic: &str, group: &str) -> usize {
        self.topics()
            .get(topic)
            .and_then(|topic| topic.groups.get(group))
            .map(|group| group.pending.len())
            .unwrap_or_default()
    }

    fn join_group(&self, topic: &str, group: &ConsumerGroupDescriptor) -> VecDeque<u64> {
        let mut topics = self.topics();
        let topic = topics.entry(topic.to_owned()).or_default();
        let start = match group.start() {
            QueueLocation::Head => topic.first_id(),
            QueueLocation::Tail => topic.next_id,
        };

        let state = topic
            .groups
            .entry(group.identifier().to_string())
            .or_insert_with(|| GroupState {
                next: start,
                pending: BTreeSet::new(),
            });

        state.pending.iter().copied().collect()
    }

    fn take_next(
        &self,
        topic_key: &str,
        group: &str,
        redeliveries: &mut VecDeque<u64>,
    ) -> Option<(u64, Arc<Vec<u8>>)> {
        let mut topics = self.topics();
        let topic = topics.get_mut(topic_key)?;
        let first_id = topic.first_id();
        let next_id = topic.next_id;

        while let Some(id) = redeliveries.pop_front() {
            let still_pending = topic
                .groups
                .get(group)
                .map(|state| state.pending.contains(&id))
                .unwrap_or(false);

            if still_pending {
                if let Some(entry) = topic.get(id) {
                    return Some((id, entry.payload.clone()));
                }
            }
        }

        let state = topic.groups.get_mut(group)?;
        state.next = state.next.max(first_id);

        if state.next >= next_id {
            return None;
        }

        let id = state.next;
        state.next += 1;
        state.pending.insert(id);

        topic.get(id).map(|entry| (id, entry.payload.clone()))
    }

    fn acknowledge(&self, topic: &str, group: &str, id: u64) {
        if let Some(state) = self
            .topics()
            .get_mut(topic)
            .and_then(|topic| topic.groups.get_mut(group))
        {
            state.pending.remove(&id);
        }
    }
}

/// Entry handed out by the [`MemoryBroker`]
pub struct MemoryQueueEntry {
    broker: MemoryBroker,
    topic: String,
    group: String,
    id: u64,
    display_id: String,
    payload: Arc<Vec<u8>>,
}

#[async_trait]
impl RawQueueEntry for MemoryQueueEntry {
    fn id(&self) -> &str {
        &self.display_id
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn acknowledge(&mut self) -> EmptyResult {
        self.broker.acknowledge(&self.topic, &self.group, self.id);
        Ok(())
    }
}

impl JsonNotificationPublisher for MemoryBroker {}

#[async_trait]
impl RawNotificationPublisher for MemoryBroker {
    async fn publish_raw(
        &self,
        data: &[u8],
        descriptor: QueueDescriptor,
        _key: Option<String>,
    ) -> Result<(), PublishError> {
        if !self.is_reachable() {
            return Err(PublishError::Connection(MemoryBrokerError::Unreachable.into()));
        }

        self.append(descriptor.key(), Some(descriptor.limit()), data.to_vec());
        Ok(())
    }
}

struct ConsumptionState {
    broker: MemoryBroker,
    topic: String,
    group: String,
    redeliveries: VecDeque<u64>,
    changes: watch::Receiver<u64>,
    idle_timeout: Option<Duration>,
}

#[async_trait]
impl QueueProvider for MemoryBroker {
    type Entry = MemoryQueueEntry;

    async fn connect(&self) -> EmptyResult {
        if self.is_reachable() {
            Ok(())
        } else {
            Err(MemoryBrokerError::Unreachable.into())
        }
    }

    async fn consume(
        &self,
        queue: QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        _consumer: &str,
        _batch_size: usize,
        idle_timeout: Option<Duration>,
    ) -> Result<BoxStream<'static, Result<Self::Entry, BoxedError>>, BoxedError> {
        if !self.is_reachable() {
            return Err(MemoryBrokerError::Unreachable.into());
        }

        let redeliveries = self.join_group(queue.key(), group);
        let state = ConsumptionState {
            broker: self.clone(),
            topic: queue.key().to_owned(),
            group: group.identifier().to_string(),
            redeliveries,
            changes: self.inner.changes.subscribe(),
            idle_timeout,
        };

        let stream = stream::unfold(state, |mut state| async move {
            loop {
                state.changes.borrow_and_update();

                if let Some((id, payload)) =
                    state
                        .broker
                        .take_next(&state.topic, &state.group, &mut state.redeliveries)
                {
                    let entry = MemoryQueueEntry {
                        broker: state.broker.clone(),
                        topic: state.topic.clone(),
                        group: state.group.clone(),
                        id,
                        display_id: format!("{}-0", id),
                        payload,
                    };

                    return Some((Ok::<_, BoxedError>(entry), state));
                }

                let changed = match state.idle_timeout {
                    Some(duration) => match timeout(duration, state.changes.changed()).await {
                        Ok(result) => result,
                        Err(_) => return None,
                    },
                    None => state.changes.changed().await,
                };

                if changed.is_err() {
                    return None;
                }
            }
        });

        Ok(stream.boxed())
    }

    async fn disconnect(&self) {}
}

impl CommunicationFactory for MemoryBroker {
    type QueueProvider = MemoryBroker;
    type NotificationPublisher = MemoryBroker;

    fn queue_provider(&self) -> Self::QueueProvider {
        self.clone()
    }

    fn notification_publisher(&self) -> Self::NotificationPublisher {
        self.clone()
    }
}
