use super::{
    Consumer, ConsumerExt, ConsumerGroupDescriptor, ConsumerIdentifier, Notification,
    QueueDescriptor, QueueProvider,
};
use crate::BoxedError;
use futures::future::{pending, Future};
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const DEFAULT_BATCH_SIZE: usize = 10;

/// Lifecycle stage of an [`EventConsumer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    /// Initial state, no broker connection exists
    Disconnected,
    /// Connection to the broker has been established
    Connected,
    /// A queue and consumer group have been registered
    Subscribed,
    /// Entries are actively consumed
    Running,
    /// Terminal state, the connection has been released
    Stopped,
}

/// Operation which is not permitted in the current [`ConsumerState`]
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unable to {operation} a consumer in state {state:?}")]
pub struct ConsumerStateError {
    /// Attempted operation
    pub operation: &'static str,
    /// State the consumer was in
    pub state: ConsumerState,
}

/// Errors raised while operating an [`EventConsumer`]
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Attempted an invalid state transition
    #[error(transparent)]
    State(#[from] ConsumerStateError),
    /// Broker could not be reached
    #[error("unable to connect to the broker")]
    Connection(#[source] BoxedError),
    /// Subscription could not be opened
    #[error("unable to consume queue {queue}")]
    Subscription {
        /// Key of the queue
        queue: String,
        /// Underlying error
        #[source]
        source: BoxedError,
    },
    /// Broker closed the subscription unexpectedly
    #[error("subscription to queue {0} closed unexpectedly")]
    StreamClosed(String),
}

/// Remote control which requests an [`EventConsumer`] to stop
#[derive(Clone)]
pub struct StopHandle(Arc<watch::Sender<bool>>);

impl StopHandle {
    /// Requests the associated consumer to stop after the entry it is currently processing
    pub fn stop(&self) {
        self.0.send(true).ok();
    }
}

struct Subscription {
    queue: QueueDescriptor,
    group: ConsumerGroupDescriptor,
}

/// Consumes a single queue on behalf of a consumer group
///
/// Progresses through `Disconnected -> Connected -> Subscribed -> Running -> Stopped`.
/// Calling an operation in the wrong state yields a [`ConsumerStateError`]. Entries are
/// processed one after another which retains their order.
pub struct EventConsumer<P: QueueProvider> {
    provider: P,
    name: ConsumerIdentifier,
    state: ConsumerState,
    subscription: Option<Subscription>,
    batch_size: usize,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl<P> EventConsumer<P>
where
    P: QueueProvider + Send + Sync,
{
    /// Creates a new consumer with a name that is unique within its consumer group
    pub fn new(provider: P, name: impl Into<ConsumerIdentifier>) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);

        Self {
            provider,
            name: name.into(),
            state: ConsumerState::Disconnected,
            subscription: None,
            batch_size: DEFAULT_BATCH_SIZE,
            stop_tx: Arc::new(stop_tx),
            stop_rx,
        }
    }

    /// Current lifecycle stage
    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Handle which can be used to stop the consumer while it is running
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop_tx.clone())
    }

    fn expect_state(
        &self,
        expected: ConsumerState,
        operation: &'static str,
    ) -> Result<(), ConsumerStateError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ConsumerStateError {
                operation,
                state: self.state,
            })
        }
    }

    /// Establishes the broker connection
    pub async fn connect(&mut self) -> Result<(), ConsumerError> {
        self.expect_state(ConsumerState::Disconnected, "connect")?;

        self.provider
            .connect()
            .await
            .map_err(ConsumerError::Connection)?;

        self.state = ConsumerState::Connected;
        Ok(())
    }

    /// Registers the queue to consume and the group to join
    pub fn subscribe(
        &mut self,
        queue: QueueDescriptor,
        group: ConsumerGroupDescriptor,
    ) -> Result<(), ConsumerError> {
        self.expect_state(ConsumerState::Connected, "subscribe")?;

        debug!(queue = queue.key(), group = %group.identifier(), "Subscribing to queue");
        self.subscription = Some(Subscription { queue, group });
        self.state = ConsumerState::Subscribed;

        Ok(())
    }

    /// Registers the queue of a notification type
    pub fn subscribe_to<N: Notification>(
        &mut self,
        group: ConsumerGroupDescriptor,
    ) -> Result<(), ConsumerError> {
        self.subscribe(N::queue(), group)
    }

    /// Processes entries until [stopped](StopHandle::stop)
    pub async fn run<C>(&mut self, consumer: &C) -> Result<(), ConsumerError>
    where
        C: Consumer + Send + Sync,
    {
        self.run_until(consumer, pending()).await
    }

    /// Processes entries until either stopped or the `shutdown` future resolves
    ///
    /// The consumer is in its terminal state afterwards, no matter how the loop ended.
    pub async fn run_until<C, S>(&mut self, consumer: &C, shutdown: S) -> Result<(), ConsumerError>
    where
        C: Consumer + Send + Sync,
        S: Future<Output = ()> + Send,
    {
        self.expect_state(ConsumerState::Subscribed, "run")?;

        let (queue, group) = match &self.subscription {
            Some(subscription) => (subscription.queue.clone(), subscription.group.clone()),
            None => {
                return Err(ConsumerStateError {
                    operation: "run",
                    state: self.state,
                }
                .into())
            }
        };
        let key = queue.key().to_owned();

        let stream = self
            .provider
            .consume(queue, &group, &self.name, self.batch_size, None)
            .await;

        let mut stream = match stream {
            Ok(stream) => stream,
            Err(source) => {
                self.stop().await;
                return Err(ConsumerError::Subscription { queue: key, source });
            }
        };

        self.state = ConsumerState::Running;
        info!(queue = %key, group = %group.identifier(), consumer = %self.name, "Consuming queue");

        let mut stop = self.stop_rx.clone();
        tokio::pin!(shutdown);

        let result = loop {
            if *stop.borrow() {
                break Ok(());
            }

            tokio::select! {
                biased;

                changed = stop.changed() => {
                    if changed.is_err() {
                        break Ok(());
                    }
                }
                _ = &mut shutdown => break Ok(()),
                item = stream.next() => match item {
                    Some(Ok(entry)) => {
                        consumer.process_entry(entry).await;
                    }
                    Some(Err(error)) => {
                        warn!(queue = %key, %error, "Failed to receive notification");
                    }
                    None => break Err(ConsumerError::StreamClosed(key.clone())),
                },
            }
        };

        drop(stream);
        self.stop().await;

        result
    }

    /// Transitions into the terminal state and releases the broker connection
    pub async fn stop(&mut self) {
        if self.state == ConsumerState::Stopped {
            return;
        }

        if self.state != ConsumerState::Disconnected {
            self.provider.disconnect().await;
        }

        self.state = ConsumerState::Stopped;
        debug!(consumer = %self.name, "Consumer stopped");
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::communication::event::{NotificationFrame, NotificationPublisher, QueueLocation};
    use crate::communication::implementation::memory::MemoryBroker;
    use crate::EmptyResult;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::timeout;

    #[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
    struct Tick {
        source: String,
        sequence: u32,
    }

    impl Notification for Tick {
        fn queue() -> QueueDescriptor {
            QueueDescriptor::new("ticks".into(), 1_000)
        }

        fn key(&self) -> Option<String> {
            Some(self.source.clone())
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, u32)>>,
        fail_on: Option<u32>,
        stop_after: Option<(usize, StopHandle)>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<(String, u32)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Consumer for Recorder {
        type Notification = Tick;

        async fn consume(&self, notification: NotificationFrame<Tick>) -> EmptyResult {
            let count = {
                let mut seen = self.seen.lock().unwrap();
                seen.push((notification.source.clone(), notification.sequence));
                seen.len()
            };

            if let Some((limit, handle)) = &self.stop_after {
                if count >= *limit {
                    handle.stop();
                }
            }

            if Some(notification.sequence) == self.fail_on {
                return Err("refusing to process".into());
            }

            Ok(())
        }
    }

    fn group(name: &str) -> ConsumerGroupDescriptor {
        ConsumerGroupDescriptor::new(name.into(), QueueLocation::Head)
    }

    async fn subscribed(broker: &MemoryBroker, group_name: &str) -> EventConsumer<MemoryBroker> {
        let mut consumer = EventConsumer::new(broker.clone(), "test-consumer");
        consumer.connect().await.unwrap();
        consumer.subscribe_to::<Tick>(group(group_name)).unwrap();
        consumer
    }

    async fn publish(broker: &MemoryBroker, source: &str, sequence: u32) {
        broker
            .publish(&Tick {
                source: source.into(),
                sequence,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reject_invalid_transitions() {
        let broker = MemoryBroker::default();
        let mut consumer = EventConsumer::new(broker, "test-consumer");

        let error = consumer
            .subscribe(Tick::queue(), group("g"))
            .unwrap_err();
        assert!(matches!(
            error,
            ConsumerError::State(ConsumerStateError {
                operation: "subscribe",
                state: ConsumerState::Disconnected
            })
        ));

        let error = consumer.run(&Recorder::default()).await.unwrap_err();
        assert!(matches!(error, ConsumerError::State(_)));

        consumer.connect().await.unwrap();
        assert!(consumer.connect().await.is_err());
        assert_eq!(consumer.state(), ConsumerState::Connected);
    }

    #[tokio::test]
    async fn stop_irreversibly() {
        let broker = MemoryBroker::default();
        let mut consumer = subscribed(&broker, "g").await;

        consumer.stop().await;
        assert_eq!(consumer.state(), ConsumerState::Stopped);

        assert!(consumer.connect().await.is_err());
        assert!(consumer.run(&Recorder::default()).await.is_err());
        assert_eq!(consumer.state(), ConsumerState::Stopped);
    }

    #[tokio::test]
    async fn deliver_same_key_in_publish_order() {
        let broker = MemoryBroker::default();
        for sequence in 0..20 {
            publish(&broker, if sequence % 2 == 0 { "a" } else { "b" }, sequence).await;
        }

        let mut consumer = subscribed(&broker, "ordered").await;
        let recorder = Recorder {
            stop_after: Some((20, consumer.stop_handle())),
            ..Default::default()
        };

        timeout(Duration::from_secs(5), consumer.run(&recorder))
            .await
            .unwrap()
            .unwrap();

        let seen = recorder.seen();
        for key in ["a", "b"] {
            let sequences: Vec<u32> = seen
                .iter()
                .filter(|(source, _)| source == key)
                .map(|(_, sequence)| *sequence)
                .collect();
            let mut sorted = sequences.clone();
            sorted.sort_unstable();

            assert_eq!(sequences.len(), 10);
            assert_eq!(sequences, sorted);
        }
        assert_eq!(consumer.state(), ConsumerState::Stopped);
    }

    #[tokio::test]
    async fn continue_after_failing_handler() {
        let broker = MemoryBroker::default();
        for sequence in 1..=3 {
            publish(&broker, "a", sequence).await;
        }

        let mut consumer = subscribed(&broker, "resilient").await;
        let recorder = Recorder {
            fail_on: Some(2),
            stop_after: Some((3, consumer.stop_handle())),
            ..Default::default()
        };

        timeout(Duration::from_secs(5), consumer.run(&recorder))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            recorder.seen(),
            vec![("a".into(), 1), ("a".into(), 2), ("a".into(), 3)]
        );
        assert_eq!(broker.pending_count("ticks", "resilient"), 0);
    }

    #[tokio::test]
    async fn skip_malformed_payloads() {
        let broker = MemoryBroker::default();
        broker.publish_bytes("ticks", b"{ definitely not json".to_vec());
        broker.publish_bytes("ticks", br#"{"unexpected": "shape"}"#.to_vec());
        publish(&broker, "a", 7).await;

        let mut consumer = subscribed(&broker, "picky").await;
        let recorder = Recorder {
            stop_after: Some((1, consumer.stop_handle())),
            ..Default::default()
        };

        timeout(Duration::from_secs(5), consumer.run(&recorder))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(recorder.seen(), vec![("a".into(), 7)]);
    }

    #[tokio::test]
    async fn end_when_shutdown_resolves() {
        let broker = MemoryBroker::default();
        let mut consumer = subscribed(&broker, "idle").await;
        let recorder = Recorder::default();

        let shutdown = tokio::time::sleep(Duration::from_millis(50));
        timeout(Duration::from_secs(5), consumer.run_until(&recorder, shutdown))
            .await
            .unwrap()
            .unwrap();

        assert!(recorder.seen().is_empty());
        assert_eq!(consumer.state(), ConsumerState::Stopped);
    }

    #[tokio::test]
    async fn pick_up_notifications_published_while_running() {
        let broker = MemoryBroker::default();
        let mut consumer = subscribed(&broker, "live").await;
        let recorder = Recorder {
            stop_after: Some((2, consumer.stop_handle())),
            ..Default::default()
        };

        let publishing = {
            let broker = broker.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                publish(&broker, "late", 1).await;
                publish(&broker, "late", 2).await;
            }
        };

        let (result, _) = timeout(
            Duration::from_secs(5),
            futures::future::join(consumer.run(&recorder), publishing),
        )
        .await
        .unwrap();

        result.unwrap();
        assert_eq!(
            recorder.seen(),
            vec![("late".into(), 1), ("late".into(), 2)]
        );
    }
}
