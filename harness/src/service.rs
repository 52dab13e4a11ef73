use async_trait::async_trait;
use jatsl::{Job, JobManager};
use library::communication::event::{Consumer, ConsumerGroupDescriptor, EventConsumer};
use library::communication::CommunicationFactory;
use library::EmptyResult;
use std::future::Future;
use std::marker::PhantomData;
use tracing::debug;

/// Structure which can be instantiated with a [`CommunicationFactory`]
pub trait Service<F: CommunicationFactory + Send + Sync> {
    /// Name of the service displayed in log messages
    const NAME: &'static str;
    /// Instance type which will be instantiated
    type Instance: Send + Sync;
    /// Configuration type passed to the service
    type Config: Send + Sync;

    /// Creates a new instance which could be of a different type
    fn instantiate(factory: F, config: &Self::Config) -> Self::Instance;
}

/// Runner for [`Service`] implementations where [`Service::Instance`] is a [`Consumer`]
///
/// Subscribes the service to the queue of its notification type and feeds it every entry
/// the consumer group receives until the job is terminated.
pub struct ServiceRunner<F, S>
where
    F: CommunicationFactory + Send + Sync,
    S: Service<F>,
{
    factory: F,
    group: ConsumerGroupDescriptor,
    consumer: String,
    config: S::Config,
    service: PhantomData<S>,
}

impl<F, S> ServiceRunner<F, S>
where
    F: CommunicationFactory + Clone + Send + Sync,
    S: Service<F>,
    S::Instance: Consumer,
{
    /// Creates a new runner job which will use the provided consumer group and name
    pub fn new(
        factory: F,
        group: ConsumerGroupDescriptor,
        consumer: String,
        config: S::Config,
    ) -> Self {
        Self {
            factory,
            group,
            consumer,
            config,
            service: PhantomData,
        }
    }

    /// Consumes the queue until the `shutdown` future resolves, `ready` is invoked once subscribed
    pub async fn consume_until<R, T>(&self, ready: R, shutdown: T) -> EmptyResult
    where
        R: Future<Output = ()> + Send,
        T: Future<Output = ()> + Send,
    {
        let service = S::instantiate(self.factory.clone(), &self.config);
        let mut consumer = EventConsumer::new(self.factory.queue_provider(), self.consumer.clone());

        consumer.connect().await?;
        consumer.subscribe_to::<<S::Instance as Consumer>::Notification>(self.group.clone())?;

        debug!(service = S::NAME, "Service subscribed");
        ready.await;

        consumer.run_until(&service, shutdown).await?;

        Ok(())
    }
}

#[async_trait]
impl<F, S> Job for ServiceRunner<F, S>
where
    F: CommunicationFactory + Clone + Send + Sync,
    S: Service<F> + Send + Sync,
    S::Instance: Consumer,
{
    const NAME: &'static str = "ServiceRunner";

    fn name(&self) -> String {
        format!("{}({})", Self::NAME, S::NAME)
    }

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        self.consume_until(manager.ready(), manager.termination_signal())
            .await
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use library::communication::event::{
        Notification, NotificationFrame, NotificationPublisher, QueueDescriptor, QueueLocation,
    };
    use library::communication::implementation::memory::MemoryBroker;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Greeting {
        text: String,
    }

    impl Notification for Greeting {
        fn queue() -> QueueDescriptor {
            QueueDescriptor::new("greetings".into(), 100)
        }
    }

    struct GreetingCollector {
        received: Arc<Mutex<Vec<String>>>,
    }

    impl<F: CommunicationFactory + Send + Sync> Service<F> for GreetingCollector {
        const NAME: &'static str = "GreetingCollector";

        type Instance = GreetingCollector;
        type Config = Arc<Mutex<Vec<String>>>;

        fn instantiate(_factory: F, received: &Self::Config) -> Self::Instance {
            Self {
                received: received.clone(),
            }
        }
    }

    #[async_trait]
    impl Consumer for GreetingCollector {
        type Notification = Greeting;

        async fn consume(&self, notification: NotificationFrame<Greeting>) -> EmptyResult {
            self.received.lock().unwrap().push(notification.into_inner().text);
            Ok(())
        }
    }

    #[tokio::test]
    async fn feed_notifications_to_the_service() {
        let broker = MemoryBroker::default();
        let received = Arc::new(Mutex::new(Vec::new()));
        let group = ConsumerGroupDescriptor::new("greeters".into(), QueueLocation::Head);

        broker
            .publish(&Greeting {
                text: "hello".into(),
            })
            .await
            .unwrap();

        let runner = ServiceRunner::<_, GreetingCollector>::new(
            broker.clone(),
            group,
            "consumer-1".into(),
            received.clone(),
        );

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let shutdown = async move {
            stop_rx.await.ok();
        };

        let handle = tokio::spawn(async move { runner.consume_until(async {}, shutdown).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        stop_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(*received.lock().unwrap(), vec!["hello".to_string()]);
    }
}
