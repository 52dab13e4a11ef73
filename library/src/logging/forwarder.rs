use super::{LogRecord, LogRecordReceiver, LOCAL_ONLY_TARGET};
use crate::communication::event::NotificationPublisher;
use crate::EmptyResult;
use async_trait::async_trait;
use jatsl::{Job, JobManager};
use tokio::sync::Mutex;
use tracing::warn;

tokio::task_local! {
    /// Set while a record is being published
    static FORWARDING: ();
}

/// Whether the current task is publishing a log record
///
/// Events emitted on the publish path must not be captured, every publish would otherwise
/// produce further records to publish.
pub(crate) fn is_forwarding() -> bool {
    FORWARDING.try_with(|_| ()).is_ok()
}

/// Job which publishes captured [`LogRecords`](LogRecord) to the log queue
///
/// Failures are reported on the local console only, a record that could not be published is
/// dropped. Records still buffered when the job terminates are flushed on a best-effort basis.
pub struct LogForwarderJob<P> {
    receiver: Mutex<LogRecordReceiver>,
    publisher: P,
}

impl<P> LogForwarderJob<P>
where
    P: NotificationPublisher + Send + Sync,
{
    /// Creates a new instance draining the given receiver
    pub fn new(receiver: LogRecordReceiver, publisher: P) -> Self {
        Self {
            receiver: Mutex::new(receiver),
            publisher,
        }
    }

    /// Publishes a single record, returns whether it succeeded
    pub async fn forward(&self, record: &LogRecord) -> bool {
        match FORWARDING.scope((), self.publisher.publish(record)).await {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    target: LOCAL_ONLY_TARGET,
                    error = %e,
                    message = %record.message,
                    "Unable to forward log record"
                );
                false
            }
        }
    }

    /// Publishes everything that is currently buffered without waiting for new records
    pub async fn flush(&self) -> usize {
        let mut receiver = self.receiver.lock().await;
        let mut forwarded = 0;

        while let Ok(record) = receiver.try_recv() {
            if self.forward(&record).await {
                forwarded += 1;
            }
        }

        forwarded
    }
}

#[async_trait]
impl<P> Job for LogForwarderJob<P>
where
    P: NotificationPublisher + Send + Sync,
{
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let termination = manager.termination_signal();
        tokio::pin!(termination);

        manager.ready().await;

        {
            let mut receiver = self.receiver.lock().await;

            loop {
                tokio::select! {
                    biased;
                    _ = &mut termination => break,
                    record = receiver.recv() => match record {
                        Some(record) => {
                            self.forward(&record).await;
                        }
                        None => break,
                    },
                }
            }
        }

        self.flush().await;

        Ok(())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::communication::event::{Notification, PublishError};
    use crate::communication::implementation::memory::MemoryBroker;
    use crate::communication::implementation::mock::MockNotificationPublisher;
    use crate::logging::{LogForwardingLayer, LogLevel, LOG_QUEUE};
    use pretty_assertions::assert_eq;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tracing_subscriber::fmt::MakeWriter;
    use tracing_subscriber::layer::SubscriberExt;

    /// Publisher which reports every publish on the regular log targets, like the Redis one
    struct TracingPublisher(MemoryBroker);

    #[async_trait]
    impl NotificationPublisher for TracingPublisher {
        async fn publish<N: Notification + Send + Sync>(
            &self,
            notification: &N,
        ) -> Result<(), PublishError> {
            tracing::debug!("Publishing notification");
            let result = self.0.publish(notification).await;
            tracing::trace!(queue = N::queue().key(), "Published notification");
            result
        }
    }

    /// Console sink writing into a shared buffer
    #[derive(Clone, Default)]
    struct Console(Arc<Mutex<Vec<u8>>>);

    impl Console {
        fn output(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Console {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Console {
        type Writer = Console;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn publish_captured_records() {
        let (layer, receiver) = LogForwardingLayer::new("product-service");
        let broker = MemoryBroker::default();
        let forwarder = LogForwarderJob::new(receiver, broker.clone());

        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Product created");
            tracing::warn!("Stock running low");
        });

        assert_eq!(forwarder.flush().await, 2);

        let frames = broker.notifications::<LogRecord>(LOG_QUEUE);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].message, "Product created");
        assert_eq!(frames[1].level, LogLevel::Warn);
        assert_eq!(frames[1].service_name(), "product-service");
    }

    #[tokio::test]
    async fn swallow_publish_failures() {
        let console = Console::default();
        let (layer, receiver) = LogForwardingLayer::new("user-service");
        let forwarder = LogForwarderJob::new(receiver, MockNotificationPublisher::failing());

        let subscriber = tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(console.clone()))
            .with(layer);
        let _guard = tracing::subscriber::set_default(subscriber);

        crate::logging::log(LogLevel::Error, "Nobody will know");

        assert_eq!(forwarder.flush().await, 0);

        let output = console.output();
        assert!(output.contains("Nobody will know"));
        assert!(output.contains("Unable to forward log record"));
    }

    #[tokio::test]
    async fn not_capture_events_of_the_publish_path() {
        let (layer, receiver) = LogForwardingLayer::new("user-service");
        let broker = MemoryBroker::default();
        let forwarder = LogForwarderJob::new(receiver, TracingPublisher(broker.clone()));

        let subscriber = tracing_subscriber::registry().with(layer);
        let _guard = tracing::subscriber::set_default(subscriber);

        tracing::info!("one single log line");

        let forwarded = tokio::time::timeout(Duration::from_millis(500), forwarder.flush())
            .await
            .unwrap();

        assert_eq!(forwarded, 1);
        assert_eq!(broker.payloads(LOG_QUEUE).len(), 1);
        assert_eq!(forwarder.flush().await, 0);
    }

    #[tokio::test]
    async fn survive_unreachable_brokers() {
        let broker = MemoryBroker::default();
        broker.set_reachable(false);

        let (_layer, receiver) = LogForwardingLayer::new("user-service");
        let forwarder = LogForwarderJob::new(receiver, broker.clone());

        assert!(!forwarder.forward(&LogRecord::new(LogLevel::Info, "lost")).await);
        assert!(broker.payloads(LOG_QUEUE).is_empty());
    }
}
