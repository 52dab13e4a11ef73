use super::ExpectationMode;
use crate::communication::event::{Notification, NotificationPublisher, PublishError};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::any::type_name;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("mock publisher is configured to fail")]
struct MockPublishFailure;

#[derive(Debug)]
struct ExpectedNotification {
    queue: String,
    key: Option<String>,
    value: Value,
}

/// Publisher which verifies published notifications against a list of expectations
///
/// Expectations have to be fulfilled in order. Dropping the publisher with
/// remaining expectations fails the test.
pub struct MockNotificationPublisher {
    expected: Mutex<VecDeque<ExpectedNotification>>,
    published: Mutex<Vec<Value>>,
    mode: ExpectationMode,
}

impl Default for MockNotificationPublisher {
    fn default() -> Self {
        Self::with_mode(ExpectationMode::ExpectOnlyProvided)
    }
}

impl MockNotificationPublisher {
    /// Creates a new publisher with a given strictness
    pub fn with_mode(mode: ExpectationMode) -> Self {
        Self {
            expected: Mutex::new(VecDeque::new()),
            published: Mutex::new(Vec::new()),
            mode,
        }
    }

    /// Publisher that tolerates unexpected notifications
    pub fn permitting_noise() -> Self {
        Self::with_mode(ExpectationMode::AllowNoise)
    }

    /// Publisher that rejects every notification
    pub fn failing() -> Self {
        Self::with_mode(ExpectationMode::Fail)
    }

    /// Adds a notification that has to be published eventually
    pub fn expect<N: Notification>(&self, notification: &N) -> &Self {
        let value = serde_json::to_value(notification)
            .unwrap_or_else(|e| panic!("expected {} is not serializable: {}", type_name::<N>(), e));

        self.expected
            .lock()
            .unwrap()
            .push_back(ExpectedNotification {
                queue: N::queue().key().to_owned(),
                key: notification.key(),
                value,
            });

        self
    }

    /// Number of notifications which were accepted so far
    pub fn published_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    fn handle<N: Notification>(&self, notification: &N) -> Result<(), PublishError> {
        let queue = N::queue().key().to_owned();
        let key = notification.key();
        let value = serde_json::to_value(notification)
            .expect("published value failed to convert to JSON");

        match self.mode {
            ExpectationMode::Fail => {
                return Err(PublishError::Connection(MockPublishFailure.into()));
            }
            ExpectationMode::Ignore => {}
            ExpectationMode::ExpectOnlyProvided => match self.expected.lock().unwrap().pop_front() {
                None => panic!(
                    "Unexpected notification was published to {:?}: {}",
                    queue, value
                ),
                Some(expected) => {
                    assert_eq!(
                        expected.queue, queue,
                        "Notification queue (right) did not match expectation (left)"
                    );
                    assert_eq!(
                        expected.key, key,
                        "Notification key (right) did not match expectation (left)"
                    );
                    assert_eq!(expected.value, value);
                }
            },
            ExpectationMode::AllowNoise => {
                let mut expected = self.expected.lock().unwrap();
                let matches = expected
                    .front()
                    .map(|e| e.queue == queue && e.key == key && e.value == value)
                    .unwrap_or(false);

                if matches {
                    expected.pop_front();
                }
            }
        }

        self.published.lock().unwrap().push(value);
        Ok(())
    }
}

#[async_trait]
impl NotificationPublisher for MockNotificationPublisher {
    async fn publish<N: Notification + Send + Sync>(
        &self,
        notification: &N,
    ) -> Result<(), PublishError> {
        self.handle(notification)
    }
}

#[async_trait]
impl NotificationPublisher for Arc<MockNotificationPublisher> {
    async fn publish<N: Notification + Send + Sync>(
        &self,
        notification: &N,
    ) -> Result<(), PublishError> {
        self.handle(notification)
    }
}

impl Drop for MockNotificationPublisher {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }

        let remaining = self.expected.lock().map(|e| e.len()).unwrap_or_default();
        let strict = matches!(
            self.mode,
            ExpectationMode::ExpectOnlyProvided | ExpectationMode::AllowNoise
        );

        if strict && remaining > 0 {
            panic!(
                "MockNotificationPublisher was dropped with {} expected notifications remaining",
                remaining
            );
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::communication::event::QueueDescriptor;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Ping(usize);

    impl Notification for Ping {
        fn queue() -> QueueDescriptor {
            QueueDescriptor::new("ping".into(), 42)
        }
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Keyed {
        answer: usize,
        partition: String,
    }

    impl Notification for Keyed {
        fn queue() -> QueueDescriptor {
            QueueDescriptor::new("keyed".into(), 42)
        }

        fn key(&self) -> Option<String> {
            Some(self.partition.clone())
        }
    }

    #[tokio::test]
    async fn fulfill_expectations() {
        let publisher = MockNotificationPublisher::default();

        publisher.expect(&Ping(42));
        publisher.publish(&Ping(42)).await.unwrap();
        assert_eq!(publisher.published_count(), 1);
    }

    #[tokio::test]
    async fn allow_noise() {
        let publisher = MockNotificationPublisher::permitting_noise();

        publisher.expect(&Ping(42));
        publisher.publish(&Ping(1337)).await.unwrap();
        publisher.publish(&Ping(42)).await.unwrap();
        publisher.publish(&Ping(1337)).await.unwrap();
    }

    #[tokio::test]
    async fn reject_when_failing() {
        let publisher = MockNotificationPublisher::failing();
        let result = publisher.publish(&Ping(1)).await;

        assert!(matches!(result, Err(PublishError::Connection(_))));
        assert_eq!(publisher.published_count(), 0);
    }

    #[tokio::test]
    #[should_panic]
    async fn fail_on_different_key() {
        let publisher = MockNotificationPublisher::default();

        publisher.expect(&Keyed {
            answer: 42,
            partition: "left".into(),
        });
        publisher
            .publish(&Keyed {
                answer: 42,
                partition: "right".into(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    #[should_panic]
    async fn fail_on_unexpected() {
        let publisher = MockNotificationPublisher::default();
        publisher.publish(&Ping(42)).await.unwrap();
    }

    #[tokio::test]
    #[should_panic]
    async fn fail_on_missing() {
        MockNotificationPublisher::default().expect(&Ping(42));
    }
}
