use super::QueueDescriptor;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::ops::{Deref, DerefMut};

/// Entity to notify other services about an event that took place
pub trait Notification: Serialize + DeserializeOwned + PartialEq + Debug {
    /// Queue on which this implementation can be sent and received
    fn queue() -> QueueDescriptor;

    /// Ordering affinity of the notification
    ///
    /// Notifications sharing a key are delivered to a consumer group in publication order.
    fn key(&self) -> Option<String> {
        None
    }
}

/// Envelope which wraps every notification on the wire
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFrame<N> {
    topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    produced_at: DateTime<Utc>,
    payload: N,
}

impl<N: Notification> NotificationFrame<N> {
    /// Wraps a notification, stamping it with the current time
    pub fn new(payload: N) -> Self {
        Self {
            topic: N::queue().key().to_owned(),
            key: payload.key(),
            produced_at: Utc::now(),
            payload,
        }
    }
}

impl<'a, N: Notification> NotificationFrame<&'a N> {
    /// Wraps a borrowed notification, used when publishing
    pub fn borrowed(payload: &'a N) -> Self {
        Self {
            topic: N::queue().key().to_owned(),
            key: payload.key(),
            produced_at: Utc::now(),
            payload,
        }
    }
}

impl<N> NotificationFrame<N> {
    /// Name of the queue the notification has been published to
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Ordering affinity of the notification
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Time at which the notification was created by the publisher
    pub fn publication_time(&self) -> &DateTime<Utc> {
        &self.produced_at
    }

    /// Discards the envelope and returns the notification
    pub fn into_inner(self) -> N {
        self.payload
    }
}

impl<N> Deref for NotificationFrame<N> {
    type Target = N;

    fn deref(&self) -> &Self::Target {
        &self.payload
    }
}

impl<N> DerefMut for NotificationFrame<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.payload
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::communication::{decode_as, encode};
    use pretty_assertions::assert_eq;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Heartbeat {
        origin: String,
    }

    impl Notification for Heartbeat {
        fn queue() -> QueueDescriptor {
            QueueDescriptor::new("heartbeats".into(), 10)
        }

        fn key(&self) -> Option<String> {
            Some(self.origin.clone())
        }
    }

    #[test]
    fn carry_topic_and_key() {
        let frame = NotificationFrame::new(Heartbeat {
            origin: "alpha".into(),
        });

        assert_eq!(frame.topic(), "heartbeats");
        assert_eq!(frame.key(), Some("alpha"));
        assert_eq!(frame.origin, "alpha");
    }

    #[test]
    fn serialize_with_camel_case_fields() {
        let frame = NotificationFrame::new(Heartbeat {
            origin: "beta".into(),
        });
        let bytes = encode(&frame).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();

        assert!(text.contains("\"producedAt\""));
        assert_eq!(decode_as::<NotificationFrame<Heartbeat>>(&bytes).unwrap(), frame);
    }
}
