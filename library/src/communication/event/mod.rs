//! Structures to realise an event-driven service architecture
//!
//! Services have no knowledge of each other. Each service operates independently and for
//! every event that is of relevance to others, a [`Notification`] is published to a durable
//! [queue](QueueDescriptor) (also called topic). Every interested party may subscribe to it and
//! react, usually publishing further notifications along the way.
//!
//! Notifications are consumed reliably using [consumer groups](ConsumerGroupDescriptor).
//! Messages are stored in a log-like data structure of limited length and each group tracks
//! its own position. When a group is first created, the [`QueueLocation`] decides whether it
//! begins at the oldest retained notification or only sees new ones. Every entry has to be
//! acknowledged once processing concludes; after a crash the consumer first re-reads the
//! entries it received but never acknowledged and then resumes with new ones.
//!
//! Delivery is thus at-least-once and handlers have to be idempotent. Entries are processed
//! sequentially by the [`EventConsumer`] so that publication order is retained.

mod consumer;
mod consumer_group;
mod event_consumer;
mod notification;
mod publisher;
mod queue;
mod queue_provider;

pub use consumer::*;
pub use consumer_group::*;
pub use event_consumer::*;
pub use notification::*;
pub use publisher::*;
pub use queue::*;
pub use queue_provider::*;
