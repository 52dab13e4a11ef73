//! Structures to communicate between services in a distributed system
//!
//! There are two modes of operation:
//!
//! 1. Publish and subscribe
//! 2. Remote procedure calls
//!
//! The first is used for event notifications. Whenever something noteworthy happens in one
//! service, a notification describing what happened is published to a durable topic.
//! The notification data structure implements the [`Notification`](event::Notification) trait and
//! thus describes where to expect it in a type-safe manner. Everybody can publish notifications
//! and every interested [consumer group](event::ConsumerGroupDescriptor) may react to them.
//! For more details consult the [`event`] module.
//!
//! The second mode is a direct request and response between two services. A caller binds an
//! [`RpcClient`](rpc::RpcClient) to an [endpoint](discovery::ServiceEndpoint) obtained from the
//! [resolver](discovery::StaticServiceResolver) and the callee routes incoming calls through an
//! [`RpcDispatcher`](rpc::RpcDispatcher) to its handlers.

mod codec;
mod communication_factory;
mod error;

pub mod discovery;
pub mod event;
pub mod implementation;
pub mod rpc;

pub use codec::*;
pub use communication_factory::CommunicationFactory;
pub use error::BlackboxError;
