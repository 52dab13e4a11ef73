//! Synchronous service-to-service calls over HTTP
//!
//! Each service exposes one contract, a set of named [methods](RemoteMethod) with a request
//! and a response type. Calls are sent as `POST /rpc/{contract}/{method}` with a JSON body.
//! The reply is an [`RpcReply`] which either carries the response or an [`RpcFault`].
//! Application failures (e.g. a resource that does not exist) thus travel as regular replies
//! and callers can tell them apart from transport failures such as an unreachable peer.

mod client;
mod dispatcher;
mod error;
mod method;
mod server;

pub use client::*;
pub use dispatcher::*;
pub use error::*;
pub use method::*;
pub use server::*;
