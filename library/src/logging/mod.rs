//! Leveled log records and their distribution to remote aggregators
//!
//! Every log statement emitted through [`tracing`] is written to the local console by the
//! regular formatting layer. The [`LogForwardingLayer`] additionally captures each event as a
//! [`LogRecord`] and hands it to a [`LogForwarderJob`] which publishes it to the log queue.
//! Publishing happens in the background so a log call never waits for the broker, and failures
//! are only ever reported locally.

mod forwarder;
mod layer;
mod record;

pub use forwarder::*;
pub use layer::*;
pub use record::*;

/// Target which marks events that must never leave the process
///
/// Used by the forwarding machinery itself to report failures without feeding them back into
/// the pipeline that just failed.
pub const LOCAL_ONLY_TARGET: &str = "local_only";

/// Service name attached to records whose producer did not identify itself
pub const DEFAULT_SERVICE_NAME: &str = "default-service";
