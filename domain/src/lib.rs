//! Domain specific structures shared by the services
//!
//! Contains the resources owned by the services, the notifications they exchange, the remote
//! call contracts they serve and the static table of their network locations.

#![deny(missing_docs)]
// Disable the lint for now as it has a high false-positive rate
#![allow(unknown_lints, clippy::nonstandard_macro_braces)]

pub mod contract;
pub mod discovery;
pub mod event;
pub mod resource;

/// Maximum number of entries retained in a queue which carries state changes
pub const QUEUE_SIZE_STATE_CHANGES: usize = 10_000;
