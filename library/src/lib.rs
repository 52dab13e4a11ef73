//! Independent and project agnostic libraries
//!
//! Ideally, any of the library submodules in this crate can be extracted into their own crate
//! at any given time. Everything specific to the users, products and log aggregation services
//! lives in the `domain` crate, this one only provides the plumbing they are built upon.

#![deny(missing_docs)]
// Disable the lint for now as it has a high false-positive rate
#![allow(unknown_lints, clippy::nonstandard_macro_braces)]

pub mod communication;
pub mod helpers;
pub mod logging;
pub mod storage;

/// Generic error type
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result with no value and a [`BoxedError`]
pub type EmptyResult = Result<(), BoxedError>;
