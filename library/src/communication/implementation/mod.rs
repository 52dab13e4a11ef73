//! Implementations of traits from this module using third-party crates

pub mod json;
pub mod redis;

#[cfg(any(test, feature = "test"))]
pub mod memory;
#[cfg(any(test, feature = "test"))]
pub mod mock;
