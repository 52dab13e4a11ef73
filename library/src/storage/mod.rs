//! Durable destinations for structured records
//!
//! Two kinds of storage are provided: a [rotating file archive](RotatingFileArchive) which
//! keeps one file per day and bounds both size and age, and a [document index](DocumentIndex)
//! abstraction for append-only, searchable collections.

mod index;
mod rotating;

pub use index::*;
pub use rotating::*;
