//! Resources owned by the services and the capability to store them

mod page;
mod product;
mod store;
mod user;

pub use page::*;
pub use product::*;
pub use store::*;
pub use user::*;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Entity which is uniquely identified and owned by exactly one service
pub trait Resource: Clone + Send + Sync {
    /// Human readable type name used in replies (e.g. `User`)
    const KIND: &'static str;

    /// Unique identifier
    fn id(&self) -> &str;
}

/// Reply to a deletion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Whether a resource has been removed
    pub success: bool,
    /// Human readable outcome
    pub message: String,
}

impl DeleteResponse {
    /// Reply for a removed resource
    pub fn deleted<R: Resource>() -> Self {
        Self {
            success: true,
            message: format!("{} deleted successfully", R::KIND),
        }
    }

    /// Reply for a resource that did not exist
    pub fn not_found<R: Resource>() -> Self {
        Self {
            success: false,
            message: format!("{} not found", R::KIND),
        }
    }
}

/// Formats a timestamp the way it is stored in resources
pub fn resource_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
