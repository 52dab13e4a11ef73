use crate::resource::CreateProductData;
use crate::QUEUE_SIZE_STATE_CHANGES;
use library::communication::event::{Notification, QueueDescriptor};
use serde::{Deserialize, Serialize};

const QUEUE_KEY: &str = "user-created";
const ORDERING_KEY: &str = "products-data";

/// A user has been stored, optionally with products that should be created on its behalf
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreatedNotification {
    /// Identifier of the new user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Products to create for the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<CreateProductData>>,
}

impl UserCreatedNotification {
    /// Products to create, empty if none were listed
    pub fn products(&self) -> &[CreateProductData] {
        self.products.as_deref().unwrap_or_default()
    }
}

impl Notification for UserCreatedNotification {
    fn queue() -> QueueDescriptor {
        QueueDescriptor::new(QUEUE_KEY.into(), QUEUE_SIZE_STATE_CHANGES)
    }

    fn key(&self) -> Option<String> {
        Some(ORDERING_KEY.into())
    }
}
