use super::{resource_timestamp, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account owned by the user service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Contact address
    pub email: String,
    /// ISO-8601 time of creation
    pub created_at: String,
    /// ISO-8601 time of the last modification
    pub updated_at: String,
}

impl User {
    /// Creates a new user with a random identifier
    pub fn new(name: impl Into<String>, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name, email, now)
    }

    fn with_id(
        id: String,
        name: impl Into<String>,
        email: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let timestamp = resource_timestamp(now);

        Self {
            id,
            name: name.into(),
            email: email.into(),
            created_at: timestamp.clone(),
            updated_at: timestamp,
        }
    }

    /// Applies the provided fields and bumps the modification time
    pub fn apply(&mut self, changes: UserChanges, now: DateTime<Utc>) {
        if let Some(name) = changes.name {
            self.name = name;
        }

        if let Some(email) = changes.email {
            self.email = email;
        }

        self.updated_at = resource_timestamp(now);
    }
}

impl Resource for User {
    const KIND: &'static str = "User";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Users every fresh user service starts with
pub fn demo_users(now: DateTime<Utc>) -> Vec<User> {
    vec![
        User::with_id("1".into(), "John Doe", "john@example.com", now),
        User::with_id("2".into(), "Jane Smith", "jane@example.com", now),
    ]
}

/// Partial modification of a [`User`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChanges {
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New contact address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
