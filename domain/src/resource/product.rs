use super::{resource_timestamp, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields required to create a [`Product`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProductData {
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Unit price
    pub price: f64,
    /// Units in stock
    pub stock: u32,
}

/// Article owned by the product service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Unit price
    pub price: f64,
    /// Units in stock
    pub stock: u32,
    /// ISO-8601 time of creation
    pub created_at: String,
    /// ISO-8601 time of the last modification
    pub updated_at: String,
}

impl Product {
    /// Creates a new product with a random identifier
    pub fn new(data: CreateProductData, now: DateTime<Utc>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), data, now)
    }

    /// Creates a product for a user, the identifier is derived from its origin
    ///
    /// Creating the same product for the same user twice yields the same identifier which
    /// allows replayed notifications to be detected.
    pub fn for_user(
        user_id: &str,
        index: usize,
        data: CreateProductData,
        now: DateTime<Utc>,
    ) -> Self {
        let id = Self::derived_id(user_id, index, &data.name);
        Self::with_id(id, data, now)
    }

    /// Identifier of the `index`-th product created on behalf of a user
    pub fn derived_id(user_id: &str, index: usize, name: &str) -> String {
        let origin = format!("{}/{}/{}", user_id, index, name);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, origin.as_bytes()).to_string()
    }

    fn with_id(id: String, data: CreateProductData, now: DateTime<Utc>) -> Self {
        let timestamp = resource_timestamp(now);

        Self {
            id,
            name: data.name,
            description: data.description,
            price: data.price,
            stock: data.stock,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        }
    }

    /// Applies the provided fields and bumps the modification time
    pub fn apply(&mut self, changes: ProductChanges, now: DateTime<Utc>) {
        if let Some(name) = changes.name {
            self.name = name;
        }

        if let Some(description) = changes.description {
            self.description = description;
        }

        if let Some(price) = changes.price {
            self.price = price;
        }

        if let Some(stock) = changes.stock {
            self.stock = stock;
        }

        self.updated_at = resource_timestamp(now);
    }
}

impl Resource for Product {
    const KIND: &'static str = "Product";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Partial modification of a [`Product`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductChanges {
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New unit price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// New stock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

/// Products every fresh product service starts with
pub fn demo_products(now: DateTime<Utc>) -> Vec<Product> {
    vec![
        Product::with_id(
            "1".into(),
            CreateProductData {
                name: "Laptop".into(),
                description: "High-performance laptop".into(),
                price: 999.99,
                stock: 10,
            },
            now,
        ),
        Product::with_id(
            "2".into(),
            CreateProductData {
                name: "Smartphone".into(),
                description: "Latest smartphone model".into(),
                price: 699.99,
                stock: 25,
            },
            now,
        ),
    ]
}
