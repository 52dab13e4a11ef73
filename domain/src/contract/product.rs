use super::{PageRequest, RelayedMethod};
use crate::resource::{CreateProductData, DeleteResponse, Page, Product, ProductChanges};
use library::communication::discovery::ServiceEndpoint;
use library::communication::rpc::{RemoteMethod, RpcClient, RpcError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retrieves a product, fails with a not-found fault if it does not exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetProductById {
    /// Identifier of the product
    pub id: String,
}

impl RemoteMethod for GetProductById {
    const NAME: &'static str = "GetById";
    type Response = Product;
}

impl RelayedMethod for GetProductById {
    const RELAY_NAME: &'static str = "GetProductById";
}

/// Creates a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProduct {
    /// Fields of the new product
    #[serde(flatten)]
    pub data: CreateProductData,
}

impl RemoteMethod for CreateProduct {
    const NAME: &'static str = "Create";
    type Response = Product;
}

impl RelayedMethod for CreateProduct {
    const RELAY_NAME: &'static str = "CreateProduct";
}

/// Modifies a product, fails with a not-found fault if it does not exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProduct {
    /// Identifier of the product
    pub id: String,
    /// Fields to change
    #[serde(flatten)]
    pub changes: ProductChanges,
}

impl RemoteMethod for UpdateProduct {
    const NAME: &'static str = "Update";
    type Response = Product;
}

impl RelayedMethod for UpdateProduct {
    const RELAY_NAME: &'static str = "UpdateProduct";
}

/// Removes a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteProduct {
    /// Identifier of the product
    pub id: String,
}

impl RemoteMethod for DeleteProduct {
    const NAME: &'static str = "Delete";
    type Response = DeleteResponse;
}

impl RelayedMethod for DeleteProduct {
    const RELAY_NAME: &'static str = "DeleteProduct";
}

/// Lists products page by page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListProducts {
    /// Requested page
    #[serde(flatten)]
    pub page: PageRequest,
}

impl RemoteMethod for ListProducts {
    const NAME: &'static str = "GetAll";
    type Response = Page<Product>;
}

impl RelayedMethod for ListProducts {
    const RELAY_NAME: &'static str = "GetAllProducts";
}

/// Typed client of the product service contract
#[derive(Clone)]
pub struct ProductServiceClient {
    client: RpcClient,
}

impl ProductServiceClient {
    /// Binds to the given endpoint
    pub fn bind(endpoint: ServiceEndpoint, timeout: Duration) -> Self {
        Self {
            client: RpcClient::bind(endpoint).with_timeout(timeout),
        }
    }

    /// Retrieves a product
    pub async fn get_by_id(&self, id: impl Into<String>) -> Result<Product, RpcError> {
        self.client.call(&GetProductById { id: id.into() }).await
    }

    /// Creates a product
    pub async fn create(&self, data: CreateProductData) -> Result<Product, RpcError> {
        self.client.call(&CreateProduct { data }).await
    }

    /// Modifies a product
    pub async fn update(
        &self,
        id: impl Into<String>,
        changes: ProductChanges,
    ) -> Result<Product, RpcError> {
        self.client
            .call(&UpdateProduct {
                id: id.into(),
                changes,
            })
            .await
    }

    /// Removes a product
    pub async fn delete(&self, id: impl Into<String>) -> Result<DeleteResponse, RpcError> {
        self.client.call(&DeleteProduct { id: id.into() }).await
    }

    /// Lists products
    pub async fn get_all(&self, page: PageRequest) -> Result<Page<Product>, RpcError> {
        self.client.call(&ListProducts { page }).await
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn flatten_request_fields() {
        let request = UpdateProduct {
            id: "1".into(),
            changes: ProductChanges {
                stock: Some(3),
                ..Default::default()
            },
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "id": "1", "stock": 3 })
        );
    }

    #[test]
    fn accept_empty_listing_requests() {
        let request: ListProducts = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request, ListProducts::default());
    }
}
