use async_trait::async_trait;
use domain::contract::{
    CreateProduct, DeleteProduct, GetProductById, ListProducts, ProductServiceClient,
    RelayedMethod, UpdateProduct,
};
use domain::resource::{DeleteResponse, Page, Product};
use library::communication::rpc::{MethodProcessor, RpcDispatcherBuilder, RpcFault};
use std::sync::Arc;
use tracing::debug;

/// Serves the product contract on behalf of the product service
///
/// Calls are forwarded as they are, faults of the product service reach the caller unchanged.
pub struct ProductRelay {
    products: ProductServiceClient,
}

impl ProductRelay {
    /// Creates a new instance forwarding to the given client
    pub fn new(products: ProductServiceClient) -> Self {
        Self { products }
    }

    /// Adds the relayed methods to a routing table
    pub fn register(self: Arc<Self>, routes: RpcDispatcherBuilder) -> RpcDispatcherBuilder {
        routes
            .method_as::<GetProductById, _>(GetProductById::RELAY_NAME, self.clone())
            .method_as::<CreateProduct, _>(CreateProduct::RELAY_NAME, self.clone())
            .method_as::<UpdateProduct, _>(UpdateProduct::RELAY_NAME, self.clone())
            .method_as::<DeleteProduct, _>(DeleteProduct::RELAY_NAME, self.clone())
            .method_as::<ListProducts, _>(ListProducts::RELAY_NAME, self)
    }
}

#[async_trait]
impl MethodProcessor<GetProductById> for ProductRelay {
    async fn process(&self, request: GetProductById) -> Result<Product, RpcFault> {
        debug!(id = %request.id, "Relaying product lookup");
        Ok(self.products.get_by_id(request.id).await?)
    }
}

#[async_trait]
impl MethodProcessor<CreateProduct> for ProductRelay {
    async fn process(&self, request: CreateProduct) -> Result<Product, RpcFault> {
        Ok(self.products.create(request.data).await?)
    }
}

#[async_trait]
impl MethodProcessor<UpdateProduct> for ProductRelay {
    async fn process(&self, request: UpdateProduct) -> Result<Product, RpcFault> {
        Ok(self.products.update(request.id, request.changes).await?)
    }
}

#[async_trait]
impl MethodProcessor<DeleteProduct> for ProductRelay {
    async fn process(&self, request: DeleteProduct) -> Result<DeleteResponse, RpcFault> {
        Ok(self.products.delete(request.id).await?)
    }
}

#[async_trait]
impl MethodProcessor<ListProducts> for ProductRelay {
    async fn process(&self, request: ListProducts) -> Result<Page<Product>, RpcFault> {
        Ok(self.products.get_all(request.page).await?)
    }
}
