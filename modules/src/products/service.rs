use async_trait::async_trait;
use chrono::Utc;
use domain::contract::{
    CreateProduct, DeleteProduct, GetProductById, ListProducts, UpdateProduct, PRODUCT_CONTRACT,
};
use domain::resource::{DeleteResponse, Page, Product, Resource, ResourceStore, StoreError};
use library::communication::rpc::{
    DispatcherError, MethodProcessor, RpcDispatcher, RpcDispatcherBuilder, RpcFault,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Implementation of the product service contract
pub struct ProductService {
    store: Arc<dyn ResourceStore<Product>>,
}

impl ProductService {
    /// Creates a new instance operating on the given store
    pub fn new(store: Arc<dyn ResourceStore<Product>>) -> Self {
        Self { store }
    }

    /// Routing table serving every method of the contract
    pub fn dispatcher(self: Arc<Self>) -> Result<RpcDispatcher, DispatcherError> {
        self.routes().build()
    }

    /// Routes of the contract which can be extended before building the dispatcher
    pub fn routes(self: Arc<Self>) -> RpcDispatcherBuilder {
        RpcDispatcher::builder(PRODUCT_CONTRACT)
            .method::<GetProductById, _>(self.clone())
            .method::<CreateProduct, _>(self.clone())
            .method::<UpdateProduct, _>(self.clone())
            .method::<DeleteProduct, _>(self.clone())
            .method::<ListProducts, _>(self)
    }

    async fn find(&self, id: &str) -> Result<Product, RpcFault> {
        self.store
            .find(id)
            .await
            .map_err(storage_fault)?
            .ok_or_else(not_found)
    }
}

fn storage_fault(error: StoreError) -> RpcFault {
    RpcFault::application(error.into())
}

fn not_found() -> RpcFault {
    RpcFault::not_found(format!("{} not found", Product::KIND))
}

#[async_trait]
impl MethodProcessor<GetProductById> for ProductService {
    async fn process(&self, request: GetProductById) -> Result<Product, RpcFault> {
        self.find(&request.id).await
    }
}

#[async_trait]
impl MethodProcessor<CreateProduct> for ProductService {
    async fn process(&self, request: CreateProduct) -> Result<Product, RpcFault> {
        let product = Product::new(request.data, Utc::now());
        let product = self.store.insert(product).await.map_err(storage_fault)?;

        info!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }
}

#[async_trait]
impl MethodProcessor<UpdateProduct> for ProductService {
    async fn process(&self, request: UpdateProduct) -> Result<Product, RpcFault> {
        let mut product = self.find(&request.id).await?;
        product.apply(request.changes, Utc::now());

        let product = self
            .store
            .update(product)
            .await
            .map_err(storage_fault)?
            .ok_or_else(not_found)?;

        info!(id = %product.id, "Product updated");
        Ok(product)
    }
}

#[async_trait]
impl MethodProcessor<DeleteProduct> for ProductService {
    async fn process(&self, request: DeleteProduct) -> Result<DeleteResponse, RpcFault> {
        if self.store.remove(&request.id).await.map_err(storage_fault)? {
            info!(id = %request.id, "Product deleted");
            Ok(DeleteResponse::deleted::<Product>())
        } else {
            Ok(DeleteResponse::not_found::<Product>())
        }
    }
}

#[async_trait]
impl MethodProcessor<ListProducts> for ProductService {
    async fn process(&self, request: ListProducts) -> Result<Page<Product>, RpcFault> {
        let products = self.store.list().await.map_err(storage_fault)?;
        let page = Page::paginate(products, request.page.page, request.page.limit);

        debug!(
            "Retrieved {} products from page {} with limit {}",
            page.items.len(),
            page.page,
            page.limit
        );

        Ok(page)
    }
}
