use async_trait::async_trait;
use chrono::Utc;
use domain::contract::{CreateUser, DeleteUser, GetUserById, ListUsers, UpdateUser, USER_CONTRACT};
use domain::event::UserCreatedNotification;
use domain::resource::{DeleteResponse, Page, Resource, ResourceStore, StoreError, User};
use library::communication::event::NotificationPublisher;
use library::communication::rpc::{
    DispatcherError, MethodProcessor, RpcDispatcher, RpcDispatcherBuilder, RpcFault,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Implementation of the user service contract
pub struct UserService<P> {
    store: Arc<dyn ResourceStore<User>>,
    publisher: P,
}

impl<P> UserService<P>
where
    P: NotificationPublisher + Send + Sync + 'static,
{
    /// Creates a new instance from raw parts
    pub fn new(store: Arc<dyn ResourceStore<User>>, publisher: P) -> Self {
        Self { store, publisher }
    }

    /// Routing table serving every method of the contract
    pub fn dispatcher(self: Arc<Self>) -> Result<RpcDispatcher, DispatcherError> {
        self.routes().build()
    }

    /// Routes of the contract which can be extended before building the dispatcher
    pub fn routes(self: Arc<Self>) -> RpcDispatcherBuilder {
        RpcDispatcher::builder(USER_CONTRACT)
            .method::<GetUserById, _>(self.clone())
            .method::<CreateUser, _>(self.clone())
            .method::<UpdateUser, _>(self.clone())
            .method::<DeleteUser, _>(self.clone())
            .method::<ListUsers, _>(self)
    }

    async fn find(&self, id: &str) -> Result<User, RpcFault> {
        self.store
            .find(id)
            .await
            .map_err(storage_fault)?
            .ok_or_else(|| RpcFault::not_found(format!("{} not found", User::KIND)))
    }
}

fn storage_fault(error: StoreError) -> RpcFault {
    RpcFault::application(error.into())
}

#[async_trait]
impl<P> MethodProcessor<GetUserById> for UserService<P>
where
    P: NotificationPublisher + Send + Sync + 'static,
{
    async fn process(&self, request: GetUserById) -> Result<User, RpcFault> {
        self.find(&request.id).await
    }
}

#[async_trait]
impl<P> MethodProcessor<CreateUser> for UserService<P>
where
    P: NotificationPublisher + Send + Sync + 'static,
{
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn process(&self, request: CreateUser) -> Result<User, RpcFault> {
        let user = User::new(request.name, request.email, Utc::now());
        let user = self.store.insert(user).await.map_err(storage_fault)?;

        info!(id = %user.id, "User created");

        let notification = UserCreatedNotification {
            user_id: Some(user.id.clone()),
            products: request.products,
        };

        if let Err(e) = self.publisher.publish(&notification).await {
            warn!(id = %user.id, error = %e, "Unable to announce user creation");
            return Err(RpcFault::application(e.into()));
        }

        debug!(id = %user.id, products = notification.products().len(), "Announced user creation");

        Ok(user)
    }
}

#[async_trait]
impl<P> MethodProcessor<UpdateUser> for UserService<P>
where
    P: NotificationPublisher + Send + Sync + 'static,
{
    async fn process(&self, request: UpdateUser) -> Result<User, RpcFault> {
        let mut user = self.find(&request.id).await?;
        user.apply(request.changes, Utc::now());

        let user = self
            .store
            .update(user)
            .await
            .map_err(storage_fault)?
            .ok_or_else(|| RpcFault::not_found(format!("{} not found", User::KIND)))?;

        info!(id = %user.id, "User updated");
        Ok(user)
    }
}

#[async_trait]
impl<P> MethodProcessor<DeleteUser> for UserService<P>
where
    P: NotificationPublisher + Send + Sync + 'static,
{
    async fn process(&self, request: DeleteUser) -> Result<DeleteResponse, RpcFault> {
        if self.store.remove(&request.id).await.map_err(storage_fault)? {
            info!(id = %request.id, "User deleted");
            Ok(DeleteResponse::deleted::<User>())
        } else {
            Ok(DeleteResponse::not_found::<User>())
        }
    }
}

#[async_trait]
impl<P> MethodProcessor<ListUsers> for UserService<P>
where
    P: NotificationPublisher + Send + Sync + 'static,
{
    async fn process(&self, request: ListUsers) -> Result<Page<User>, RpcFault> {
        let users = self.store.list().await.map_err(storage_fault)?;
        let page = Page::paginate(users, request.page.page, request.page.limit);

        debug!(
            "Retrieved {} users from page {} with limit {}",
            page.items.len(),
            page.page,
            page.limit
        );

        Ok(page)
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use domain::resource::{demo_users, MemoryStore};
    use library::communication::implementation::memory::MemoryBroker;
    use library::communication::implementation::mock::MockNotificationPublisher;
    use library::communication::rpc::FaultKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dispatcher<P>(publisher: P) -> RpcDispatcher
    where
        P: NotificationPublisher + Send + Sync + 'static,
    {
        let store = Arc::new(MemoryStore::with_resources(demo_users(Utc::now())));
        Arc::new(UserService::new(store, publisher))
            .dispatcher()
            .unwrap()
    }

    #[tokio::test]
    async fn announce_created_users() {
        let broker = MemoryBroker::default();
        let dispatcher = dispatcher(broker.clone());

        let products = json!([
            { "name": "Mouse", "description": "Wireless", "price": 25.0, "stock": 3 }
        ]);
        let user = dispatcher
            .dispatch(
                "Create",
                json!({ "name": "Ada", "email": "ada@example.com", "products": products }),
            )
            .await
            .unwrap();

        let frames = broker.notifications::<UserCreatedNotification>("user-created");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].key(), Some("products-data"));
        assert_eq!(frames[0].user_id.as_deref(), user["id"].as_str());
        assert_eq!(frames[0].products()[0].name, "Mouse");
    }

    #[tokio::test]
    async fn fail_creation_when_announcement_fails() {
        let dispatcher = dispatcher(MockNotificationPublisher::failing());

        let fault = dispatcher
            .dispatch("Create", json!({ "name": "Ada", "email": "ada@example.com" }))
            .await
            .unwrap_err();

        assert_eq!(fault.kind, FaultKind::Application);
    }

    #[tokio::test]
    async fn report_missing_users() {
        let dispatcher = dispatcher(MockNotificationPublisher::default());

        let fault = dispatcher
            .dispatch("GetById", json!({ "id": "404" }))
            .await
            .unwrap_err();
        assert_eq!(fault.kind, FaultKind::NotFound);
        assert_eq!(fault.error.message(), Some("User not found"));

        let fault = dispatcher
            .dispatch("Update", json!({ "id": "404", "name": "Nobody" }))
            .await
            .unwrap_err();
        assert_eq!(fault.kind, FaultKind::NotFound);
    }

    #[tokio::test]
    async fn update_provided_fields_only() {
        let dispatcher = dispatcher(MockNotificationPublisher::default());

        let user = dispatcher
            .dispatch("Update", json!({ "id": "1", "email": "john@doe.dev" }))
            .await
            .unwrap();

        assert_eq!(user["name"], "John Doe");
        assert_eq!(user["email"], "john@doe.dev");
    }

    #[tokio::test]
    async fn reply_to_deletions() {
        let dispatcher = dispatcher(MockNotificationPublisher::default());

        assert_eq!(
            dispatcher.dispatch("Delete", json!({ "id": "1" })).await.unwrap(),
            json!({ "success": true, "message": "User deleted successfully" })
        );
        assert_eq!(
            dispatcher.dispatch("Delete", json!({ "id": "1" })).await.unwrap(),
            json!({ "success": false, "message": "User not found" })
        );
    }

    #[tokio::test]
    async fn paginate_listings() {
        let dispatcher = dispatcher(MockNotificationPublisher::default());

        assert_eq!(
            dispatcher
                .dispatch("GetAll", json!({ "page": 3, "limit": 10 }))
                .await
                .unwrap(),
            json!({ "items": [], "total": 2, "page": 3, "limit": 10 })
        );

        let first = dispatcher.dispatch("GetAll", json!({})).await.unwrap();
        assert_eq!(first["items"].as_array().map(Vec::len), Some(2));
        assert_eq!(first["limit"], 10);
    }
}
