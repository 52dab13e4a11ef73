use async_trait::async_trait;
use domain::contract::{
    CreateUser, DeleteUser, GetUserById, ListUsers, RelayedMethod, UpdateUser, UserServiceClient,
};
use domain::resource::{DeleteResponse, Page, User};
use library::communication::rpc::{MethodProcessor, RpcDispatcherBuilder, RpcFault};
use std::sync::Arc;
use tracing::debug;

/// Serves the user contract on behalf of the user service
pub struct UserRelay {
    users: UserServiceClient,
}

impl UserRelay {
    /// Creates a new instance forwarding to the given client
    pub fn new(users: UserServiceClient) -> Self {
        Self { users }
    }

    /// Adds the relayed methods to a routing table
    pub fn register(self: Arc<Self>, routes: RpcDispatcherBuilder) -> RpcDispatcherBuilder {
        routes
            .method_as::<GetUserById, _>(GetUserById::RELAY_NAME, self.clone())
            .method_as::<CreateUser, _>(CreateUser::RELAY_NAME, self.clone())
            .method_as::<UpdateUser, _>(UpdateUser::RELAY_NAME, self.clone())
            .method_as::<DeleteUser, _>(DeleteUser::RELAY_NAME, self.clone())
            .method_as::<ListUsers, _>(ListUsers::RELAY_NAME, self)
    }
}

#[async_trait]
impl MethodProcessor<GetUserById> for UserRelay {
    async fn process(&self, request: GetUserById) -> Result<User, RpcFault> {
        debug!(id = %request.id, "Relaying user lookup");
        Ok(self.users.get_by_id(request.id).await?)
    }
}

#[async_trait]
impl MethodProcessor<CreateUser> for UserRelay {
    async fn process(&self, request: CreateUser) -> Result<User, RpcFault> {
        Ok(self.users.create(request).await?)
    }
}

#[async_trait]
impl MethodProcessor<UpdateUser> for UserRelay {
    async fn process(&self, request: UpdateUser) -> Result<User, RpcFault> {
        Ok(self.users.update(request.id, request.changes).await?)
    }
}

#[async_trait]
impl MethodProcessor<DeleteUser> for UserRelay {
    async fn process(&self, request: DeleteUser) -> Result<DeleteResponse, RpcFault> {
        Ok(self.users.delete(request.id).await?)
    }
}

#[async_trait]
impl MethodProcessor<ListUsers> for UserRelay {
    async fn process(&self, request: ListUsers) -> Result<Page<User>, RpcFault> {
        Ok(self.users.get_all(request.page).await?)
    }
}
