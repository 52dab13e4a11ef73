use super::{PageRequest, RelayedMethod};
use crate::resource::{CreateProductData, DeleteResponse, Page, User, UserChanges};
use library::communication::discovery::ServiceEndpoint;
use library::communication::rpc::{RemoteMethod, RpcClient, RpcError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retrieves a user, fails with a not-found fault if it does not exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUserById {
    /// Identifier of the user
    pub id: String,
}

impl RemoteMethod for GetUserById {
    const NAME: &'static str = "GetById";
    type Response = User;
}

impl RelayedMethod for GetUserById {
    const RELAY_NAME: &'static str = "GetUserById";
}

/// Creates a user and requests the creation of its products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUser {
    /// Display name
    pub name: String,
    /// Contact address
    pub email: String,
    /// Products to create on behalf of the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<CreateProductData>>,
}

impl RemoteMethod for CreateUser {
    const NAME: &'static str = "Create";
    type Response = User;
}

impl RelayedMethod for CreateUser {
    const RELAY_NAME: &'static str = "CreateUser";
}

/// Modifies a user, fails with a not-found fault if it does not exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUser {
    /// Identifier of the user
    pub id: String,
    /// Fields to change
    #[serde(flatten)]
    pub changes: UserChanges,
}

impl RemoteMethod for UpdateUser {
    const NAME: &'static str = "Update";
    type Response = User;
}

impl RelayedMethod for UpdateUser {
    const RELAY_NAME: &'static str = "UpdateUser";
}

/// Removes a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteUser {
    /// Identifier of the user
    pub id: String,
}

impl RemoteMethod for DeleteUser {
    const NAME: &'static str = "Delete";
    type Response = DeleteResponse;
}

impl RelayedMethod for DeleteUser {
    const RELAY_NAME: &'static str = "DeleteUser";
}

/// Lists users page by page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUsers {
    /// Requested page
    #[serde(flatten)]
    pub page: PageRequest,
}

impl RemoteMethod for ListUsers {
    const NAME: &'static str = "GetAll";
    type Response = Page<User>;
}

impl RelayedMethod for ListUsers {
    const RELAY_NAME: &'static str = "GetAllUsers";
}

/// Typed client of the user service contract
#[derive(Clone)]
pub struct UserServiceClient {
    client: RpcClient,
}

impl UserServiceClient {
    /// Binds to the given endpoint
    pub fn bind(endpoint: ServiceEndpoint, timeout: Duration) -> Self {
        Self {
            client: RpcClient::bind(endpoint).with_timeout(timeout),
        }
    }

    /// Retrieves a user
    pub async fn get_by_id(&self, id: impl Into<String>) -> Result<User, RpcError> {
        self.client.call(&GetUserById { id: id.into() }).await
    }

    /// Creates a user
    pub async fn create(&self, request: CreateUser) -> Result<User, RpcError> {
        self.client.call(&request).await
    }

    /// Modifies a user
    pub async fn update(
        &self,
        id: impl Into<String>,
        changes: UserChanges,
    ) -> Result<User, RpcError> {
        self.client
            .call(&UpdateUser {
                id: id.into(),
                changes,
            })
            .await
    }

    /// Removes a user
    pub async fn delete(&self, id: impl Into<String>) -> Result<DeleteResponse, RpcError> {
        self.client.call(&DeleteUser { id: id.into() }).await
    }

    /// Lists users
    pub async fn get_all(&self, page: PageRequest) -> Result<Page<User>, RpcError> {
        self.client.call(&ListUsers { page }).await
    }
}
