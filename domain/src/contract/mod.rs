//! Remote call contracts served by the services
//!
//! Every contract consists of the same five methods: `GetById`, `Create`, `Update`, `Delete`
//! and `GetAll`. Each method is represented by its request type which implements
//! [`RemoteMethod`](library::communication::rpc::RemoteMethod), and each contract comes with a
//! typed client.
//!
//! Each service additionally relays the contract of its peer: the user service serves
//! `GetProductById`, `GetAllProducts`, `CreateProduct`, `UpdateProduct` and `DeleteProduct`
//! and forwards them to the product service, and vice versa. The names are provided by
//! [`RelayedMethod`].

mod product;
mod user;

pub use product::*;
pub use user::*;

use library::communication::rpc::RemoteMethod;
use serde::{Deserialize, Serialize};

/// Name of the user service contract
pub const USER_CONTRACT: &str = "user.UserService";

/// Name of the product service contract
pub const PRODUCT_CONTRACT: &str = "product.ProductService";

/// Optional paging parameters of a `GetAll` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// One-based page number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    /// Maximum number of items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Method of a peer contract which the other service serves by forwarding it to the owner
pub trait RelayedMethod: RemoteMethod {
    /// Name under which the relaying service registers the method
    const RELAY_NAME: &'static str;
}
