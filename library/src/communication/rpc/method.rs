use super::RpcFault;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request of a remote method, names the method and its response
pub trait RemoteMethod: Serialize + DeserializeOwned + Send + Sync {
    /// Name under which the method is registered within its contract
    const NAME: &'static str;

    /// Type returned by the method
    type Response: Serialize + DeserializeOwned + Send + Sync;
}

/// Structure which processes calls of one [`RemoteMethod`]
///
/// A single service usually implements it once for every method of its contract.
#[async_trait]
pub trait MethodProcessor<M: RemoteMethod> {
    /// Handler for calls, returning a response or a fault
    async fn process(&self, request: M) -> Result<M::Response, RpcFault>;
}

/// Wire format of a reply
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum RpcReply {
    /// Call succeeded
    Ok(Value),
    /// Call failed on the application level
    Fault(RpcFault),
}

impl From<Result<Value, RpcFault>> for RpcReply {
    fn from(result: Result<Value, RpcFault>) -> Self {
        match result {
            Ok(value) => RpcReply::Ok(value),
            Err(fault) => RpcReply::Fault(fault),
        }
    }
}
