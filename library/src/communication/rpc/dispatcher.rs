use super::{MethodProcessor, RemoteMethod, RpcFault};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

type BoxedHandler = Box<dyn Fn(Value) -> BoxFuture<'static, Result<Value, RpcFault>> + Send + Sync>;

/// Errors raised while assembling an [`RpcDispatcher`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatcherError {
    /// A method has been registered more than once
    #[error("method {method} of contract {contract} is registered more than once")]
    DuplicateMethod {
        /// Contract name
        contract: String,
        /// Method name
        method: String,
    },
}

/// Routes calls of one contract to their handlers
///
/// The routing table is immutable once built, handlers are never retried.
pub struct RpcDispatcher {
    contract: String,
    handlers: HashMap<&'static str, BoxedHandler>,
}

impl RpcDispatcher {
    /// Starts assembling a dispatcher for the given contract
    pub fn builder(contract: impl Into<String>) -> RpcDispatcherBuilder {
        RpcDispatcherBuilder {
            contract: contract.into(),
            handlers: Vec::new(),
        }
    }

    /// Name of the contract served
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Names of all registered methods in no particular order
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().copied()
    }

    /// Invokes the handler registered for a method
    pub async fn dispatch(&self, method: &str, request: Value) -> Result<Value, RpcFault> {
        let handler = self.handlers.get(method).ok_or_else(|| {
            warn!(contract = %self.contract, method, "Call of unknown method");
            RpcFault::method_not_found(&self.contract, method)
        })?;

        debug!(contract = %self.contract, method, "Dispatching call");
        let result = handler(request).await;

        if let Err(fault) = &result {
            debug!(contract = %self.contract, method, %fault, "Call failed");
        }

        result
    }
}

/// Builder for an [`RpcDispatcher`]
pub struct RpcDispatcherBuilder {
    contract: String,
    handlers: Vec<(&'static str, BoxedHandler)>,
}

impl RpcDispatcherBuilder {
    /// Registers a processor for the method `M`
    pub fn method<M, P>(self, processor: Arc<P>) -> Self
    where
        M: RemoteMethod + 'static,
        P: MethodProcessor<M> + Send + Sync + 'static,
    {
        self.method_as::<M, P>(M::NAME, processor)
    }

    /// Registers a processor for the method `M` under a different name
    ///
    /// Used to serve methods of another contract, e.g. when relaying calls to a peer.
    pub fn method_as<M, P>(mut self, name: &'static str, processor: Arc<P>) -> Self
    where
        M: RemoteMethod + 'static,
        P: MethodProcessor<M> + Send + Sync + 'static,
    {
        let handler: BoxedHandler = Box::new(move |request: Value| {
            let processor = processor.clone();

            Box::pin(async move {
                let request: M =
                    serde_json::from_value(request).map_err(RpcFault::invalid_request)?;
                let response = processor.process(request).await?;

                serde_json::to_value(response).map_err(|e| RpcFault::application(e.into()))
            }) as BoxFuture<'static, Result<Value, RpcFault>>
        });

        self.handlers.push((name, handler));
        self
    }

    /// Validates the routing table and creates the dispatcher
    pub fn build(self) -> Result<RpcDispatcher, DispatcherError> {
        let mut handlers = HashMap::with_capacity(self.handlers.len());

        for (method, handler) in self.handlers {
            if handlers.insert(method, handler).is_some() {
                return Err(DispatcherError::DuplicateMethod {
                    contract: self.contract,
                    method: method.to_owned(),
                });
            }
        }

        Ok(RpcDispatcher {
            contract: self.contract,
            handlers,
        })
    }
}
