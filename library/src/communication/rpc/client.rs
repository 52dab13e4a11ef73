use super::{RemoteMethod, RpcError, RpcReply};
use crate::communication::discovery::ServiceEndpoint;
use crate::communication::BlackboxError;
use crate::BoxedError;
use hyper::client::HttpConnector;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Client, Request};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tracing::trace;

/// Time after which a call is abandoned unless configured otherwise
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to the contract of a peer service
///
/// Binding does not contact the peer, connection errors surface on the first call.
#[derive(Clone)]
pub struct RpcClient {
    endpoint: ServiceEndpoint,
    client: Client<HttpConnector>,
    timeout: Duration,
}

impl RpcClient {
    /// Binds to the contract served at the endpoint
    pub fn bind(endpoint: ServiceEndpoint) -> Self {
        Self {
            endpoint,
            client: Client::new(),
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Replaces the call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint the client is bound to
    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    /// Calls a typed remote method
    pub async fn call<M: RemoteMethod>(&self, request: &M) -> Result<M::Response, RpcError> {
        let request = serde_json::to_value(request)
            .map_err(|e| RpcError::InvalidRequest(BlackboxError::new(e)))?;
        let response = self.call_raw(M::NAME, request).await?;

        serde_json::from_value(response).map_err(|e| RpcError::InvalidResponse(e.into()))
    }

    /// Calls a remote method by name with an untyped request
    pub async fn call_raw(&self, method: &str, request: Value) -> Result<Value, RpcError> {
        let uri = format!(
            "http://{}/rpc/{}/{}",
            self.endpoint.authority(),
            self.endpoint.contract_name(),
            method
        );

        let body = serde_json::to_vec(&request)
            .map_err(|e| RpcError::InvalidRequest(BlackboxError::new(e)))?;

        let request = Request::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|e| self.transport_error(e.into()))?;

        trace!(endpoint = %self.endpoint, method, "Calling remote method");

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| self.transport_error(e.into()))?;

            let status = response.status();
            let bytes = hyper::body::to_bytes(response.into_body())
                .await
                .map_err(|e| self.transport_error(e.into()))?;

            Ok::<_, RpcError>((status, bytes))
        };

        let (status, bytes) = timeout(self.timeout, exchange)
            .await
            .map_err(|_| RpcError::Timeout {
                endpoint: self.endpoint.authority(),
            })??;

        if !status.is_success() {
            return Err(RpcError::InvalidResponse(
                format!("unexpected status code {}", status).into(),
            ));
        }

        let reply: RpcReply =
            serde_json::from_slice(&bytes).map_err(|e| RpcError::InvalidResponse(e.into()))?;

        match reply {
            RpcReply::Ok(value) => Ok(value),
            RpcReply::Fault(fault) => Err(fault.into()),
        }
    }

    fn transport_error(&self, source: BoxedError) -> RpcError {
        RpcError::Transport {
            endpoint: self.endpoint.authority(),
            source,
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::communication::rpc::dispatcher::tests::{calculator, Add, Divide};
    use crate::communication::rpc::rpc_routes;
    use pretty_assertions::assert_eq;
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use warp::Filter;

    fn serve_calculator() -> SocketAddr {
        let (addr, server) =
            warp::serve(rpc_routes(Arc::new(calculator()))).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }

    fn client(contract: &str, port: u16) -> RpcClient {
        RpcClient::bind(ServiceEndpoint::new("calculator", contract, "127.0.0.1", port))
    }

    #[tokio::test]
    async fn call_typed_methods() {
        let addr = serve_calculator();
        let client = client("math.Calculator", addr.port());

        assert_eq!(client.call(&Add { a: 40, b: 2 }).await.unwrap(), 42);
        assert_eq!(client.call(&Divide { a: 84, b: 2 }).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn surface_application_faults() {
        let addr = serve_calculator();
        let client = client("math.Calculator", addr.port());

        let error = client.call(&Divide { a: 1, b: 0 }).await.unwrap_err();
        assert!(matches!(error, RpcError::Application(_)));
        assert!(!error.is_transport());
    }

    #[tokio::test]
    async fn reject_calls_to_other_contracts() {
        let addr = serve_calculator();
        let client = client("math.Scientific", addr.port());

        let error = client.call(&Add { a: 1, b: 1 }).await.unwrap_err();
        assert!(matches!(error, RpcError::MethodNotFound(_)));
    }

    #[tokio::test]
    async fn reject_unknown_methods() {
        let addr = serve_calculator();
        let client = client("math.Calculator", addr.port());

        let error = client
            .call_raw("Multiply", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(error, RpcError::MethodNotFound(_)));
    }

    #[tokio::test]
    async fn distinguish_unreachable_peers() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let error = client("math.Calculator", port)
            .call(&Add { a: 1, b: 1 })
            .await
            .unwrap_err();

        assert!(matches!(error, RpcError::Transport { .. }));
        assert!(error.is_transport());
    }

    #[tokio::test]
    async fn time_out_slow_peers() {
        let slow = warp::any().and_then(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, Infallible>("too late")
        });
        let (addr, server) = warp::serve(slow).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let error = client("math.Calculator", addr.port())
            .with_timeout(Duration::from_millis(100))
            .call(&Add { a: 1, b: 1 })
            .await
            .unwrap_err();

        assert!(matches!(error, RpcError::Timeout { .. }));
    }

    #[tokio::test]
    async fn reject_undecodable_replies() {
        let garbage = warp::any().map(|| "<html>not a reply</html>");
        let (addr, server) = warp::serve(garbage).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let error = client("math.Calculator", addr.port())
            .call(&Add { a: 1, b: 1 })
            .await
            .unwrap_err();

        assert!(matches!(error, RpcError::InvalidResponse(_)));
    }
}
