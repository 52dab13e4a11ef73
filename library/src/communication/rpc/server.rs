use super::{RpcDispatcher, RpcFault, RpcReply};
use crate::EmptyResult;
use async_trait::async_trait;
use jatsl::{Job, JobManager};
use serde_json::Value;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

/// Warp filter which serves the contract of a dispatcher at `POST /rpc/{contract}/{method}`
pub fn rpc_routes(
    dispatcher: Arc<RpcDispatcher>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::post()
        .and(warp::path!("rpc" / String / String))
        .and(warp::body::bytes())
        .and(warp::any().map(move || dispatcher.clone()))
        .and_then(handle_call)
}

async fn handle_call(
    contract: String,
    method: String,
    body: Bytes,
    dispatcher: Arc<RpcDispatcher>,
) -> Result<impl Reply, Infallible> {
    let reply: RpcReply = if contract != dispatcher.contract() {
        RpcReply::Fault(RpcFault::method_not_found(&contract, &method))
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(request) => dispatcher.dispatch(&method, request).await.into(),
            Err(e) => RpcReply::Fault(RpcFault::invalid_request(e)),
        }
    };

    Ok(warp::reply::json(&reply))
}

/// Job which serves a contract over HTTP until it is terminated
pub struct RpcServerJob {
    port: u16,
    dispatcher: Arc<RpcDispatcher>,
}

impl RpcServerJob {
    /// Creates a new instance listening on all interfaces at the given port
    pub fn new(port: u16, dispatcher: Arc<RpcDispatcher>) -> Self {
        Self { port, dispatcher }
    }
}

#[async_trait]
impl Job for RpcServerJob {
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    fn name(&self) -> String {
        format!("RpcServer({})", self.dispatcher.contract())
    }

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let routes = rpc_routes(self.dispatcher.clone()).with(warp::trace::named("rpc"));

        let source_addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let (addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(source_addr, manager.termination_signal())?;

        info!(?addr, contract = self.dispatcher.contract(), "Serving remote calls");
        manager.ready().await;
        server.await;

        Ok(())
    }
}
