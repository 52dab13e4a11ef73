//! Operator command performing a single remote call against a peer service

use crate::options::EnvironmentOptions;
use anyhow::{Context, Result};
use domain::discovery::PeerService;
use library::communication::rpc::RpcClient;
use library::helpers::parse_seconds;
use serde_json::Value;
use std::time::Duration;
use structopt::StructOpt;
use tracing::{debug, instrument};

/// Options for the call command
#[derive(Debug, StructOpt)]
pub struct Options {
    /// Service to call, either `user-service` or `product-service`
    pub service: PeerService,

    /// Name of the method, e.g. `GetById`
    pub method: String,

    /// JSON encoded request
    #[structopt(default_value = "{}")]
    pub request: String,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub environment: EnvironmentOptions,

    /// Time in seconds after which the call is abandoned
    #[structopt(long, env, default_value = "10", parse(try_from_str = parse_seconds))]
    pub rpc_timeout: Duration,
}

/// Resolves the peer and performs the call, returning the raw response
#[instrument(skip(options), fields(service = ?options.service, method = %options.method))]
pub async fn execute(options: Options) -> Result<Value> {
    let endpoint = options
        .environment
        .resolver()
        .resolve_service(&options.service)?;
    debug!(%endpoint, "Resolved peer service");

    let client = RpcClient::bind(endpoint).with_timeout(options.rpc_timeout);
    call(&client, &options.method, &options.request).await
}

/// Performs a call with a JSON encoded request
pub async fn call(client: &RpcClient, method: &str, request: &str) -> Result<Value> {
    let request: Value =
        serde_json::from_str(request).context("request is not a valid JSON document")?;

    let response = client
        .call_raw(method, request)
        .await
        .with_context(|| format!("call to {} failed", client.endpoint()))?;

    Ok(response)
}
