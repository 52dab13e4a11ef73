use crate::options::{EnvironmentOptions, LogForwardingOptions, RedisOptions, RpcOptions};
use structopt::StructOpt;

/// Options for the users module
#[derive(Debug, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub redis: RedisOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub environment: EnvironmentOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub rpc: RpcOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub log_forwarding: LogForwardingOptions,
}
