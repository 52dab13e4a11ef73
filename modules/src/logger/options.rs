use crate::options::{ArchiveOptions, IndexOptions, QueueingOptions, RedisOptions};
use structopt::StructOpt;

/// Options for the logger module
#[derive(Debug, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub queueing: QueueingOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub redis: RedisOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub archive: ArchiveOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub index: IndexOptions,
}
