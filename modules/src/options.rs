//! Various options usable by modules
//!
//! The structs in this module allow other modules to flatten them into
//! their own options struct. This allows for a unified yet non-cluttered
//! option set.

use library::communication::discovery::{Environment, StaticServiceResolver};
use library::helpers::{parse_byte_size, parse_days, parse_seconds};
use library::storage::{RotatingFileArchive, DEFAULT_RETENTION_DAYS};
use mongodb::bson::{doc, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{CreateCollectionOptions, CreateIndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;
use tracing::{trace, warn};

/// Options for connecting to the Redis server
#[derive(Debug, StructOpt)]
pub struct RedisOptions {
    /// Redis database server URL
    #[structopt(
        short = "r",
        long = "redis",
        env = "REDIS",
        global = true,
        default_value = "redis://localhost:6379/",
        value_name = "url"
    )]
    pub url: String,
}

/// Options relevant for message queueing
#[derive(Debug, StructOpt)]
pub struct QueueingOptions {
    /// Unique and stable identifier for this instance.
    /// It is used to identify and resume work after a crash
    /// or deliberate restart, thus it may not change across
    /// executions!
    #[structopt(long, env, default_value = "0")]
    pub id: String,

    /// Consume only notifications published after the consumer group has been created.
    /// Has no effect on groups which already exist.
    #[structopt(long)]
    pub skip_backlog: bool,
}

impl QueueingOptions {
    /// Whether a new consumer group starts at the beginning of the queue
    pub fn from_beginning(&self) -> bool {
        !self.skip_backlog
    }
}

/// Options selecting the deployment flavour
#[derive(Debug, StructOpt)]
pub struct EnvironmentOptions {
    /// Environment the services run in, `production` selects the clustered peer addresses
    #[structopt(long, env = "ENVIRONMENT", global = true, default_value = "development")]
    pub environment: Environment,
}

impl EnvironmentOptions {
    /// Resolver for every known peer service
    pub fn resolver(&self) -> StaticServiceResolver {
        domain::discovery::resolver(self.environment)
    }
}

/// Options for serving and calling remote methods
#[derive(Debug, StructOpt)]
pub struct RpcOptions {
    /// Port on which the remote call contract is served, defaults to the port from the peer table
    #[structopt(long, env = "PORT")]
    pub port: Option<u16>,

    /// Time in seconds after which an outgoing call is abandoned
    #[structopt(long, env, default_value = "10", parse(try_from_str = parse_seconds))]
    pub rpc_timeout: Duration,
}

/// Options for the re-broadcast of local log output
#[derive(Debug, StructOpt)]
pub struct LogForwardingOptions {
    /// Do not publish log records to the log queue
    #[structopt(long)]
    pub no_log_forwarding: bool,
}

/// Options for the rotating log archive
#[derive(Debug, StructOpt)]
pub struct ArchiveOptions {
    /// Directory in which daily log files are stored
    #[structopt(long, env, default_value = "logs")]
    pub log_directory: PathBuf,

    /// Size at which a log file is rolled over, accepts suffixes like `k`, `m` or `g`
    #[structopt(long, env, default_value = "10m", parse(try_from_str = parse_byte_size))]
    pub max_log_size: u64,

    /// Number of days log files are kept
    #[structopt(long, env, default_value = "14", parse(try_from_str = parse_days))]
    pub log_retention: Duration,
}

impl ArchiveOptions {
    /// Creates the archive described by the options
    pub fn archive(&self) -> RotatingFileArchive {
        let retention = chrono::Duration::from_std(self.log_retention)
            .unwrap_or_else(|_| chrono::Duration::days(DEFAULT_RETENTION_DAYS));

        RotatingFileArchive::new(self.log_directory.clone(), self.max_log_size, retention)
    }
}

/// Options regarding the search index backend
#[derive(Debug, StructOpt)]
pub struct IndexOptions {
    /// MongoDB connection URL
    #[structopt(long, env, default_value = "mongodb://localhost:27017")]
    mongodb: String,

    /// Name of the database to use
    #[structopt(long, env, default_value = "interlink")]
    database: String,

    /// Name of the index (collection) log records are written to
    #[structopt(long, env, default_value = "microservices-logs")]
    pub index: String,
}

impl IndexOptions {
    /// Instantiates a new database client instance
    pub async fn client(&self) -> mongodb::error::Result<Client> {
        Client::with_uri_str(&self.mongodb).await
    }

    /// Instantiates a new database connection based on a new client
    pub async fn database(&self) -> mongodb::error::Result<Database> {
        Ok(self.client().await?.database(&self.database))
    }

    /// Creates a new handle to the index collection, ensuring that it carries a text index
    pub async fn collection(
        &self,
        database: &Database,
    ) -> mongodb::error::Result<Collection<Document>> {
        let upsert_collection = async {
            trace!("Attempting to create index collection");
            if let Err(e) = database
                .create_collection(&self.index, CreateCollectionOptions::default())
                .await
            {
                if let ErrorKind::Command(ce) = (*e.kind).clone() {
                    if ce.code == 48 {
                        trace!("Index collection already exists");
                        return Ok(());
                    }
                }

                warn!(error = ?e, "Failed to create index collection");
                return Err(e);
            }

            Ok(())
        };
        upsert_collection.await?;

        let collection = database.collection(&self.index);

        let index_model = IndexModel::builder()
            .keys(doc! { "message": "text" })
            .build();

        trace!("Ensuring that text index exists");
        collection
            .create_index(index_model, CreateIndexOptions::default())
            .await?;

        Ok(collection)
    }
}
