//! Aggregator which persists the log records of all services
//!
//! Consumes the `microservices-logs` queue, echoes every record to the console and writes it
//! to a rotating file archive and a searchable index. The aggregator does not forward its own
//! log output to the queue it consumes.

mod aggregator;
mod destination;
mod options;

use async_trait::async_trait;
use domain::event::logger_group;
use harness::{Heart, Module, RedisCommunicationFactory, ServiceRunner};
use jatsl::{schedule, JobScheduler};
use library::communication::event::{ConsumerGroupDescriptor, QueueLocation};
use library::BoxedError;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub use aggregator::{LogAggregator, ECHO_TARGET};
pub use destination::*;
pub use options::Options;

/// Module implementation
pub struct Logger {
    options: Options,
}

impl Logger {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Module for Logger {
    #[instrument(skip(self, scheduler))]
    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        debug!("Acquiring mongo connection");
        let database = self.options.index.database().await?;
        let collection = self.options.index.collection(&database).await?;
        let index = MongoIndex::new(self.options.index.index.clone(), collection);

        let archive = self.options.archive.archive();
        info!(
            directory = ?archive.directory(),
            index = %self.options.index.index,
            "Persisting log records"
        );

        let destinations: Vec<Arc<dyn LogDestination>> =
            vec![Arc::new(archive), Arc::new(IndexDestination(index))];

        let factory = RedisCommunicationFactory::new(&self.options.redis.url)?;
        let group = ConsumerGroupDescriptor::new(
            logger_group(),
            QueueLocation::from_beginning(self.options.queueing.from_beginning()),
        );

        let aggregator_job = ServiceRunner::<_, LogAggregator>::new(
            factory,
            group,
            self.options.queueing.id.clone(),
            destinations,
        );

        debug!("Scheduling jobs");
        schedule!(scheduler, { aggregator_job });

        Ok(Some(Heart::without_heart_stone()))
    }
}
