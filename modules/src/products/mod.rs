//! Owner of product resources
//!
//! Serves the `product.ProductService` contract and creates products on behalf of users
//! whenever the user service announces a new user. User methods are relayed to the user service.

mod consumer;
mod options;
mod relay;
mod service;

use async_trait::async_trait;
use chrono::Utc;
use domain::contract::UserServiceClient;
use domain::discovery::PeerService;
use domain::event::product_group;
use domain::resource::{demo_products, MemoryStore, Product, ResourceStore};
use harness::{Heart, Module, ModuleTerminationReason, RedisCommunicationFactory, ServiceRunner};
use jatsl::{schedule, JobScheduler};
use library::communication::event::{ConsumerGroupDescriptor, QueueLocation};
use library::communication::rpc::RpcServerJob;
use library::communication::CommunicationFactory;
use library::logging::{LogForwarderJob, LogRecordReceiver};
use library::{BoxedError, EmptyResult};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

pub use consumer::UserCreatedConsumer;
pub use options::Options;
pub use relay::UserRelay;
pub use service::ProductService;

/// Module implementation
pub struct Products {
    options: Options,
    log_records: Option<LogRecordReceiver>,
    factory: Option<RedisCommunicationFactory>,
    users: Option<UserServiceClient>,
}

impl Products {
    /// Creates a new instance from raw parts, captured log records are forwarded if provided
    pub fn new(options: Options, log_records: Option<LogRecordReceiver>) -> Self {
        Self {
            options,
            log_records,
            factory: None,
            users: None,
        }
    }
}

#[async_trait]
impl Module for Products {
    async fn pre_startup(&mut self) -> EmptyResult {
        let resolver = self.options.environment.resolver();
        let users = resolver.resolve_service(&PeerService::Users)?;
        info!(environment = %resolver.environment(), peer = %users, "Resolved peer service");
        self.users = Some(UserServiceClient::bind(users, self.options.rpc.rpc_timeout));

        let factory = RedisCommunicationFactory::new(&self.options.redis.url)?;

        debug!("Connecting notification publisher");
        factory.notification_publisher().connect().await?;
        self.factory = Some(factory);

        Ok(())
    }

    #[instrument(skip(self, scheduler))]
    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let factory = self
            .factory
            .clone()
            .ok_or_else(|| anyhow::anyhow!("module has not been started"))?;
        let users = self
            .users
            .clone()
            .ok_or_else(|| anyhow::anyhow!("module has not been started"))?;

        let store: Arc<dyn ResourceStore<Product>> =
            Arc::new(MemoryStore::with_resources(demo_products(Utc::now())));

        let service = Arc::new(ProductService::new(store.clone()));
        let port = self
            .options
            .rpc
            .port
            .unwrap_or_else(|| PeerService::Products.port());
        let relay = Arc::new(UserRelay::new(users));
        let dispatcher = relay.register(service.routes()).build()?;
        let server_job = RpcServerJob::new(port, Arc::new(dispatcher));

        let group = ConsumerGroupDescriptor::new(
            product_group(),
            QueueLocation::from_beginning(self.options.queueing.from_beginning()),
        );
        let consumer_job = ServiceRunner::<_, UserCreatedConsumer>::new(
            factory.clone(),
            group,
            self.options.queueing.id.clone(),
            store,
        );

        debug!("Scheduling jobs");
        match self.log_records.take() {
            Some(records) => {
                let forwarder_job = LogForwarderJob::new(records, factory.notification_publisher());
                schedule!(scheduler, { server_job, consumer_job, forwarder_job });
            }
            None => {
                schedule!(scheduler, { server_job, consumer_job });
            }
        }

        Ok(Some(Heart::without_heart_stone()))
    }

    async fn post_shutdown(&mut self, termination_reason: ModuleTerminationReason) {
        if let Some(factory) = self.factory.take() {
            factory.notification_publisher().disconnect().await;
        }

        if termination_reason.is_clean() {
            info!("Module exited normally")
        } else {
            error!(error = %termination_reason, "Module terminated with an error")
        }
    }
}
