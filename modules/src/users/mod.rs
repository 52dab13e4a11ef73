//! Owner of user resources
//!
//! Serves the `user.UserService` contract and announces every created user on the
//! `user-created` queue so that dependent resources can be created by other services.
//! Product methods are relayed to the product service.

mod options;
mod relay;
mod service;

use async_trait::async_trait;
use chrono::Utc;
use domain::contract::ProductServiceClient;
use domain::discovery::PeerService;
use domain::resource::{demo_users, MemoryStore};
use harness::{Heart, Module, ModuleTerminationReason, RedisCommunicationFactory};
use jatsl::{schedule, JobScheduler};
use library::communication::rpc::RpcServerJob;
use library::communication::CommunicationFactory;
use library::logging::{LogForwarderJob, LogRecordReceiver};
use library::{BoxedError, EmptyResult};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

pub use options::Options;
pub use relay::ProductRelay;
pub use service::UserService;

/// Module implementation
pub struct Users {
    options: Options,
    log_records: Option<LogRecordReceiver>,
    factory: Option<RedisCommunicationFactory>,
    products: Option<ProductServiceClient>,
}

impl Users {
    /// Creates a new instance from raw parts, captured log records are forwarded if provided
    pub fn new(options: Options, log_records: Option<LogRecordReceiver>) -> Self {
        Self {
            options,
            log_records,
            factory: None,
            products: None,
        }
    }
}

#[async_trait]
impl Module for Users {
    async fn pre_startup(&mut self) -> EmptyResult {
        let resolver = self.options.environment.resolver();
        let products = resolver.resolve_service(&PeerService::Products)?;
        info!(environment = %resolver.environment(), peer = %products, "Resolved peer service");
        self.products = Some(ProductServiceClient::bind(products, self.options.rpc.rpc_timeout));

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
        let products = self
            .products
            .clone()
            .ok_or_else(|| anyhow::anyhow!("module has not been started"))?;

        let store = Arc::new(MemoryStore::with_resources(demo_users(Utc::now())));
        let service = Arc::new(UserService::new(store, factory.notification_publisher()));
        let port = self
            .options
            .rpc
            .port
            .unwrap_or_else(|| PeerService::Users.port());

        let relay = Arc::new(ProductRelay::new(products));
        let dispatcher = relay.register(service.routes()).build()?;
        let server_job = RpcServerJob::new(port, Arc::new(dispatcher));

        debug!("Scheduling jobs");
        match self.log_records.take() {
            Some(records) => {
                let forwarder_job = LogForwarderJob::new(records, factory.notification_publisher());
                schedule!(scheduler, { server_job, forwarder_job });
            }
            None => {
                schedule!(scheduler, { server_job });
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
