use super::{DeathReason, Heart};
use async_trait::async_trait;
use futures::lock::Mutex;
use jatsl::{JobScheduler, State, StatusServer};
use library::{BoxedError, EmptyResult};
use std::any::type_name;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};

/// Reason why a module has terminated
#[derive(Error, Debug)]
pub enum ModuleTerminationReason {
    /// Startup routine threw an error
    #[error("startup routine threw an error")]
    StartupFailed(#[source] BoxedError),
    /// Core run loop threw an error
    #[error("error during operation")]
    OperationalError(#[source] BoxedError),
    /// [`Heart`] provided by module died
    #[error("heart provided by module died: {0}")]
    HeartDied(DeathReason),
    /// Run loop exited cleanly
    #[error("run loop exited cleanly")]
    ExitedNormally,
    /// Timeout during startup or shutdown
    #[error("timeout during startup or shutdown")]
    Timeout,
}

impl ModuleTerminationReason {
    /// Whether the module terminated without an error
    pub fn is_clean(&self) -> bool {
        matches!(
            self,
            ModuleTerminationReason::HeartDied(_) | ModuleTerminationReason::ExitedNormally
        )
    }
}

/// Executable module
#[async_trait]
pub trait Module {
    /// Executed before running the core loop, usually acquires connections
    async fn pre_startup(&mut self) -> EmptyResult {
        Ok(())
    }

    /// Core run loop of the module
    ///
    /// When the function returns `Some(_)` the death of the returned [`Heart`] is awaited before calling the shutdown hook.
    /// Useful for situations where you dispatch background jobs in the run loop but want to hand-off the program lifecycle management.
    ///
    /// Returning `None` results in the program entering a shutdown state and calling the `pre_shutdown` hook.
    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError>;

    /// Opportunity for modules to do something before all jobs will be terminated
    async fn pre_shutdown(&mut self, _scheduler: &JobScheduler) {}

    /// Shutdown hook executed after the core loop and all associated jobs have terminated
    #[instrument(skip(self))]
    async fn post_shutdown(&mut self, termination_reason: ModuleTerminationReason) {
        if termination_reason.is_clean() {
            info!("Module exited normally")
        } else {
            error!(error = %termination_reason, "Module terminated with an error")
        }
    }
}

/// Runner for [`Module`] implementations
pub struct ModuleRunner {
    startup_timeout: Duration,
    shutdown_timeout: Duration,
    status_server_port: Option<u16>,
}

impl ModuleRunner {
    /// Creates a new instance using default timeouts and enabling the status server
    pub fn new_with_status_server(status_server_port: u16) -> Self {
        Self {
            status_server_port: Some(status_server_port),
            ..Default::default()
        }
    }

    /// Replaces the time the startup and shutdown hooks may take
    pub fn with_timeouts(mut self, startup: Duration, shutdown: Duration) -> Self {
        self.startup_timeout = startup;
        self.shutdown_timeout = shutdown;
        self
    }
}

impl Default for ModuleRunner {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(60),
            shutdown_timeout: Duration::from_secs(60),
            status_server_port: None,
        }
    }
}

impl ModuleRunner {
    /// Executes a [`Module`] until it exits by calling the corresponding lifecycle functions in order.
    /// Returns whether the module terminated cleanly.
    #[instrument(skip(self, module), fields(module_name = type_name::<M>()))]
    pub async fn run<M: Module + Send + Sync>(&self, mut module: M) -> bool {
        let scheduler = JobScheduler::default();
        let mut termination_reason = ModuleTerminationReason::ExitedNormally;

        let status_state = if let Some(port) = self.status_server_port {
            info!(port, "Spawning status server");
            let (status_state, status_server) = StatusServer::new(&scheduler, port);
            scheduler.spawn_job(status_server).await;
            Some(status_state)
        } else {
            None
        };

        info!("Commencing module startup sequence");
        let startup = timeout(self.startup_timeout, module.pre_startup()).await;

        match startup {
            Ok(Ok(_)) => {
                self.run_loop(
                    &mut module,
                    &scheduler,
                    &mut termination_reason,
                    &status_state,
                )
                .await
            }
            Ok(Err(error)) => {
                error!(?error, "Module startup sequence encountered an error");
                termination_reason = ModuleTerminationReason::StartupFailed(error);
            }
            Err(_) => {
                error!("Module startup sequence timed out");
                termination_reason = ModuleTerminationReason::Timeout
            }
        }

        info!("Running pre-shutdown hook");
        if let Some(state) = status_state {
            *state.lock().await = State::Shutdown;
        }
        module.pre_shutdown(&scheduler).await;

        info!("Terminating remaining jobs");
        scheduler.terminate_jobs(Duration::from_secs(5)).await;

        let clean = termination_reason.is_clean();

        info!("Commencing module shutdown sequence");
        let result = timeout(
            self.shutdown_timeout,
            module.post_shutdown(termination_reason),
        )
        .await;

        if result.is_err() {
            error!("Module shutdown sequence timed out");
            return false;
        }

        clean
    }

    #[instrument(skip(self, module, scheduler, termination_reason, status_state))]
    async fn run_loop<M: Module + Send + Sync>(
        &self,
        module: &mut M,
        scheduler: &JobScheduler,
        termination_reason: &mut ModuleTerminationReason,
        status_state: &Option<Arc<Mutex<State>>>,
    ) {
        info!("Executing module run procedure");
        match module.run(scheduler).await {
            Ok(None) => {
                debug!("Module run procedure completed successfully");
                if let Some(state) = status_state {
                    *state.lock().await = State::Running;
                }
            }
            Ok(Some(mut heart)) => {
                debug!("Module run procedure completed successfully, entering run loop");
                if let Some(state) = status_state {
                    *state.lock().await = State::Running;
                }
                let death_reason = heart.death().await;
                info!(%death_reason, "Heart provided by run procedure died");
                *termination_reason = ModuleTerminationReason::HeartDied(death_reason);
            }
            Err(error) => {
                error!(?error, "Module run procedure encountered an error");
                *termination_reason = ModuleTerminationReason::OperationalError(error);
            }
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::HeartStone;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct Recorder {
        fail_startup: bool,
        fail_run: bool,
        stall_startup: bool,
        stone: Option<HeartStone>,
        events: Arc<StdMutex<Vec<String>>>,
    }

    impl Recorder {
        fn record(&self, event: impl Into<String>) {
            self.events.lock().unwrap().push(event.into());
        }
    }

    #[async_trait]
    impl Module for Recorder {
        async fn pre_startup(&mut self) -> EmptyResult {
            self.record("pre_startup");

            if self.stall_startup {
                futures::future::pending::<()>().await;
            }

            if self.fail_startup {
                return Err("broker unreachable".into());
            }

            Ok(())
        }

        async fn run(&mut self, _scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
            self.record("run");

            if self.fail_run {
                return Err("port in use".into());
            }

            let (heart, stone) = Heart::new();
            stone.kill("done").await;
            self.stone = Some(stone);

            Ok(Some(heart))
        }

        async fn post_shutdown(&mut self, termination_reason: ModuleTerminationReason) {
            let label = match termination_reason {
                ModuleTerminationReason::StartupFailed(_) => "startup failed",
                ModuleTerminationReason::OperationalError(_) => "operational error",
                ModuleTerminationReason::HeartDied(_) => "heart died",
                ModuleTerminationReason::ExitedNormally => "exited",
                ModuleTerminationReason::Timeout => "timeout",
            };

            self.record(format!("post_shutdown: {}", label));
        }
    }

    async fn run(module: Recorder) -> (bool, Vec<String>) {
        let events = module.events.clone();
        let clean = ModuleRunner::default()
            .with_timeouts(Duration::from_millis(200), Duration::from_secs(1))
            .run(module)
            .await;

        let events = events.lock().unwrap().clone();
        (clean, events)
    }

    #[tokio::test]
    async fn run_lifecycle_in_order() {
        let (clean, events) = run(Recorder::default()).await;

        assert!(clean);
        assert_eq!(events, vec!["pre_startup", "run", "post_shutdown: heart died"]);
    }

    #[tokio::test]
    async fn skip_run_on_startup_failure() {
        let (clean, events) = run(Recorder {
            fail_startup: true,
            ..Default::default()
        })
        .await;

        assert!(!clean);
        assert_eq!(events, vec!["pre_startup", "post_shutdown: startup failed"]);
    }

    #[tokio::test]
    async fn report_operational_errors() {
        let (clean, events) = run(Recorder {
            fail_run: true,
            ..Default::default()
        })
        .await;

        assert!(!clean);
        assert_eq!(
            events,
            vec!["pre_startup", "run", "post_shutdown: operational error"]
        );
    }

    #[tokio::test]
    async fn time_out_stalled_startups() {
        let (clean, events) = run(Recorder {
            stall_startup: true,
            ..Default::default()
        })
        .await;

        assert!(!clean);
        assert_eq!(events, vec!["pre_startup", "post_shutdown: timeout"]);
    }
}
