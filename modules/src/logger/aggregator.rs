use super::LogDestination;
use async_trait::async_trait;
use chrono::Utc;
use harness::Service;
use library::communication::event::{Consumer, NotificationFrame};
use library::communication::CommunicationFactory;
use library::logging::{LogLevel, LogRecord, DEFAULT_SERVICE_NAME};
use library::EmptyResult;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Target of the console echo of aggregated records, independent of this module's own output
pub const ECHO_TARGET: &str = "aggregated";

fn echo(level: LogLevel, line: &str) {
    match level {
        LogLevel::Error => error!(target: ECHO_TARGET, "{}", line),
        LogLevel::Warn => warn!(target: ECHO_TARGET, "{}", line),
        LogLevel::Info => info!(target: ECHO_TARGET, "{}", line),
        LogLevel::Debug => debug!(target: ECHO_TARGET, "{}", line),
        LogLevel::Verbose => trace!(target: ECHO_TARGET, "{}", line),
    }
}

/// Persists every record published to the log queue
///
/// Each record is echoed to the console and written to all destinations. Destinations are
/// independent, a failing one is reported and does not affect the others.
pub struct LogAggregator {
    destinations: Vec<Arc<dyn LogDestination>>,
}

impl LogAggregator {
    /// Creates a new instance writing to the given destinations
    pub fn new(destinations: Vec<Arc<dyn LogDestination>>) -> Self {
        Self { destinations }
    }

    /// Writes a record to every destination, returns the number of successful writes
    pub async fn persist(&self, record: &LogRecord) -> usize {
        let mut written = 0;

        for destination in &self.destinations {
            match destination.write(record).await {
                Ok(_) => written += 1,
                Err(e) => {
                    warn!(
                        destination = destination.name(),
                        error = %e,
                        "Unable to persist log record"
                    )
                }
            }
        }

        written
    }
}

impl<F> Service<F> for LogAggregator
where
    F: CommunicationFactory + Send + Sync,
{
    const NAME: &'static str = "LogAggregator";

    type Instance = LogAggregator;
    type Config = Vec<Arc<dyn LogDestination>>;

    fn instantiate(_factory: F, destinations: &Self::Config) -> Self::Instance {
        Self::new(destinations.clone())
    }
}

#[async_trait]
impl Consumer for LogAggregator {
    type Notification = LogRecord;

    async fn consume(&self, notification: NotificationFrame<Self::Notification>) -> EmptyResult {
        let record = notification
            .into_inner()
            .enrich(DEFAULT_SERVICE_NAME, Utc::now());

        let timestamp = record.timestamp.as_deref().unwrap_or_default();
        echo(
            record.level,
            &format!(
                "[{}] {} (received at {})",
                record.service_name(),
                record.message,
                timestamp
            ),
        );

        self.persist(&record).await;

        Ok(())
    }
}
