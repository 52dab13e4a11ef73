use crate::BoxedError;
use redis::aio::{Connection, MultiplexedConnection};
use redis::{Client, RedisResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

const RETRY_INTERVAL: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// Creates connections to a redis server, retrying until the server becomes available
#[derive(Clone)]
pub struct RedisFactory {
    client: Client,
    max_attempts: Option<usize>,
}

impl RedisFactory {
    /// Creates a new factory for the given url, the url is validated but no connection is made
    pub fn new(url: &str) -> RedisResult<Self> {
        Ok(Self {
            client: Client::open(url)?,
            max_attempts: None,
        })
    }

    /// Gives up connecting after the given number of attempts instead of retrying indefinitely
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    /// Connection that can be shared between multiple users and does not permit blocking commands
    pub async fn multiplexed(&self) -> Result<MultiplexedConnection, BoxedError> {
        let client = self.client.clone();
        self.retry(move || {
            let client = client.clone();
            async move { client.get_multiplexed_tokio_connection().await }
        })
        .await
    }

    /// Individual connection which may be used for blocking commands
    pub async fn owned(&self) -> Result<Connection, BoxedError> {
        let client = self.client.clone();
        self.retry(move || {
            let client = client.clone();
            async move { client.get_async_connection().await }
        })
        .await
    }

    async fn retry<C, F, Fut>(&self, connect: F) -> Result<C, BoxedError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = RedisResult<C>>,
    {
        let mut warn = true;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error: BoxedError = match timeout(REQUEST_TIMEOUT, connect()).await {
                Ok(Ok(connection)) => {
                    debug!(attempt, "Connected to redis");
                    return Ok(connection);
                }
                Ok(Err(e)) => e.into(),
                Err(e) => e.into(),
            };

            if warn {
                warn = false;
                warn!(%error, "Unable to connect to redis server, retrying");
            }

            if let Some(max_attempts) = self.max_attempts {
                if attempt >= max_attempts {
                    return Err(error);
                }
            }

            sleep(RETRY_INTERVAL).await;
        }
    }
}
