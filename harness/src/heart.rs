//! Structures to keep the process alive until some event occurs

use futures::future;
use std::fmt;
use std::io;
use tokio::signal::ctrl_c;
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tracing::{debug, error};

/// Reason why the heart stopped beating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeathReason {
    /// Internal kill signal has been sent
    Killed(String),
    /// SIGINT, SIGTERM or other process-external cause
    Terminated,
}

impl fmt::Display for DeathReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeathReason::Killed(reason) => write!(f, "Killed ({})", reason),
            DeathReason::Terminated => write!(f, "Terminated due to external signal"),
        }
    }
}

/// Lifecycle management struct that can be used to keep the application alive
pub struct Heart {
    rx: Receiver<String>,
    stone_alive: bool,
}

impl Heart {
    /// Creates a new heart and linked stone
    pub fn new() -> (Self, HeartStone) {
        let (tx, rx) = channel(2);

        let heart = Self {
            rx,
            stone_alive: true,
        };

        (heart, HeartStone { remote: tx })
    }

    /// Creates a new heart and discards the linked stone, only external signals can stop it
    pub fn without_heart_stone() -> Self {
        Heart::new().0
    }

    /// Future that waits until the heart dies for the returned reason
    pub async fn death(&mut self) -> DeathReason {
        let signal = termination_signal();
        tokio::pin!(signal);

        debug!("Heart starts beating");

        loop {
            tokio::select! {
                reason = self.rx.recv(), if self.stone_alive => match reason {
                    Some(reason) => return DeathReason::Killed(reason),
                    None => self.stone_alive = false,
                },
                _ = &mut signal => return DeathReason::Terminated,
            }
        }
    }
}

async fn termination_signal() {
    if let Err(error) = listen_for_termination().await {
        error!(%error, "Unable to listen for termination signals");
        future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn listen_for_termination() -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigterm.recv() => Ok(()),
        result = ctrl_c() => result,
    }
}

#[cfg(not(unix))]
async fn listen_for_termination() -> io::Result<()> {
    ctrl_c().await
}

/// Remote controller for the heart
#[derive(Clone)]
pub struct HeartStone {
    remote: Sender<String>,
}

impl HeartStone {
    /// Kill the associated heart
    pub async fn kill(&self, reason: impl Into<String>) {
        if let Err(e) = self.remote.send(reason.into()).await {
            error!("Failed to interact with Heart: {}", e);
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use futures::poll;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::task::{spawn, yield_now};
    use tokio::time::sleep;

    #[tokio::test]
    async fn live_until_killed() {
        let (mut heart, _stone) = Heart::new();

        let mut handle = spawn(async move { heart.death().await });
        sleep(Duration::from_millis(100)).await;
        yield_now().await;

        assert!(!poll!(&mut handle).is_ready());
    }

    #[tokio::test]
    async fn die_when_killed() {
        let (mut heart, stone) = Heart::new();

        let handle = spawn(async move { heart.death().await });
        stone.kill("Testing").await;

        assert_eq!(handle.await.unwrap(), DeathReason::Killed("Testing".into()));
    }

    #[tokio::test]
    async fn survive_dropped_stones() {
        let mut heart = Heart::without_heart_stone();

        let mut handle = spawn(async move { heart.death().await });
        sleep(Duration::from_millis(50)).await;
        yield_now().await;

        assert!(!poll!(&mut handle).is_ready());
    }
}
