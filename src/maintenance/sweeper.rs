//! Background expiry sweeper for the session store.
//!
//! Periodically evicts idle sessions. Advisory housekeeping only: a
//! skipped or delayed sweep never affects request correctness, because
//! the store also expires sessions on access.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::config::SweeperConfig;
use crate::session::SessionStore;

/// Periodic session eviction worker.
pub struct ExpirySweeper {
    store: Arc<SessionStore>,
    config: SweeperConfig,
    shutdown: Arc<Notify>,
}

impl ExpirySweeper {
    /// Create a sweeper over the given store.
    #[must_use]
    pub fn new(store: Arc<SessionStore>, config: SweeperConfig) -> Self {
        Self {
            store,
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a shutdown notifier to stop the sweeper.
    #[must_use]
    pub fn shutdown_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the sweep loop as a tokio task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the sweep loop until shutdown is signaled.
    async fn run(&self) {
        if !self.config.enabled {
            info!("expiry sweeper is disabled");
            return;
        }

        let interval = Duration::from_secs(self.config.interval_seconds);
        info!(?interval, "starting expiry sweeper");

        loop {
            tokio::select! {
                () = tokio::time::sleep(interval) => {
                    let removed = self.store.cleanup_expired();
                    if removed > 0 {
                        info!(removed, "evicted idle sessions");
                    } else {
                        debug!("sweep found no idle sessions");
                    }
                }
                () = self.shutdown.notified() => {
                    info!("expiry sweeper shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::config::SessionConfig;

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let store = Arc::new(SessionStore::new(SessionConfig::default()));
        let sweeper = ExpirySweeper::new(
            Arc::clone(&store),
            SweeperConfig {
                interval_seconds: 3600,
                enabled: true,
            },
        );
        let shutdown = sweeper.shutdown_notifier();

        let handle = sweeper.spawn();
        shutdown.notify_one();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn disabled_sweeper_exits_immediately() {
        let store = Arc::new(SessionStore::new(SessionConfig::default()));
        let sweeper = ExpirySweeper::new(
            Arc::clone(&store),
            SweeperConfig {
                interval_seconds: 1,
                enabled: false,
            },
        );

        sweeper.spawn().await.unwrap();
    }
}
