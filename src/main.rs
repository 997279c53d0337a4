//! Binary entrypoint for the storebot chat server.

use std::sync::Arc;

use storebot::core::BotConfig;
use storebot::maintenance::ExpirySweeper;
use storebot::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storebot::init_tracing();

    let config = BotConfig::from_env();
    config.validate()?;

    let state = AppState::new(&config)?;

    let sweeper = ExpirySweeper::new(Arc::clone(&state.store), config.sweeper.clone());
    let shutdown = sweeper.shutdown_notifier();
    let sweeper_handle = sweeper.spawn();

    server::run_server_with_shutdown(state, config.server.port, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    })
    .await?;

    shutdown.notify_one();
    sweeper_handle.await?;
    Ok(())
}
