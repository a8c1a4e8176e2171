use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use swap_engine::SwapEngine;
use swap_logging::{swap_info, swap_warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::config::load_config;
use super::console::{run_console, ConsoleOutbox};
use super::effects::EffectRunner;
use super::hub::{Envelope, Outbox, SessionHub};
use super::logging;

pub async fn run(config_path: &Path) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    config.apply_env_overrides(|name| std::env::var(name).ok());
    logging::initialize(config.log_destination, config.level_filter(), &config.log_file);

    if config.api_key.is_empty() {
        swap_warn!("No face swap API key configured; submissions will be rejected");
    }
    if config.image_host_key.is_none() {
        swap_warn!("No image host key configured; uploads may be rejected");
    }

    let engine = SwapEngine::new(config.engine_config()).context("failed to build http clients")?;
    let outbox: Arc<dyn Outbox> = Arc::new(ConsoleOutbox::new(config.output_dir.clone()));
    let (events_tx, events_rx) = mpsc::unbounded_channel::<Envelope>();
    let shutdown = CancellationToken::new();

    let hub = SessionHub::new(EffectRunner::new(engine, outbox, events_tx.clone()));
    let hub_task = tokio::spawn(hub.run(events_rx, shutdown.clone()));

    swap_info!(
        "swapbot ready; type /start-swap (prefix @name to pick a chat, /photo <path> to send a photo)"
    );
    run_console(events_tx, shutdown.clone()).await;

    shutdown.cancel();
    hub_task.await.context("session hub task failed")?;
    swap_info!("swapbot stopped");
    Ok(())
}
