use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;

use inventory::Inventory;
use reconciler;
use shared::data::Config;
use std::time::Duration;
use tickets::TicketScheduler;

/// Application state shared across the server: the inventory engine and
/// ticket scheduler, each constructed once at startup and injected into
/// every handler via axum's `Router<AppState>` (§9's "Global state").
#[derive(Clone)]
pub struct AppState {
    pub inventory: Arc<Inventory>,
    pub tickets: Arc<TicketScheduler>,
    pub config: Arc<Config>,
    /// Cancels the background reconciler loop on graceful shutdown.
    pub reconciler_cancel: watch::Sender<bool>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let inventory = Arc::new(
            Inventory::load(&config.catalog_path, &config.credentials_path)
                .await
                .context("failed to load device catalog")?,
        );
        inventory.initialize_status().await;
        tracing::info!("inventory loaded and initial device status probed");

        let tickets = TicketScheduler::load(Arc::clone(&inventory), config.ticket_path.clone())
            .await
            .context("failed to load ticket scheduler")?;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let reconciler_inventory = Arc::clone(&inventory);
        let interval = Duration::from_secs(config.reconciler_interval_secs);
        tokio::spawn(reconciler::run(reconciler_inventory, interval, cancel_rx));
        tracing::info!(interval_secs = config.reconciler_interval_secs, "reconciler started");

        Ok(Self {
            inventory,
            tickets,
            config: Arc::new(config),
            reconciler_cancel: cancel_tx,
        })
    }
}
