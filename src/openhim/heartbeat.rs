//! Periodic heartbeat to the OpenHIM core.
//!
//! # Responsibilities
//! - Report liveness at a fixed interval
//! - Swap in config the core returns with a heartbeat

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, Instant};

use crate::config::ConfigHandle;
use crate::observability::metrics;
use crate::openhim::client::ApiClient;

pub struct Heartbeat {
    client: Arc<ApiClient>,
    handle: ConfigHandle,
    interval: Duration,
}

impl Heartbeat {
    pub fn new(client: Arc<ApiClient>, handle: ConfigHandle, interval: Duration) -> Self {
        Self {
            client,
            handle,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Heartbeat starting");

        // Initial config was fetched during startup; first beat after one interval
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.beat().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Heartbeat received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Send one heartbeat. Returns true if new config was applied.
    pub async fn beat(&self) -> bool {
        match self.client.heartbeat(false).await {
            Ok(Some(config)) => match self.handle.replace(config) {
                Ok(()) => {
                    metrics::record_config_update("heartbeat");
                    true
                }
                Err(errors) => {
                    tracing::error!(errors = ?errors, "Config from core rejected. Keeping current configuration.");
                    false
                }
            },
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Heartbeat failed");
                false
            }
        }
    }
}
