//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all relay handler
//! - Wire up middleware (tracing)
//! - Bind server to listener
//! - Hand every request to the relay and answer with its envelope

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, ConfigHandle};
use crate::http::request::read_inbound;
use crate::observability::metrics;
use crate::relay::{Outcome, OutcomeEnvelope, Relay};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Relay,
    pub config: ConfigHandle,
    pub urn: Arc<str>,
    pub max_body_size: usize,
}

/// HTTP server for the mediator.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server relaying with the current `config` snapshot.
    pub fn new(app: &AppConfig, config: ConfigHandle) -> Result<Self, reqwest::Error> {
        let relay = Relay::from_api_config(&app.api)?;
        Ok(Self::with_relay(app, config, relay))
    }

    /// Create a server around an existing relay.
    pub fn with_relay(app: &AppConfig, config: ConfigHandle, relay: Relay) -> Self {
        let state = AppState {
            relay,
            config,
            urn: Arc::from(app.mediator.urn.as_str()),
            max_body_size: app.limits.max_body_size,
        };

        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(relay_handler))
            .route("/", any(relay_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The configured router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every method on every path is relayed.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> OutcomeEnvelope {
    let start_time = Instant::now();

    let inbound = match read_inbound(request, state.max_body_size).await {
        Ok(inbound) => inbound,
        Err(message) => {
            tracing::warn!(error = %message, "Rejecting unreadable request");
            let outcome = Outcome::failed(message);
            metrics::record_relay(outcome.status().as_str(), None, start_time);
            return OutcomeEnvelope::new(state.urn.as_ref(), outcome);
        }
    };

    // One snapshot for the whole relay, even if config is swapped meanwhile
    let snapshot = state.config.snapshot();
    let outcome = state.relay.relay(inbound, &snapshot).await;

    let upstream_status = match &outcome {
        Outcome::Successful { orchestration, .. } => Some(orchestration.response.status),
        Outcome::Failed { .. } => None,
    };
    metrics::record_relay(outcome.status().as_str(), upstream_status, start_time);

    tracing::info!(status = outcome.status().as_str(), "Responding to OpenHIM");
    OutcomeEnvelope::new(state.urn.as_ref(), outcome)
}
