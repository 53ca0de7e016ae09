//! OpenHIM Basic-Auth Mediator
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                   MEDIATOR                       │
//!                         │                                                  │
//!   OpenHIM core request  │  ┌─────────┐    ┌─────────────┐    ┌─────────┐  │
//!   ──────────────────────┼─▶│  http   │───▶│ credentials │───▶│  relay  │──┼───▶ Upstream
//!                         │  │ server  │    │   mapper    │    │pipeline │  │     service
//!                         │  └─────────┘    └─────────────┘    └────┬────┘  │
//!                         │                                         │       │
//!   Envelope (200,        │  ┌──────────────────────┐               │       │
//!   json+openhim)         │  │ envelope + orchestr. │◀──────────────┘       │
//!   ◀─────────────────────┼──│       record         │                       │
//!                         │  └──────────────────────┘                       │
//!                         │                                                  │
//!                         │  ┌────────────────────────────────────────────┐ │
//!                         │  │ config snapshot (arc-swap)                 │ │
//!                         │  │   ▲ heartbeat (OpenHIM core) / file watcher│ │
//!                         │  └────────────────────────────────────────────┘ │
//!                         └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use tokio::net::TcpListener;

use basic_auth_mediator::cli::Cli;
use basic_auth_mediator::config::loader::{load_config, ConfigError};
use basic_auth_mediator::config::validation::validate_config;
use basic_auth_mediator::lifecycle::{bootstrap, signals::shutdown_signal, Shutdown};
use basic_auth_mediator::observability::{logging, metrics};
use basic_auth_mediator::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        urn = %config.mediator.urn,
        "basic-auth-mediator starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        register = config.api.register,
        api_url = %config.api.url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();
    let runtime = bootstrap(&config, Some(cli.config.as_path()), &shutdown).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(&config, runtime.config.clone())?;
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        _ = shutdown_signal() => {
            shutdown.trigger();
            server_task.await??;
        }
        result = &mut server_task => {
            shutdown.trigger();
            result??;
        }
    }

    if let Some(heartbeat) = runtime.heartbeat {
        let _ = heartbeat.await;
    }
    drop(runtime.watcher);

    tracing::info!("Shutdown complete");
    Ok(())
}
