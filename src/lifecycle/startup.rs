//! Startup orchestration.
//!
//! # Responsibilities
//! - Decide where relay config comes from (OpenHIM core or config file)
//! - Register with the core and fetch the initial config
//! - Start background tasks (heartbeat or file watcher)
//!
//! # Design Decisions
//! - Fail fast: registration or initial config failure is fatal
//! - Listeners start last, in `main` (traffic only when config is ready)

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::watcher::ConfigWatcher;
use crate::config::{AppConfig, ConfigHandle, ValidationError};
use crate::lifecycle::Shutdown;
use crate::openhim::{ApiClient, ApiError, Heartbeat, MediatorRegistration};

/// Error type for startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("OpenHIM core API error: {0}")]
    Api(#[from] ApiError),

    #[error("invalid relay configuration: {0:?}")]
    Config(Vec<ValidationError>),

    #[error("failed to watch config file: {0}")]
    Watch(#[from] notify::Error),
}

/// Background machinery keeping the relay config current.
pub struct MediatorRuntime {
    /// Config read by every relay.
    pub config: ConfigHandle,
    /// Heartbeat task, when registered with the core.
    pub heartbeat: Option<JoinHandle<()>>,
    /// File watcher, in local mode; dropping it stops reloads.
    pub watcher: Option<RecommendedWatcher>,
}

/// Obtain the initial relay config and start whatever keeps it current.
///
/// With `api.register` set, the mediator registers itself, takes its config
/// from the core and starts the heartbeat. Otherwise the config file's
/// `[config]` section is used and, if `config_path` is given, watched.
pub async fn bootstrap(
    app: &AppConfig,
    config_path: Option<&Path>,
    shutdown: &Shutdown,
) -> Result<MediatorRuntime, StartupError> {
    if app.api.register {
        bootstrap_registered(app, shutdown).await
    } else {
        bootstrap_local(app, config_path)
    }
}

async fn bootstrap_registered(
    app: &AppConfig,
    shutdown: &Shutdown,
) -> Result<MediatorRuntime, StartupError> {
    let client = Arc::new(ApiClient::new(&app.api, &app.mediator.urn)?);
    let registration = MediatorRegistration::from_app_config(app)
        .map_err(|e| StartupError::Config(vec![e]))?;

    client.register(&registration).await?;

    let initial = client.fetch_config().await?;
    tracing::info!(upstream = %initial.upstream_url, mappings = initial.mapping.len(), "Received initial config");
    let config = ConfigHandle::new(initial).map_err(StartupError::Config)?;

    let heartbeat = Heartbeat::new(
        client,
        config.clone(),
        Duration::from_secs(app.api.heartbeat_interval_secs),
    );
    let task = tokio::spawn(heartbeat.run(shutdown.subscribe()));

    Ok(MediatorRuntime {
        config,
        heartbeat: Some(task),
        watcher: None,
    })
}

fn bootstrap_local(
    app: &AppConfig,
    config_path: Option<&Path>,
) -> Result<MediatorRuntime, StartupError> {
    tracing::info!("Registration disabled, using config from file");
    let config = ConfigHandle::new(app.config.clone()).map_err(StartupError::Config)?;

    let watcher = match config_path {
        Some(path) => Some(ConfigWatcher::new(path, config.clone()).run()?),
        None => None,
    };

    Ok(MediatorRuntime {
        config,
        heartbeat: None,
        watcher,
    })
}
