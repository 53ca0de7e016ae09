//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::handle::ConfigHandle;
use crate::config::loader::load_config;
use crate::observability::metrics;

/// Watches the config file and swaps its `[config]` section into the handle.
pub struct ConfigWatcher {
    path: PathBuf,
    handle: ConfigHandle,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    pub fn new(path: &Path, handle: ConfigHandle) -> Self {
        Self {
            path: path.to_path_buf(),
            handle,
        }
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let handle = self.handle;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        reload(&path, &handle);
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn reload(path: &Path, handle: &ConfigHandle) {
    let new_config = match load_config(path) {
        Ok(c) => c.config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config. Keeping current configuration.");
            return;
        }
    };

    match handle.replace(new_config) {
        Ok(()) => metrics::record_config_update("file"),
        Err(errors) => {
            tracing::error!(errors = ?errors, "Reloaded config rejected. Keeping current configuration.");
        }
    }
}
