//! Shared, atomically replaceable relay configuration.

use std::sync::Arc;

use arc_swap::ArcSwap;
use url::Url;

use crate::config::schema::MediatorConfig;
use crate::config::validation::{parse_upstream_url, validate_mediator_config, ValidationError};
use crate::credentials::ClientCredentialMapping;

/// Validated, immutable view of a [`MediatorConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    /// Parsed upstream base URL.
    pub upstream: Url,
    /// Client id → credential table, in configured order.
    pub mapping: Vec<ClientCredentialMapping>,
}

impl ConfigSnapshot {
    /// Validate `config` and turn it into a snapshot.
    pub fn from_config(config: MediatorConfig) -> Result<Self, Vec<ValidationError>> {
        validate_mediator_config(&config)?;
        let upstream = parse_upstream_url(&config.upstream_url).map_err(|e| vec![e])?;

        // A blank client id can never identify a caller
        let mut mapping = config.mapping;
        let before = mapping.len();
        mapping.retain(|entry| !entry.client_id.trim().is_empty());
        if mapping.len() < before {
            tracing::warn!(skipped = before - mapping.len(), "Ignoring mapping entries without a client id");
        }

        Ok(Self { upstream, mapping })
    }
}

/// Process-wide handle to the current relay configuration.
///
/// Every update swaps in a whole new snapshot, so a reader sees either the
/// old upstream and mapping table together or the new ones together.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    current: Arc<ArcSwap<ConfigSnapshot>>,
}

impl ConfigHandle {
    /// Create a handle seeded with `config`.
    pub fn new(config: MediatorConfig) -> Result<Self, Vec<ValidationError>> {
        let snapshot = ConfigSnapshot::from_config(config)?;
        Ok(Self {
            current: Arc::new(ArcSwap::from_pointee(snapshot)),
        })
    }

    /// The snapshot in effect right now.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    /// Replace the whole configuration.
    ///
    /// An invalid config is rejected and the current snapshot stays in place.
    pub fn replace(&self, config: MediatorConfig) -> Result<(), Vec<ValidationError>> {
        let snapshot = ConfigSnapshot::from_config(config)?;
        tracing::info!(
            upstream = %snapshot.upstream,
            mappings = snapshot.mapping.len(),
            "Relay configuration replaced"
        );
        self.current.store(Arc::new(snapshot));
        Ok(())
    }
}
