//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the upstream URL before it can reach the relay
//! - Validate value ranges (intervals > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure: config → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system, on reload too

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{AppConfig, MediatorConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid upstream URL {url:?}: {reason}")]
    UpstreamUrl { url: String, reason: String },

    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("mediator urn must not be empty")]
    EmptyUrn,

    #[error("invalid API URL {0:?}")]
    ApiUrl(String),

    #[error("heartbeat interval must be greater than zero")]
    HeartbeatInterval,

    #[error("API timeout must be greater than zero")]
    ApiTimeout,
}

/// Validate the hot-swappable relay configuration.
pub fn validate_mediator_config(config: &MediatorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_mediator_config(config, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the whole application configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.mediator.urn.trim().is_empty() {
        errors.push(ValidationError::EmptyUrn);
    }

    if config.api.register {
        if Url::parse(&config.api.url).is_err() {
            errors.push(ValidationError::ApiUrl(config.api.url.clone()));
        }
        if config.api.heartbeat_interval_secs == 0 {
            errors.push(ValidationError::HeartbeatInterval);
        }
        if config.api.timeout_secs == 0 {
            errors.push(ValidationError::ApiTimeout);
        }
    } else {
        // Local mode relays with the file's config from the first request
        check_mediator_config(&config.config, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse an upstream base URL, accepting only absolute http(s) URLs.
pub fn parse_upstream_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::UpstreamUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ValidationError::UpstreamUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

// Only the upstream URL can make a relay config unusable; blank mapping
// rows are dropped when the snapshot is built.
fn check_mediator_config(config: &MediatorConfig, errors: &mut Vec<ValidationError>) {
    if let Err(e) = parse_upstream_url(&config.upstream_url) {
        errors.push(e);
    }
}
