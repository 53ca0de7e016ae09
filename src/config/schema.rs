//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the mediator.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Deserializer, Serialize};

use crate::credentials::ClientCredentialMapping;

/// Root configuration for the mediator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Mediator identity and registration details.
    pub mediator: MediatorInfo,

    /// OpenHIM core API access.
    pub api: ApiConfig,

    /// Inbound request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Relay configuration used when the mediator does not register.
    pub config: MediatorConfig,
}

/// Relay configuration owned by the OpenHIM core.
///
/// Replaced wholesale on every update; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MediatorConfig {
    /// Base URL of the upstream service.
    #[serde(rename = "upstreamURL", alias = "upstream_url")]
    pub upstream_url: String,

    /// Client id → credential table. `null` reads as an empty table.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mapping: Vec<ClientCredentialMapping>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ClientCredentialMapping>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ClientCredentialMapping>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            upstream_url: "http://localhost:8080".to_string(),
            mapping: Vec::new(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Mediator identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MediatorInfo {
    /// URN reported in every envelope and used for registration.
    pub urn: String,

    pub version: String,

    pub name: String,

    pub description: String,

    /// Host the OpenHIM core uses to reach this mediator.
    pub host: String,

    /// URL pattern of the default channel offered at registration.
    pub url_pattern: String,
}

impl Default for MediatorInfo {
    fn default() -> Self {
        Self {
            urn: "urn:mediator:basic-auth".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: "Basic Auth Mediator".to_string(),
            description: "Maps OpenHIM clients to upstream Basic credentials".to_string(),
            host: "localhost".to_string(),
            url_pattern: "^/.*$".to_string(),
        }
    }
}

/// OpenHIM core API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the OpenHIM core API (e.g., "https://localhost:8080").
    pub url: String,

    pub username: String,

    pub password: String,

    /// Accept self-signed certificates on every outbound call.
    pub trust_self_signed: bool,

    /// Register with the core and take config from heartbeats.
    pub register: bool,

    /// Heartbeat interval in seconds.
    pub heartbeat_interval_secs: u64,

    /// Timeout for core API calls in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "https://localhost:8080".to_string(),
            username: "root@openhim.org".to_string(),
            password: String::new(),
            trust_self_signed: false,
            register: false,
            heartbeat_interval_secs: 10,
            timeout_secs: 10,
        }
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum buffered body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
