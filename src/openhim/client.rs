//! OpenHIM core API client.
//!
//! # Responsibilities
//! - Token authentication against `/authenticate/{username}`
//! - Mediator registration (`POST /mediators`)
//! - Heartbeats, which double as the config delivery channel

use std::time::{Duration, Instant};

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;
use url::Url;

use crate::config::{ApiConfig, MediatorConfig};
use crate::openhim::registration::MediatorRegistration;
use crate::relay::envelope::timestamp;

/// Error type for OpenHIM core API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API URL {0:?}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("user {0} not found when authenticating with core API")]
    UnknownUser(String),

    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("core returned an unreadable config: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("core returned no config for this mediator")]
    MissingConfig,

    #[error("invalid auth header value: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderValue),
}

/// Body of `GET /authenticate/{username}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthChallenge {
    pub salt: String,
    #[serde(default)]
    pub ts: Option<String>,
}

#[derive(Debug, Serialize)]
struct HeartbeatRequest {
    uptime: f64,
    config: bool,
}

/// `auth-token` for a user salt, password and request timestamp.
///
/// `sha512_hex(sha512_hex(salt + password) + salt + ts)`
pub fn auth_token(salt: &str, password: &str, ts: &str) -> String {
    let passhash = hex::encode(Sha512::digest(format!("{salt}{password}")));

    let mut token = Sha512::new();
    token.update(passhash.as_bytes());
    token.update(salt.as_bytes());
    token.update(ts.as_bytes());
    hex::encode(token.finalize())
}

/// Client for the OpenHIM core API, bound to one mediator URN.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    username: String,
    password: String,
    urn: String,
    started: Instant,
}

impl ApiClient {
    pub fn new(api: &ApiConfig, urn: &str) -> Result<Self, ApiError> {
        let base = Url::parse(&api.url).map_err(|_| ApiError::InvalidUrl(api.url.clone()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(api.url.clone()));
        }

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(api.trust_self_signed)
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base,
            username: api.username.clone(),
            password: api.password.clone(),
            urn: urn.to_string(),
            started: Instant::now(),
        })
    }

    /// Seconds since this client was created.
    pub fn uptime(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetch the user's salt and build the token auth headers.
    pub async fn auth_headers(&self) -> Result<HeaderMap, ApiError> {
        let url = self.endpoint(&["authenticate", self.username.as_str()])?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::UnknownUser(self.username.clone()));
        }
        let challenge: AuthChallenge = response.json().await?;

        let ts = timestamp();
        let token = auth_token(&challenge.salt, &self.password, &ts);

        let mut headers = HeaderMap::new();
        for (name, value) in [
            ("auth-username", self.username.as_str()),
            ("auth-ts", ts.as_str()),
            ("auth-salt", challenge.salt.as_str()),
            ("auth-token", token.as_str()),
        ] {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_str(value)?);
        }
        Ok(headers)
    }

    /// Register (or update) this mediator with the core.
    pub async fn register(&self, registration: &MediatorRegistration) -> Result<(), ApiError> {
        let url = self.endpoint(&["mediators"])?;
        let headers = self.auth_headers().await?;
        let response = self
            .http
            .post(url.clone())
            .headers(headers)
            .json(registration)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 201 && status.as_u16() != 200 {
            return Err(ApiError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        tracing::info!(urn = %registration.urn, "Mediator registered with OpenHIM core");
        Ok(())
    }

    /// Send a heartbeat; returns the mediator config if the core sent one.
    ///
    /// The core only includes config when `force_config` is set or the
    /// config changed since the last heartbeat.
    pub async fn heartbeat(&self, force_config: bool) -> Result<Option<MediatorConfig>, ApiError> {
        let url = self.endpoint(&["mediators", self.urn.as_str(), "heartbeat"])?;
        let headers = self.auth_headers().await?;
        let response = self
            .http
            .post(url.clone())
            .headers(headers)
            .json(&HeartbeatRequest {
                uptime: self.uptime(),
                config: force_config,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status.as_u16() != 200 {
            return Err(ApiError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        parse_heartbeat_body(&body)
    }

    /// Fetch the current config, failing if the core has none.
    pub async fn fetch_config(&self) -> Result<MediatorConfig, ApiError> {
        self.heartbeat(true).await?.ok_or(ApiError::MissingConfig)
    }
}

/// Empty body or `{}` means "no change".
fn parse_heartbeat_body(body: &str) -> Result<Option<MediatorConfig>, ApiError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_str(body)?;
    match value {
        serde_json::Value::Object(ref map) if map.is_empty() => Ok(None),
        serde_json::Value::Null => Ok(None),
        other => Ok(Some(serde_json::from_value(other)?)),
    }
}
