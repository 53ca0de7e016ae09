//! Upstream relay.
//!
//! # Responsibilities
//! - Resolve the caller's credential from the client id header
//! - Rewrite the inbound request for the upstream base URL
//! - Dispatch it exactly once and capture the orchestration
//!
//! # Design Decisions
//! - No retries and no timeout beyond the HTTP client's defaults
//! - Redirects are not followed; the upstream's own answer is reported
//! - Upstream 4xx/5xx are completed exchanges, not failures

use std::error::Error as StdError;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use url::Url;

use crate::config::{ApiConfig, ConfigSnapshot};
use crate::credentials::{find_mapping, ClientCredentialMapping};
use crate::relay::envelope::{
    header_fields, timestamp, OrchestrationRecord, OrchestrationRequest, OrchestrationResponse,
    Outcome,
};

/// Header carrying the OpenHIM client id.
pub const CLIENT_ID_HEADER: &str = "x-openhim-clientid";

/// Name of the orchestration recorded for the upstream call.
pub const ORCHESTRATION_NAME: &str = "Upstream request";

/// A request received from the OpenHIM core.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Path only; the inbound query string is not forwarded.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    /// Value of the client id header, if present and readable.
    pub fn client_id(&self) -> Option<&str> {
        self.headers
            .get(CLIENT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
    }
}

/// The request sent upstream.
#[derive(Debug, Clone)]
pub struct ForwardedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Rewrite `inbound` for the upstream base URL.
///
/// The base URL keeps its scheme, authority and query; only its path is
/// replaced. `Authorization` is overwritten when a mapping is given.
/// A request without `Accept` gets `*/*`, the value the HTTP client would
/// otherwise add on its own, so the recorded headers are the ones sent.
pub fn forward(
    inbound: InboundRequest,
    upstream: &Url,
    mapping: Option<&ClientCredentialMapping>,
) -> ForwardedRequest {
    let mut url = upstream.clone();
    url.set_path(&inbound.path);

    // Framing headers describe the inbound connection; the client regenerates them
    let mut headers = inbound.headers;
    for name in [
        header::HOST,
        header::CONTENT_LENGTH,
        header::TRANSFER_ENCODING,
        header::CONNECTION,
    ] {
        headers.remove(name);
    }

    if !headers.contains_key(header::ACCEPT) {
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    }

    if let Some(mapping) = mapping {
        match HeaderValue::from_str(&mapping.basic_auth()) {
            Ok(value) => {
                headers.insert(header::AUTHORIZATION, value);
            }
            Err(e) => {
                tracing::warn!(client_id = %mapping.client_id, error = %e, "Unusable credential, forwarding original Authorization");
            }
        }
    }

    ForwardedRequest {
        method: inbound.method,
        url,
        headers,
        body: inbound.body,
    }
}

/// Relays inbound requests to the configured upstream.
#[derive(Debug, Clone)]
pub struct Relay {
    client: reqwest::Client,
}

impl Relay {
    /// Create a relay using `client` for upstream calls.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build the upstream client: no redirects, certificate trust per `api`.
    pub fn from_api_config(api: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(api.trust_self_signed)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self::new(client))
    }

    /// Relay one request against the given configuration snapshot.
    pub async fn relay(&self, inbound: InboundRequest, snapshot: &ConfigSnapshot) -> Outcome {
        let client_id = inbound.client_id().map(str::to_owned);
        let mapping = find_mapping(client_id.as_deref(), &snapshot.mapping);

        tracing::info!(
            method = %inbound.method,
            path = %inbound.path,
            client_id = client_id.as_deref().unwrap_or("-"),
            mapped = mapping.is_some(),
            "Processing request"
        );

        let forwarded = forward(inbound, &snapshot.upstream, mapping);
        let request_timestamp = timestamp();

        tracing::debug!(url = %forwarded.url, "Sending upstream request");
        let result = self
            .client
            .request(forwarded.method.clone(), forwarded.url.clone())
            .headers(forwarded.headers.clone())
            .body(forwarded.body.clone())
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => return transport_failure(&forwarded, &e),
        };

        let status = response.status().as_u16();
        let response_headers = header_fields(response.headers());
        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => return transport_failure(&forwarded, &e),
        };
        let body = String::from_utf8_lossy(&body).into_owned();

        tracing::info!(url = %forwarded.url, status, "Received upstream response");

        let orchestration = OrchestrationRecord {
            name: ORCHESTRATION_NAME.to_string(),
            request: OrchestrationRequest {
                timestamp: request_timestamp,
                method: forwarded.method.to_string(),
                url: forwarded.url.to_string(),
                path: forwarded.url.path().to_string(),
                querystring: forwarded.url.query().unwrap_or_default().to_string(),
                headers: header_fields(&forwarded.headers),
                body: String::from_utf8_lossy(&forwarded.body).into_owned(),
            },
            response: OrchestrationResponse {
                timestamp: timestamp(),
                status,
                headers: response_headers.clone(),
                body: body.clone(),
            },
        };

        Outcome::Successful {
            headers: response_headers,
            body,
            orchestration,
        }
    }
}

fn transport_failure(forwarded: &ForwardedRequest, error: &reqwest::Error) -> Outcome {
    let message = error_chain(error);
    tracing::error!(url = %forwarded.url, error = %message, "Upstream error");
    Outcome::failed(message)
}

/// `error` followed by each of its sources, separated by `": "`.
fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
