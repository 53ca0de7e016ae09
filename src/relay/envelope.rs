//! OpenHIM response envelope.
//!
//! # Responsibilities
//! - Represent the relay result as a tagged outcome
//! - Render the outcome into the fixed `application/json+openhim` schema
//! - Render header sets and timestamps the way the OpenHIM core expects

use std::collections::BTreeMap;

use axum::http::HeaderMap;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Content type the OpenHIM core expects from a mediator.
pub const OPENHIM_CONTENT_TYPE: &str = "application/json+openhim";

/// Header set rendered as a JSON object.
pub type HeaderFields = BTreeMap<String, String>;

/// Render a header map as lowercase name → value.
///
/// Repeated headers are joined with `", "`.
pub fn header_fields(headers: &HeaderMap) -> HeaderFields {
    let mut fields = HeaderFields::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        fields
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    fields
}

/// Current time as an RFC 3339 UTC timestamp with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Envelope status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeStatus {
    Successful,
    Failed,
}

impl EnvelopeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeStatus::Successful => "Successful",
            EnvelopeStatus::Failed => "Failed",
        }
    }
}

/// Audit entry for one upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationRecord {
    pub name: String,
    pub request: OrchestrationRequest,
    pub response: OrchestrationResponse,
}

/// Request side of an [`OrchestrationRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationRequest {
    /// Taken just before dispatch.
    pub timestamp: String,
    pub method: String,
    pub url: String,
    pub path: String,
    pub querystring: String,
    pub headers: HeaderFields,
    pub body: String,
}

/// Response side of an [`OrchestrationRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationResponse {
    pub timestamp: String,
    /// Status code the upstream actually returned.
    pub status: u16,
    pub headers: HeaderFields,
    pub body: String,
}

/// Result of one relay operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The upstream answered, whatever its status code.
    Successful {
        headers: HeaderFields,
        body: String,
        orchestration: OrchestrationRecord,
    },
    /// No upstream response could be obtained.
    Failed { message: String },
}

impl Outcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Outcome::Failed {
            message: message.into(),
        }
    }

    pub fn status(&self) -> EnvelopeStatus {
        match self {
            Outcome::Successful { .. } => EnvelopeStatus::Successful,
            Outcome::Failed { .. } => EnvelopeStatus::Failed,
        }
    }
}

/// `response` member of the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeResponse {
    pub status: u16,
    pub headers: HeaderFields,
    pub body: String,
    pub timestamp: String,
}

/// The document returned to the OpenHIM core for every inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEnvelope {
    #[serde(rename = "x-mediator-urn")]
    pub mediator_urn: String,
    pub status: EnvelopeStatus,
    pub response: EnvelopeResponse,
    pub orchestrations: Vec<OrchestrationRecord>,
}

impl OutcomeEnvelope {
    /// Build the envelope for `outcome`.
    pub fn new(urn: impl Into<String>, outcome: Outcome) -> Self {
        let status = outcome.status();
        let (response, orchestrations) = match outcome {
            Outcome::Successful {
                headers,
                body,
                orchestration,
            } => (
                EnvelopeResponse {
                    status: 200,
                    headers,
                    body,
                    timestamp: timestamp(),
                },
                vec![orchestration],
            ),
            Outcome::Failed { message } => (
                EnvelopeResponse {
                    status: 500,
                    headers: HeaderFields::new(),
                    body: message,
                    timestamp: timestamp(),
                },
                Vec::new(),
            ),
        };

        Self {
            mediator_urn: urn.into(),
            status,
            response,
            orchestrations,
        }
    }
}
