//! Client id to upstream credential lookup.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use serde::{Deserialize, Serialize};

/// One client id → upstream credential entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientCredentialMapping {
    /// Client id as sent by OpenHIM in `x-openhim-clientid`.
    #[serde(rename = "clientID", alias = "client_id", default)]
    pub client_id: String,

    /// Username presented to the upstream service.
    #[serde(default)]
    pub username: String,

    /// Password presented to the upstream service.
    #[serde(default)]
    pub password: String,
}

impl ClientCredentialMapping {
    pub fn new(
        client_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// `Authorization` header value for this credential.
    pub fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", B64.encode(raw))
    }
}

/// Find the credential mapped to `client_id`.
///
/// The whole table is scanned and the last matching entry wins, so a later
/// duplicate overrides an earlier one. An absent client id never matches.
pub fn find_mapping<'a>(
    client_id: Option<&str>,
    mappings: &'a [ClientCredentialMapping],
) -> Option<&'a ClientCredentialMapping> {
    let client_id = client_id?;
    mappings.iter().rev().find(|m| m.client_id == client_id)
}
