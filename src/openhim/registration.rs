//! Mediator registration document.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, MediatorConfig, ValidationError};

/// Body of `POST /mediators`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediatorRegistration {
    pub urn: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub endpoints: Vec<Endpoint>,
    pub default_channel_config: Vec<ChannelConfig>,
    pub config_defs: Vec<ConfigDef>,
    /// Initial config the core offers until an admin changes it.
    pub config: MediatorConfig,
}

/// Where the core can reach this mediator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub primary: bool,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Channel the core may create to route traffic here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    pub name: String,
    pub url_pattern: String,
    pub routes: Vec<Endpoint>,
    pub allow: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Describes one editable config parameter in the core's console.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDef {
    pub param: String,
    pub display_name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template: Vec<ConfigDef>,
}

impl ConfigDef {
    fn field(param: &str, display_name: &str, description: &str, kind: &str) -> Self {
        Self {
            param: param.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            kind: kind.to_string(),
            array: None,
            template: Vec::new(),
        }
    }
}

/// Config parameters understood by this mediator.
pub fn config_defs() -> Vec<ConfigDef> {
    let mut mapping = ConfigDef::field(
        "mapping",
        "Client mapping",
        "Maps an OpenHIM client ID to the credentials sent upstream",
        "struct",
    );
    mapping.array = Some(true);
    mapping.template = vec![
        ConfigDef::field("clientID", "Client ID", "OpenHIM client ID", "string"),
        ConfigDef::field("username", "Username", "Upstream username", "string"),
        ConfigDef::field("password", "Password", "Upstream password", "password"),
    ];

    vec![
        ConfigDef::field(
            "upstreamURL",
            "Upstream URL",
            "Base URL requests are relayed to",
            "string",
        ),
        mapping,
    ]
}

impl MediatorRegistration {
    /// Build the registration for this process.
    pub fn from_app_config(app: &AppConfig) -> Result<Self, ValidationError> {
        let port = app
            .listener
            .bind_address
            .parse::<SocketAddr>()
            .map_err(|_| ValidationError::BindAddress(app.listener.bind_address.clone()))?
            .port();

        let endpoint = Endpoint {
            name: app.mediator.name.clone(),
            host: app.mediator.host.clone(),
            port,
            path: "/".to_string(),
            primary: true,
            kind: "http".to_string(),
        };

        let channel = ChannelConfig {
            name: app.mediator.name.clone(),
            url_pattern: app.mediator.url_pattern.clone(),
            routes: vec![endpoint.clone()],
            allow: vec!["admin".to_string()],
            kind: "http".to_string(),
        };

        Ok(Self {
            urn: app.mediator.urn.clone(),
            version: app.mediator.version.clone(),
            name: app.mediator.name.clone(),
            description: app.mediator.description.clone(),
            endpoints: vec![endpoint],
            default_channel_config: vec![channel],
            config_defs: config_defs(),
            config: app.config.clone(),
        })
    }
}
