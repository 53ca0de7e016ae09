//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get, post},
    Json, Router,
};
use basic_auth_mediator::config::{AppConfig, ConfigHandle, MediatorConfig};
use basic_auth_mediator::credentials::ClientCredentialMapping;
use basic_auth_mediator::{HttpServer, Shutdown};
use tokio::net::TcpListener;

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub type Captures = Arc<Mutex<Vec<Captured>>>;

/// Serve `router` on an ephemeral localhost port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// A localhost address nothing is listening on.
pub fn unused_addr() -> SocketAddr {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
}

/// Start a mock upstream answering every request with `status` and `body`,
/// recording what it received.
pub async fn start_upstream(status: u16, body: &'static str) -> (SocketAddr, Captures) {
    let captures: Captures = Arc::default();
    let state = (captures.clone(), status, body);

    async fn handler(
        State((captures, status, body)): State<(Captures, u16, &'static str)>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        request_body: Bytes,
    ) -> impl IntoResponse {
        captures.lock().unwrap().push(Captured {
            method,
            uri,
            headers,
            body: request_body,
        });
        (
            StatusCode::from_u16(status).unwrap(),
            [("content-type", "text/plain"), ("x-upstream", "mock")],
            body,
        )
    }

    let router = Router::new()
        .route("/", any(handler))
        .route("/{*path}", any(handler))
        .with_state(state);

    (serve(router).await, captures)
}

pub fn relay_config(upstream: SocketAddr, mapping: Vec<ClientCredentialMapping>) -> MediatorConfig {
    MediatorConfig {
        upstream_url: format!("http://{upstream}"),
        mapping,
    }
}

/// Start the mediator itself; returns its address and the live config handle.
pub async fn start_mediator(
    relay: MediatorConfig,
    shutdown: &Shutdown,
) -> (SocketAddr, ConfigHandle) {
    let app = AppConfig::default();
    let handle = ConfigHandle::new(relay).unwrap();
    let server = HttpServer::new(&app, handle.clone()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, handle)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// What the mock OpenHIM core observed.
#[derive(Debug, Default)]
pub struct CoreLog {
    pub registrations: Vec<serde_json::Value>,
    pub heartbeats: Vec<serde_json::Value>,
    pub auth_headers: Vec<HashMap<String, String>>,
}

#[derive(Clone)]
pub struct MockCore {
    pub log: Arc<Mutex<CoreLog>>,
    /// Config returned by heartbeats; `None` answers with an empty body.
    pub config: Arc<Mutex<Option<serde_json::Value>>>,
    /// Only return config when the mediator asks for it.
    pub only_when_forced: bool,
}

fn auth_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("auth-"))
        .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or_default().to_string()))
        .collect()
}

/// Start a mock OpenHIM core API.
pub async fn start_core(mock: MockCore) -> SocketAddr {
    async fn authenticate(Path(user): Path<String>) -> impl IntoResponse {
        if user == "root@openhim.org" {
            (StatusCode::OK, Json(serde_json::json!({ "salt": "core-salt", "ts": "now" }))).into_response()
        } else {
            StatusCode::NOT_FOUND.into_response()
        }
    }

    async fn register(
        State(mock): State<MockCore>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> StatusCode {
        let mut log = mock.log.lock().unwrap();
        log.auth_headers.push(auth_headers(&headers));
        log.registrations.push(body);
        StatusCode::CREATED
    }

    async fn heartbeat(
        State(mock): State<MockCore>,
        Path(_urn): Path<String>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> impl IntoResponse {
        let forced = body["config"].as_bool().unwrap_or(false);
        {
            let mut log = mock.log.lock().unwrap();
            log.auth_headers.push(auth_headers(&headers));
            log.heartbeats.push(body);
        }

        let config = mock.config.lock().unwrap().clone();
        match config {
            Some(config) if forced || !mock.only_when_forced => {
                (StatusCode::OK, Json(config)).into_response()
            }
            _ => (StatusCode::OK, "").into_response(),
        }
    }

    let router = Router::new()
        .route("/authenticate/{user}", get(authenticate))
        .route("/mediators", post(register))
        .route("/mediators/{urn}/heartbeat", post(heartbeat))
        .with_state(mock);

    serve(router).await
}
