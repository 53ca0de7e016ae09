//! OpenHIM Basic-Auth Mediator Library
//!
//! Relays every request from the OpenHIM core to one upstream service,
//! swapping in per-client Basic credentials, and answers with an
//! `application/json+openhim` envelope describing the orchestration.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod openhim;
pub mod relay;

pub use config::schema::AppConfig;
pub use config::ConfigHandle;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{OutcomeEnvelope, Relay};
