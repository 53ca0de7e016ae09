//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route)
//!     → request.rs (buffer body, build InboundRequest)
//!     → relay (credential mapping, upstream call)
//!     → response.rs (envelope as application/json+openhim)
//!     → Send to OpenHIM core
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use server::HttpServer;
