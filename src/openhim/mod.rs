//! OpenHIM core integration.
//!
//! # Data Flow
//! ```text
//! Startup (register = true):
//!     client.rs authenticate → registration.rs POST /mediators
//!     → heartbeat with config=true → initial ConfigHandle
//!
//! Running:
//!     heartbeat.rs every interval → POST /mediators/{urn}/heartbeat
//!     → config in response? → ConfigHandle::replace
//! ```

pub mod client;
pub mod heartbeat;
pub mod registration;

pub use client::{ApiClient, ApiError};
pub use heartbeat::Heartbeat;
pub use registration::MediatorRegistration;
