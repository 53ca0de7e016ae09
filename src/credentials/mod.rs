//! Client credential mapping subsystem.
//!
//! # Data Flow
//! ```text
//! x-openhim-clientid header
//!     → mapper.rs (lookup in the current mapping table)
//!     → Basic credential for the upstream Authorization header
//! ```
//!
//! # Design Decisions
//! - Lookup is pure: no caching, the table comes from the config snapshot
//! - Duplicate client ids resolve to the last entry in the table

pub mod mapper;

pub use mapper::{find_mapping, ClientCredentialMapping};
