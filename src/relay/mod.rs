//! Request relay subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → pipeline.rs (client id → credential, rewrite, single upstream call)
//!     → Outcome (Successful | Failed)
//!     → envelope.rs (OutcomeEnvelope, application/json+openhim)
//! ```
//!
//! # Design Decisions
//! - Exactly one envelope per inbound request on every path
//! - Transport failures are contained here and never propagate
//! - Config is read once per request from an immutable snapshot

pub mod envelope;
pub mod pipeline;

pub use envelope::{
    EnvelopeStatus, OrchestrationRecord, Outcome, OutcomeEnvelope, OPENHIM_CONTENT_TYPE,
};
pub use pipeline::{forward, ForwardedRequest, InboundRequest, Relay, CLIENT_ID_HEADER};
