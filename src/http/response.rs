//! Envelope responses.
//!
//! Every relay answers `200` with an `application/json+openhim` body; the
//! relay's own result lives inside the envelope.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::relay::{OutcomeEnvelope, OPENHIM_CONTENT_TYPE};

impl IntoResponse for OutcomeEnvelope {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, OPENHIM_CONTENT_TYPE)],
            Json(self),
        )
            .into_response()
    }
}
