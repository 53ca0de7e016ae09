//! Inbound request extraction.
//!
//! # Responsibilities
//! - Buffer the inbound body as opaque bytes, whatever its content type
//! - Capture method, path and headers for the relay
//!
//! # Design Decisions
//! - Body size bounded by `limits.max_body_size`
//! - The inbound query string is dropped; only the path is relayed

use axum::body::{to_bytes, Body};
use axum::http::Request;

use crate::relay::InboundRequest;

/// Read `request` into an [`InboundRequest`], buffering at most `limit` bytes.
pub async fn read_inbound(request: Request<Body>, limit: usize) -> Result<InboundRequest, String> {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, limit)
        .await
        .map_err(|e| format!("Failed to read request body: {e}"))?;

    Ok(InboundRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        headers: parts.headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[tokio::test]
    async fn test_read_inbound() {
        let request = Request::builder()
            .method(Method::PUT)
            .uri("http://mediator/fhir/Patient/1?_format=json")
            .header("x-openhim-clientid", "clinicA")
            .header("content-type", "application/fhir+json")
            .body(Body::from("{\"id\":\"1\"}"))
            .unwrap();

        let inbound = read_inbound(request, 1024).await.unwrap();
        assert_eq!(inbound.method, Method::PUT);
        assert_eq!(inbound.path, "/fhir/Patient/1");
        assert_eq!(inbound.client_id(), Some("clinicA"));
        assert_eq!(&inbound.body[..], b"{\"id\":\"1\"}");
    }

    #[tokio::test]
    async fn test_body_over_limit() {
        let request = Request::builder()
            .uri("/")
            .body(Body::from(vec![b'x'; 64]))
            .unwrap();

        let err = read_inbound(request, 16).await.unwrap_err();
        assert!(err.starts_with("Failed to read request body"));
    }
}
