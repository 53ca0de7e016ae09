//! End-to-end relay tests against mock upstreams.

use basic_auth_mediator::credentials::ClientCredentialMapping;
use basic_auth_mediator::relay::{EnvelopeStatus, OutcomeEnvelope};
use basic_auth_mediator::Shutdown;

mod common;

async fn envelope(res: reqwest::Response) -> OutcomeEnvelope {
    assert_eq!(res.status(), 200, "Envelope always travels as HTTP 200");
    assert_eq!(res.headers()["content-type"], "application/json+openhim");
    res.json().await.expect("Envelope should be JSON")
}

#[tokio::test]
async fn test_mapped_client_gets_basic_credentials() {
    let (upstream, captures) = common::start_upstream(200, "{\"id\":\"123\"}").await;
    let shutdown = Shutdown::new();
    let (mediator, _) = common::start_mediator(
        common::relay_config(upstream, vec![ClientCredentialMapping::new("clinicA", "u", "p")]),
        &shutdown,
    )
    .await;

    let res = common::client()
        .get(format!("http://{mediator}/patients/123"))
        .header("x-openhim-clientid", "clinicA")
        .send()
        .await
        .expect("Mediator unreachable");
    let env = envelope(res).await;

    let seen = captures.lock().unwrap().clone();
    assert_eq!(seen.len(), 1, "Exactly one upstream call");
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].uri.path(), "/patients/123");
    assert_eq!(seen[0].headers["authorization"], "Basic dTpw");

    assert_eq!(env.mediator_urn, "urn:mediator:basic-auth");
    assert_eq!(env.status, EnvelopeStatus::Successful);
    assert_eq!(env.response.status, 200);
    assert_eq!(env.response.body, "{\"id\":\"123\"}");
    assert_eq!(env.response.headers["x-upstream"], "mock");

    assert_eq!(env.orchestrations.len(), 1);
    let orch = &env.orchestrations[0];
    assert_eq!(orch.name, "Upstream request");
    assert_eq!(orch.request.method, "GET");
    assert_eq!(orch.request.url, format!("http://{upstream}/patients/123"));
    assert_eq!(orch.request.path, "/patients/123");
    assert_eq!(orch.request.headers["authorization"], "Basic dTpw");
    assert_eq!(orch.response.status, 200);
    assert_eq!(orch.response.body, "{\"id\":\"123\"}");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unmapped_client_keeps_authorization() {
    let (upstream, captures) = common::start_upstream(200, "ok").await;
    let shutdown = Shutdown::new();
    let (mediator, _) = common::start_mediator(
        common::relay_config(upstream, vec![ClientCredentialMapping::new("clinicA", "u", "p")]),
        &shutdown,
    )
    .await;

    let client = common::client();
    client
        .get(format!("http://{mediator}/a"))
        .header("x-openhim-clientid", "someoneElse")
        .header("authorization", "Bearer original")
        .send()
        .await
        .unwrap();
    client
        .get(format!("http://{mediator}/b"))
        .send()
        .await
        .unwrap();

    let seen = captures.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].headers["authorization"], "Bearer original");
    assert!(seen[1].headers.get("authorization").is_none());

    shutdown.trigger();
}

#[tokio::test]
async fn test_duplicate_client_id_uses_last_mapping() {
    let (upstream, captures) = common::start_upstream(200, "ok").await;
    let shutdown = Shutdown::new();
    let (mediator, _) = common::start_mediator(
        common::relay_config(
            upstream,
            vec![
                ClientCredentialMapping::new("clinicA", "first", "one"),
                ClientCredentialMapping::new("clinicA", "u", "p"),
            ],
        ),
        &shutdown,
    )
    .await;

    common::client()
        .get(format!("http://{mediator}/"))
        .header("X-OpenHIM-ClientID", "clinicA")
        .send()
        .await
        .unwrap();

    let seen = captures.lock().unwrap().clone();
    assert_eq!(seen[0].headers["authorization"], "Basic dTpw");

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_errors_are_successful_envelopes() {
    for status in [404u16, 503] {
        let (upstream, _) = common::start_upstream(status, "upstream says no").await;
        let shutdown = Shutdown::new();
        let (mediator, _) =
            common::start_mediator(common::relay_config(upstream, Vec::new()), &shutdown).await;

        let res = common::client()
            .get(format!("http://{mediator}/missing"))
            .send()
            .await
            .unwrap();
        let env = envelope(res).await;

        assert_eq!(env.status, EnvelopeStatus::Successful);
        assert_eq!(env.response.status, 200);
        assert_eq!(env.response.body, "upstream says no");
        assert_eq!(env.orchestrations.len(), 1);
        assert_eq!(env.orchestrations[0].response.status, status);

        shutdown.trigger();
    }
}

#[tokio::test]
async fn test_method_and_body_forwarded_verbatim() {
    let (upstream, captures) = common::start_upstream(201, "created").await;
    let shutdown = Shutdown::new();
    let mut relay = common::relay_config(upstream, Vec::new());
    relay.upstream_url = format!("http://{upstream}/ignored?tenant=7");
    let (mediator, _) = common::start_mediator(relay, &shutdown).await;

    let payload = "<Patient><id value=\"9\"/></Patient>";
    let res = common::client()
        .put(format!("http://{mediator}/fhir/Patient/9?dropped=1"))
        .header("content-type", "application/fhir+xml")
        .body(payload)
        .send()
        .await
        .unwrap();
    let env = envelope(res).await;

    let seen = captures.lock().unwrap().clone();
    assert_eq!(seen[0].method, "PUT");
    assert_eq!(seen[0].uri.path(), "/fhir/Patient/9");
    assert_eq!(seen[0].uri.query(), Some("tenant=7"));
    assert_eq!(seen[0].headers["content-type"], "application/fhir+xml");
    assert_eq!(&seen[0].body[..], payload.as_bytes());

    let orch = &env.orchestrations[0];
    assert_eq!(orch.request.body, payload);
    assert_eq!(orch.request.querystring, "tenant=7");
    assert_eq!(orch.response.status, 201);

    shutdown.trigger();
}

#[tokio::test]
async fn test_connection_refused_yields_failed_envelope() {
    let shutdown = Shutdown::new();
    let (mediator, _) = common::start_mediator(
        common::relay_config(
            common::unused_addr(),
            vec![ClientCredentialMapping::new("clinicA", "u", "p")],
        ),
        &shutdown,
    )
    .await;

    let res = common::client()
        .get(format!("http://{mediator}/patients/123"))
        .header("x-openhim-clientid", "clinicA")
        .send()
        .await
        .unwrap();
    let env = envelope(res).await;

    assert_eq!(env.status, EnvelopeStatus::Failed);
    assert_eq!(env.response.status, 500);
    assert!(env.response.headers.is_empty());
    assert!(!env.response.body.is_empty(), "Failure carries the error message");
    assert!(env.orchestrations.is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_config_swap_applies_to_next_request() {
    let (first, first_seen) = common::start_upstream(200, "first").await;
    let (second, second_seen) = common::start_upstream(200, "second").await;
    let shutdown = Shutdown::new();
    let (mediator, handle) =
        common::start_mediator(common::relay_config(first, Vec::new()), &shutdown).await;

    let client = common::client();
    let env = envelope(client.get(format!("http://{mediator}/x")).send().await.unwrap()).await;
    assert_eq!(env.response.body, "first");

    handle
        .replace(common::relay_config(
            second,
            vec![ClientCredentialMapping::new("clinicA", "u", "p")],
        ))
        .unwrap();

    let env = envelope(
        client
            .get(format!("http://{mediator}/x"))
            .header("x-openhim-clientid", "clinicA")
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(env.response.body, "second");

    assert_eq!(first_seen.lock().unwrap().len(), 1);
    let seen = second_seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].headers["authorization"], "Basic dTpw");

    shutdown.trigger();
}
