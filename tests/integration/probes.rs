//! Probes exercised against a local stand-in gateway.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use gwmon::probes::{KnownGoodCheck, NonExistCheck};
use gwmon::{GatewayClient, IpfsClient, Probe, ProbeDeps, ProbeError};

const KNOWN_CID: &str = "QmStubKnownGoodContent";
const KNOWN_BODY: &[u8] = b"Hello World!\r\n";

/// Serves one known CID and 404s everything else, like a gateway that has
/// exactly one block pinned.
fn gateway_router() -> Router {
    Router::new().route(
        "/ipfs/{cid}",
        get(|Path(cid): Path<String>| async move {
            if cid == KNOWN_CID {
                Ok(KNOWN_BODY.to_vec())
            } else {
                Err(StatusCode::NOT_FOUND)
            }
        }),
    )
}

/// Bind the router on an ephemeral port and return deps pointing at it.
async fn serve_gateway(router: Router) -> ProbeDeps {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve stub gateway");
    });
    ProbeDeps::new(
        GatewayClient::new(format!("http://{addr}")),
        IpfsClient::new("http://127.0.0.1:1"),
        None,
    )
}

#[tokio::test]
async fn test_known_good_check_passes_on_matching_content() {
    let deps = serve_gateway(gateway_router()).await;
    let probe = KnownGoodCheck::new(
        "0 * * * *",
        vec![(format!("/ipfs/{KNOWN_CID}"), KNOWN_BODY.to_vec())],
    );

    probe.run(&deps).await.unwrap();
}

#[tokio::test]
async fn test_known_good_check_detects_mismatch() {
    let deps = serve_gateway(gateway_router()).await;
    let probe = KnownGoodCheck::new(
        "0 * * * *",
        vec![(format!("/ipfs/{KNOWN_CID}"), b"something else".to_vec())],
    );

    let err = probe.run(&deps).await.unwrap_err();
    assert!(matches!(err, ProbeError::Mismatch { .. }));
}

#[tokio::test]
async fn test_non_exist_check_passes_when_gateway_404s() {
    let deps = serve_gateway(gateway_router()).await;
    let probe = NonExistCheck::new("0 * * * *");

    probe.run(&deps).await.unwrap();
}

#[tokio::test]
async fn test_non_exist_check_flags_gateway_that_invents_content() {
    // A gateway answering 200 for a random CID is misbehaving.
    let router = Router::new().route(
        "/ipfs/{cid}",
        get(|| async { "fabricated".to_string() }),
    );
    let deps = serve_gateway(router).await;
    let probe = NonExistCheck::new("0 * * * *");

    let err = probe.run(&deps).await.unwrap_err();
    assert!(matches!(
        err,
        ProbeError::UnexpectedStatus { got: 200, expected: 404, .. }
    ));
}

#[tokio::test]
async fn test_gateway_client_records_timings_and_body() {
    let deps = serve_gateway(gateway_router()).await;
    let outcome = deps
        .gateway
        .fetch(&format!("/ipfs/{KNOWN_CID}"))
        .await
        .unwrap();

    assert_eq!(outcome.status, 200);
    assert_eq!(outcome.body, KNOWN_BODY);
    assert!(outcome.ttfb_ms <= outcome.total_ms);
}
