//! Router-level API tests
//!
//! These drive the axum router directly and never reach the network: every
//! request either succeeds locally or is rejected before the chain client
//! would be consulted.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use tongate_server::auth::{jwt, TonProofService};
use tongate_server::config::{Config, Environment};
use tongate_server::routes;
use tongate_server::state::AppState;
use tongate_server::ton::{TonApiClient, TonClients};

const SECRET: &str = "api-test-secret";

fn test_config() -> Config {
    Config {
        environment: Environment::Development,
        port: 0,
        frontend_url: "http://localhost:3000".to_string(),
        allowed_domains: vec!["localhost:3000".to_string()],
        jwt_secret: SECRET.to_string(),
        payload_token_ttl_seconds: 900,
        auth_token_ttl_seconds: 3600,
        valid_auth_time_seconds: 900,
        ton_mainnet_endpoint: "http://127.0.0.1:1".to_string(),
        ton_testnet_endpoint: "http://127.0.0.1:1".to_string(),
        cors_allowed_origins: None,
        log_level: "info".to_string(),
    }
}

fn test_app() -> axum::Router {
    let config = Arc::new(test_config());
    let http = reqwest::Client::new();
    let ton_clients = TonClients::new(
        TonApiClient::new(config.ton_mainnet_endpoint.clone(), http.clone()),
        TonApiClient::new(config.ton_testnet_endpoint.clone(), http),
    );
    let proof_service = Arc::new(TonProofService::new(
        config.allowed_domains.clone(),
        config.valid_auth_time_seconds,
    ));
    let state = AppState::new(config, proof_service, ton_clients);

    axum::Router::new()
        .merge(routes::auth_routes())
        .with_state(state)
}

#[tokio::test]
async fn generate_payload_issues_a_verifiable_token() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/auth/generate-payload")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let token = body["token"].as_str().unwrap();

    let claims = jwt::decode_payload_token(token, SECRET).unwrap();
    assert_eq!(claims.payload.len(), 64);
    assert!(hex::decode(&claims.payload).is_ok());
    assert_eq!(claims.exp - claims.iat, 900);
}

#[tokio::test]
async fn check_proof_rejects_a_bogus_proof() {
    // Structurally valid, cryptographically garbage; the state-init fails to
    // parse so the request dies before any chain lookup.
    let body = serde_json::json!({
        "address": "0:f63660ff947e5fe6ed4a8f729f1b24ef859497d0483aaa9d9ae48414297c4e1b",
        "network": "-3",
        "public_key": "88".repeat(32),
        "proof": {
            "timestamp": 1_668_094_767u64,
            "domain": {"lengthBytes": 14, "value": "localhost:3000"},
            "signature": "c2lnbmF0dXJl",
            "payload": "payload",
            "state_init": "dGU2Y2M="
        }
    });

    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/check-proof")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn check_proof_rejects_mismatched_domain_length() {
    let body = serde_json::json!({
        "address": "0:f63660ff947e5fe6ed4a8f729f1b24ef859497d0483aaa9d9ae48414297c4e1b",
        "network": "-3",
        "public_key": "88".repeat(32),
        "proof": {
            "timestamp": 1_668_094_767u64,
            "domain": {"lengthBytes": 3, "value": "localhost:3000"},
            "signature": "c2lnbmF0dXJl",
            "payload": "payload",
            "state_init": "dGU2Y2M="
        }
    });

    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/check-proof")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn account_info_requires_a_token() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/auth/get-account-info")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_info_rejects_a_garbage_token() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/auth/get-account-info")
                .header(header::AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
