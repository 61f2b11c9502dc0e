//! TON Connect authentication HTTP handlers

use std::time::Duration;

use axum::{extract::State, Json};
use validator::Validate;

use crate::auth::jwt;
use crate::error::ApiError;
use crate::middleware::AuthenticatedWallet;
use crate::models::{
    AccountInfoResponse, CheckProofRequest, CheckProofResponse, GeneratePayloadResponse,
};
use crate::state::AppState;
use crate::ton::TonAddress;
use crate::utils::with_retry;

/// Attempts for the post-auth account info fetch.
const ACCOUNT_INFO_ATTEMPTS: u32 = 3;
const ACCOUNT_INFO_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// GET /auth/generate-payload - Issue a fresh challenge wrapped in a signed token
pub async fn generate_payload(
    State(state): State<AppState>,
) -> Result<Json<GeneratePayloadResponse>, ApiError> {
    let payload = state.proof_service.generate_payload();
    let token = jwt::create_payload_token(
        &payload,
        &state.config.jwt_secret,
        state.config.payload_token_ttl_seconds,
    )
    .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::debug!("Issued auth payload token");
    Ok(Json(GeneratePayloadResponse { token }))
}

/// POST /auth/check-proof - Verify a ton_proof and issue a session token
pub async fn check_proof(
    State(state): State<AppState>,
    Json(request): Json<CheckProofRequest>,
) -> Result<Json<CheckProofResponse>, ApiError> {
    request.validate()?;

    let client = state.ton_clients.for_network(request.network);
    let lookup = move |address: TonAddress| {
        let client = client.clone();
        async move { client.get_wallet_public_key(&address).await }
    };

    if let Err(error) = state.proof_service.check_proof(&request, lookup).await {
        if error.is_transient() {
            tracing::error!(address = %request.address, error = %error, "Public key lookup unavailable");
            return Err(ApiError::ServiceUnavailable(
                "Wallet public key lookup failed".to_string(),
            ));
        }
        // Audit log carries the concrete reason; the client response does not.
        tracing::warn!(
            address = %request.address,
            domain = %request.proof.domain.value,
            error = %error,
            "Proof rejected"
        );
        return Err(ApiError::Unauthorized("Invalid proof".to_string()));
    }

    // The signed payload must be a live token this server issued.
    if !jwt::verify_token(&request.proof.payload, &state.config.jwt_secret) {
        tracing::warn!(address = %request.address, "Proof payload token invalid or expired");
        return Err(ApiError::Unauthorized("Invalid token".to_string()));
    }

    let token = jwt::create_auth_token(
        &request.address,
        request.network,
        &state.config.jwt_secret,
        state.config.auth_token_ttl_seconds,
    )
    .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(CheckProofResponse { token }))
}

/// GET /auth/get-account-info - Account snapshot for the authenticated wallet
pub async fn get_account_info(
    State(state): State<AppState>,
    wallet: AuthenticatedWallet,
) -> Result<Json<AccountInfoResponse>, ApiError> {
    let address = TonAddress::parse(&wallet.address)
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

    let client = state.ton_clients.for_network(wallet.network);
    let fetch = || {
        let client = client.clone();
        let address = address.clone();
        async move { client.get_account_info(&address).await }
    };

    let info = with_retry(fetch, ACCOUNT_INFO_ATTEMPTS, ACCOUNT_INFO_RETRY_DELAY)
        .await
        .map_err(|error| {
            tracing::error!(address = %address, error = %error, "Account info fetch failed");
            ApiError::ServiceUnavailable("Account info fetch failed".to_string())
        })?;

    Ok(Json(AccountInfoResponse {
        address: address.to_raw(),
        account: info.account,
    }))
}
