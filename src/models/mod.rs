//! API data transfer objects for TonGate

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::ton::client::Account;

/// TON network selector, serialized the way TON Connect clients send it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TonNetwork {
    #[serde(rename = "-239")]
    Mainnet,
    #[serde(rename = "-3")]
    Testnet,
}

/// Response for `GET /auth/generate-payload`
#[derive(Debug, Serialize)]
pub struct GeneratePayloadResponse {
    /// Signed, time-boxed token wrapping the random challenge payload.
    pub token: String,
}

/// Request body for `POST /auth/check-proof`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckProofRequest {
    /// Claimed wallet address, raw (`0:hex`) or friendly form.
    #[validate(length(min = 1))]
    pub address: String,
    pub network: TonNetwork,
    /// Claimed wallet public key, hex-encoded.
    #[validate(length(equal = 64))]
    pub public_key: String,
    #[validate]
    pub proof: TonProof,
}

/// The `ton_proof` structure produced by the wallet.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TonProof {
    /// Unix seconds at which the wallet signed the proof.
    pub timestamp: u64,
    #[validate]
    pub domain: TonDomain,
    /// The challenge the wallet signed over (a payload token we issued).
    #[validate(length(min = 1))]
    pub payload: String,
    /// Base64 detached Ed25519 signature.
    #[validate(length(min = 1))]
    pub signature: String,
    /// Base64 Bag-of-Cells with the wallet's StateInit.
    #[validate(length(min = 1))]
    pub state_init: String,
}

/// App domain bound into the signed proof message.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_domain_length"))]
pub struct TonDomain {
    #[serde(rename = "lengthBytes")]
    pub length_bytes: u32,
    pub value: String,
}

fn validate_domain_length(domain: &TonDomain) -> Result<(), ValidationError> {
    if domain.length_bytes as usize != domain.value.len() {
        return Err(ValidationError::new("domain_length_mismatch"));
    }
    Ok(())
}

/// Response for `POST /auth/check-proof`
#[derive(Debug, Serialize)]
pub struct CheckProofResponse {
    /// Session token binding the verified wallet address and network.
    pub token: String,
}

/// Response for `GET /auth/get-account-info`
#[derive(Debug, Serialize)]
pub struct AccountInfoResponse {
    pub address: String,
    pub account: Account,
}
