//! Payload and session token codecs
//!
//! Both token kinds are HS256 JWTs signed with the server secret and carry
//! their own expiry, so no server-side session storage is needed. Payload
//! tokens wrap the random challenge a wallet must sign over; session tokens
//! bind the verified wallet address and network.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::TonNetwork;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,
}

/// Claims of a challenge payload token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PayloadClaims {
    /// Hex-encoded random challenge.
    pub payload: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Claims of a session token issued after proof verification
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthClaims {
    /// Verified wallet address.
    pub address: String,
    /// Network the proof was checked against.
    pub network: TonNetwork,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Wraps a freshly generated challenge payload into a signed token.
pub fn create_payload_token(
    payload: &str,
    secret: &str,
    ttl_seconds: i64,
) -> Result<String, JwtError> {
    let now = Utc::now();
    let claims = PayloadClaims {
        payload: payload.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
    };
    sign(&claims, secret)
}

/// Mints a session token for a wallet that passed proof verification.
pub fn create_auth_token(
    address: &str,
    network: TonNetwork,
    secret: &str,
    ttl_seconds: i64,
) -> Result<String, JwtError> {
    let now = Utc::now();
    let claims = AuthClaims {
        address: address.to_string(),
        network,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
    };
    sign(&claims, secret)
}

/// Checks signature and expiry of any token we issued.
///
/// Failure is an expected business outcome (reject the request), so this
/// collapses every decoding problem to `false` rather than erroring.
pub fn verify_token(token: &str, secret: &str) -> bool {
    decode::<serde_json::Value>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .is_ok()
}

/// Extracts payload-token claims after validating signature and expiry.
pub fn decode_payload_token(token: &str, secret: &str) -> Result<PayloadClaims, JwtError> {
    decode_claims(token, secret)
}

/// Extracts session-token claims after validating signature and expiry.
pub fn decode_auth_token(token: &str, secret: &str) -> Result<AuthClaims, JwtError> {
    decode_claims(token, secret)
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::EncodingFailed(e.to_string()))
}

fn decode_claims<T: serde::de::DeserializeOwned>(
    token: &str,
    secret: &str,
) -> Result<T, JwtError> {
    decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::DecodingFailed(e.to_string()),
    })
}
