//! TON Connect proof verification service
//!
//! Verification runs as an ordered pipeline; the first failing stage
//! short-circuits. Rejections are ordinary values, not exceptions: every
//! variant of [`ProofError`] except the lookup failure means "this proof is
//! bad", and the HTTP layer collapses them into one undifferentiated
//! rejection so callers cannot probe which sub-check failed.

use std::future::Future;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::Rng;
use thiserror::Error;

use super::crypto::{self, CryptoError};
use crate::models::{CheckProofRequest, TonDomain};
use crate::ton::cell::CellError;
use crate::ton::client::TonClientError;
use crate::ton::{wallets, AddressError, StateInit, TonAddress};
use crate::utils::with_retry;

/// Attempts for the on-chain public key lookup.
const LOOKUP_ATTEMPTS: u32 = 3;
/// Fixed delay between lookup attempts.
const LOOKUP_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Why a proof was not accepted
#[derive(Error, Debug)]
pub enum ProofError {
    #[error("malformed state init: {0}")]
    MalformedStateInit(#[from] CellError),

    #[error("malformed address: {0}")]
    MalformedAddress(#[from] AddressError),

    #[error("malformed public key: {0}")]
    MalformedPublicKey(String),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("public key lookup failed: {0}")]
    PublicKeyLookup(#[source] TonClientError),

    #[error("public key does not match the wallet")]
    PublicKeyMismatch,

    #[error("address does not derive from state init")]
    AddressMismatch,

    #[error("domain {0:?} is not allowed")]
    DomainNotAllowed(String),

    #[error("domain length does not match its value")]
    DomainLengthMismatch,

    #[error("proof timestamp is too old")]
    ProofExpired,

    #[error("signature verification failed")]
    SignatureInvalid,
}

impl ProofError {
    /// Whether this is an upstream outage rather than a bad proof.
    ///
    /// Transient failures must surface as service-unavailable, never as an
    /// authentication rejection.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProofError::PublicKeyLookup(_))
    }
}

/// Stateless `ton_proof` verifier.
///
/// Holds only configuration; every [`check_proof`](Self::check_proof) call is
/// independent, so concurrent verifications need no synchronization.
pub struct TonProofService {
    allowed_domains: Vec<String>,
    valid_auth_time_seconds: u64,
}

impl TonProofService {
    pub fn new(allowed_domains: Vec<String>, valid_auth_time_seconds: u64) -> Self {
        Self {
            allowed_domains,
            valid_auth_time_seconds,
        }
    }

    /// Generates a random challenge payload: 32 bytes from a CSPRNG,
    /// hex-encoded.
    pub fn generate_payload(&self) -> String {
        let bytes: [u8; 32] = rand::thread_rng().gen();
        hex::encode(bytes)
    }

    /// Validates a TON Connect proof.
    ///
    /// `get_wallet_public_key` is only invoked when the key cannot be read
    /// out of the state-init; it is retried with a fixed backoff before the
    /// attempt is given up as transient.
    pub async fn check_proof<F, Fut>(
        &self,
        request: &CheckProofRequest,
        get_wallet_public_key: F,
    ) -> Result<(), ProofError>
    where
        F: Fn(TonAddress) -> Fut,
        Fut: Future<Output = Result<[u8; 32], TonClientError>>,
    {
        let state_init = StateInit::from_boc_base64(&request.proof.state_init)?;
        let address = TonAddress::parse(&request.address)?;

        let public_key = match wallets::try_parse_public_key(&state_init) {
            Some(key) => key,
            None => with_retry(
                || get_wallet_public_key(address.clone()),
                LOOKUP_ATTEMPTS,
                LOOKUP_RETRY_DELAY,
            )
            .await
            .map_err(ProofError::PublicKeyLookup)?,
        };

        let claimed_key = decode_public_key(&request.public_key)?;
        if public_key != claimed_key {
            return Err(ProofError::PublicKeyMismatch);
        }

        if state_init.derive_address(address.workchain) != address {
            return Err(ProofError::AddressMismatch);
        }

        self.verify_domain(&request.proof.domain)?;
        self.verify_timestamp(request.proof.timestamp)?;

        let message_hash = crypto::proof_message_hash(
            &address,
            &request.proof.domain,
            request.proof.timestamp,
            &request.proof.payload,
        );
        let signature = BASE64
            .decode(&request.proof.signature)
            .map_err(|e| ProofError::MalformedSignature(e.to_string()))?;

        crypto::verify_proof_signature(&public_key, &message_hash, &signature).map_err(
            |error| match error {
                CryptoError::VerificationFailed => ProofError::SignatureInvalid,
                CryptoError::InvalidPublicKey(message) => ProofError::MalformedPublicKey(message),
                CryptoError::InvalidSignatureFormat(message) => {
                    ProofError::MalformedSignature(message)
                }
            },
        )
    }

    fn verify_domain(&self, domain: &TonDomain) -> Result<(), ProofError> {
        if domain.length_bytes as usize != domain.value.len() {
            return Err(ProofError::DomainLengthMismatch);
        }
        if !self.allowed_domains.iter().any(|d| d == &domain.value) {
            return Err(ProofError::DomainNotAllowed(domain.value.clone()));
        }
        Ok(())
    }

    /// Lower bound only: proofs older than the window are rejected, while
    /// future-dated timestamps pass (tolerates client clocks running ahead).
    fn verify_timestamp(&self, timestamp: u64) -> Result<(), ProofError> {
        let now = chrono::Utc::now().timestamp() as u64;
        if timestamp + self.valid_auth_time_seconds < now {
            return Err(ProofError::ProofExpired);
        }
        Ok(())
    }
}

fn decode_public_key(hex_key: &str) -> Result<[u8; 32], ProofError> {
    let bytes =
        hex::decode(hex_key).map_err(|e| ProofError::MalformedPublicKey(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| ProofError::MalformedPublicKey("expected 32 bytes".to_string()))
}
