//! ton_proof message construction and signature verification
//!
//! The byte layout, endianness and separators below are mandated by the
//! TON Connect wire protocol; wallets sign exactly this message, so any
//! deviation breaks verification against real wallets.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::TonDomain;
use crate::ton::TonAddress;

/// Prefix of the inner proof message.
pub const TON_PROOF_PREFIX: &str = "ton-proof-item-v2/";
/// Prefix of the outer envelope, after the 0xffff separator.
pub const TON_CONNECT_PREFIX: &str = "ton-connect";

/// Errors that can occur during signature verification
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Signature verification failed")]
    VerificationFailed,
}

/// Computes the hash a wallet signs for a `ton_proof`.
///
/// Inner message:
/// `"ton-proof-item-v2/" || workchain (u32 BE) || address hash (32 bytes) ||
///  domain length (u32 LE) || domain || timestamp (u64 LE) || payload`
///
/// The result is `sha256(0xffff || "ton-connect" || sha256(inner))`.
pub fn proof_message_hash(
    address: &TonAddress,
    domain: &TonDomain,
    timestamp: u64,
    payload: &str,
) -> [u8; 32] {
    let mut message = Vec::with_capacity(
        TON_PROOF_PREFIX.len() + 44 + domain.value.len() + 8 + payload.len(),
    );
    message.extend_from_slice(TON_PROOF_PREFIX.as_bytes());
    message.extend_from_slice(&(address.workchain as u32).to_be_bytes());
    message.extend_from_slice(&address.hash);
    message.extend_from_slice(&domain.length_bytes.to_le_bytes());
    message.extend_from_slice(domain.value.as_bytes());
    message.extend_from_slice(&timestamp.to_le_bytes());
    message.extend_from_slice(payload.as_bytes());

    let inner_hash = Sha256::digest(&message);

    let mut envelope = Vec::with_capacity(2 + TON_CONNECT_PREFIX.len() + 32);
    envelope.extend_from_slice(&[0xff, 0xff]);
    envelope.extend_from_slice(TON_CONNECT_PREFIX.as_bytes());
    envelope.extend_from_slice(&inner_hash);

    Sha256::digest(&envelope).into()
}

/// Verifies a detached Ed25519 signature over a proof message hash.
pub fn verify_proof_signature(
    public_key: &[u8; 32],
    message_hash: &[u8; 32],
    signature: &[u8],
) -> Result<(), CryptoError> {
    let signature = Signature::from_slice(signature)
        .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;
    let verifying_key = VerifyingKey::from_bytes(public_key)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;

    verifying_key
        .verify(message_hash, &signature)
        .map_err(|_| CryptoError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};

    use super::*;

    fn test_domain() -> TonDomain {
        TonDomain {
            length_bytes: 14,
            value: "localhost:3000".to_string(),
        }
    }

    #[test]
    fn test_message_layout() {
        let address = TonAddress::new(0, [0x11; 32]);
        let domain = test_domain();
        let timestamp: u64 = 1_668_094_767;
        let payload = "abc123";

        // Assemble the wire message field by field and hash it the same way.
        let mut expected = Vec::new();
        expected.extend_from_slice(b"ton-proof-item-v2/");
        expected.extend_from_slice(&0u32.to_be_bytes());
        expected.extend_from_slice(&[0x11; 32]);
        expected.extend_from_slice(&14u32.to_le_bytes());
        expected.extend_from_slice(b"localhost:3000");
        expected.extend_from_slice(&timestamp.to_le_bytes());
        expected.extend_from_slice(b"abc123");

        let inner = Sha256::digest(&expected);
        let mut envelope = vec![0xff, 0xff];
        envelope.extend_from_slice(b"ton-connect");
        envelope.extend_from_slice(&inner);
        let expected_hash: [u8; 32] = Sha256::digest(&envelope).into();

        assert_eq!(
            proof_message_hash(&address, &domain, timestamp, payload),
            expected_hash
        );
    }

    #[test]
    fn test_masterchain_workchain_encoding() {
        let address = TonAddress::new(-1, [0x22; 32]);
        let a = proof_message_hash(&address, &test_domain(), 1, "p");
        let b = proof_message_hash(&TonAddress::new(0, [0x22; 32]), &test_domain(), 1, "p");
        assert_ne!(a, b);
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let public_key = signing_key.verifying_key().to_bytes();

        let address = TonAddress::new(0, [0x33; 32]);
        let hash = proof_message_hash(&address, &test_domain(), 1_700_000_000, "payload");
        let signature = signing_key.sign(&hash);

        assert!(verify_proof_signature(&public_key, &hash, &signature.to_bytes()).is_ok());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let other_key = SigningKey::from_bytes(&[8u8; 32]).verifying_key().to_bytes();

        let address = TonAddress::new(0, [0x33; 32]);
        let hash = proof_message_hash(&address, &test_domain(), 1_700_000_000, "payload");
        let signature = signing_key.sign(&hash);

        assert!(matches!(
            verify_proof_signature(&other_key, &hash, &signature.to_bytes()),
            Err(CryptoError::VerificationFailed)
        ));
    }

    #[test]
    fn test_malformed_signature_rejected() {
        let public_key = SigningKey::from_bytes(&[7u8; 32]).verifying_key().to_bytes();
        let hash = [0u8; 32];
        assert!(matches!(
            verify_proof_signature(&public_key, &hash, &[0u8; 10]),
            Err(CryptoError::InvalidSignatureFormat(_))
        ));
    }
}
