//! TON Connect authentication for TonGate
//!
//! Wallet-based authentication via the `ton_proof` protocol:
//! - random challenge payloads wrapped in signed, short-lived tokens
//! - proof verification against the wallet's state-init / on-chain key
//! - stateless session tokens for authenticated requests

pub mod crypto;
pub mod jwt;
mod service;

pub use crypto::{proof_message_hash, verify_proof_signature};
pub use jwt::{create_auth_token, create_payload_token, decode_auth_token, verify_token};
pub use service::{ProofError, TonProofService};
