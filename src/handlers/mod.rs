//! API handlers for the TonGate backend

pub mod auth;

pub use auth::*;

// Re-export the session extractor from middleware for handler use
pub use crate::middleware::auth::AuthenticatedWallet;
