//! Middleware for the TonGate API
//!
//! Session token extraction, security headers and request tracing.

pub mod auth;
mod security;
mod tracing;

pub use self::auth::AuthenticatedWallet;
pub use self::security::{hsts_header, security_headers};
pub use self::tracing::request_tracing;
