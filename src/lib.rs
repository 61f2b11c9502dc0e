//! TonGate Backend Library
//!
//! Stateless TON Connect authentication backend: challenge payload issuance,
//! `ton_proof` verification and signed session tokens.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod ton;
pub mod utils;
