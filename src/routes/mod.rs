//! Route definitions for the TonGate API

mod auth;

pub use auth::auth_routes;
