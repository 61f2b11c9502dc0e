//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::auth;
use crate::state::AppState;

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/generate-payload", get(auth::generate_payload))
        .route("/auth/check-proof", post(auth::check_proof))
        .route("/auth/get-account-info", get(auth::get_account_info))
}
