//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::TonProofService;
use crate::config::Config;
use crate::ton::TonClients;

/// Shared application state
///
/// Everything here is constructed once at startup and injected; handlers
/// never reach for ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub proof_service: Arc<TonProofService>,
    pub ton_clients: TonClients,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        proof_service: Arc<TonProofService>,
        ton_clients: TonClients,
    ) -> Self {
        Self {
            config,
            proof_service,
            ton_clients,
        }
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for Arc<TonProofService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.proof_service.clone()
    }
}

impl FromRef<AppState> for TonClients {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.ton_clients.clone()
    }
}
