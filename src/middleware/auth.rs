//! Session token middleware
//!
//! Extracts and verifies the Bearer session token issued after proof
//! verification.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;

use crate::auth::jwt::{decode_auth_token, JwtError};
use crate::config::Config;
use crate::models::TonNetwork;

/// Wallet identity carried by a verified session token
#[derive(Debug, Clone)]
pub struct AuthenticatedWallet {
    pub address: String,
    pub network: TonNetwork,
}

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct AuthRejection {
    error: AuthRejectionDetails,
}

#[derive(Debug, Serialize)]
struct AuthRejectionDetails {
    code: String,
    message: String,
}

impl AuthRejection {
    fn new(code: &str, message: &str) -> Self {
        Self {
            error: AuthRejectionDetails {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// Extractor for requests authenticated with a session token
///
/// An expired or invalid token is rejected the same way as a missing one:
/// the caller simply has no credential.
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedWallet
where
    Arc<Config>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthRejection::new(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                    .into_response()
                })?;

        let config = Arc::<Config>::from_ref(state);

        let claims = decode_auth_token(bearer.token(), &config.jwt_secret).map_err(|e| {
            let (code, message) = match e {
                JwtError::TokenExpired => ("TOKEN_EXPIRED", "Token has expired"),
                _ => ("INVALID_TOKEN", "Invalid token"),
            };
            AuthRejection::new(code, message).into_response()
        })?;

        Ok(AuthenticatedWallet {
            address: claims.address,
            network: claims.network,
        })
    }
}
