//! Configuration management for TonGate
//!
//! Loads and validates configuration from environment variables, with
//! support for different environments (development, staging, production).

use std::env;

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get the environment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Server port
    pub port: u16,

    /// Frontend origin; its normalized form seeds the proof domain allow-list
    pub frontend_url: String,

    /// Domains a proof may be bound to
    pub allowed_domains: Vec<String>,

    /// JWT secret for token signing
    pub jwt_secret: String,

    /// Challenge payload token TTL in seconds (default: 900 = 15 minutes)
    pub payload_token_ttl_seconds: i64,

    /// Session token TTL in seconds (default: 86400 = 1 day)
    pub auth_token_ttl_seconds: i64,

    /// Accepted proof timestamp age in seconds (default: 900 = 15 minutes)
    pub valid_auth_time_seconds: u64,

    /// TON v4 API endpoint for mainnet
    pub ton_mainnet_endpoint: String,

    /// TON v4 API endpoint for testnet
    pub ton_testnet_endpoint: String,

    /// CORS allowed origins (comma-separated); permissive when unset
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::from_str(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3333".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let mut allowed_domains = vec![normalize_origin(&frontend_url)];
        if let Ok(extra) = env::var("ALLOWED_DOMAINS") {
            for domain in extra.split(',') {
                let domain = normalize_origin(domain);
                if !domain.is_empty() && !allowed_domains.contains(&domain) {
                    allowed_domains.push(domain);
                }
            }
        }

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "development-secret-change-in-production".to_string());

        let payload_token_ttl_seconds = env::var("PAYLOAD_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "900".to_string())
            .parse::<i64>()
            .unwrap_or(900);

        let auth_token_ttl_seconds = env::var("AUTH_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse::<i64>()
            .unwrap_or(86400);

        let valid_auth_time_seconds = env::var("VALID_AUTH_TIME_SECONDS")
            .unwrap_or_else(|_| "900".to_string())
            .parse::<u64>()
            .unwrap_or(900);

        let ton_mainnet_endpoint = env::var("TON_MAINNET_ENDPOINT")
            .unwrap_or_else(|_| "https://mainnet-v4.tonhubapi.com".to_string());

        let ton_testnet_endpoint = env::var("TON_TESTNET_ENDPOINT")
            .unwrap_or_else(|_| "https://testnet-v4.tonhubapi.com".to_string());

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            environment,
            port,
            frontend_url,
            allowed_domains,
            jwt_secret,
            payload_token_ttl_seconds,
            auth_token_ttl_seconds,
            valid_auth_time_seconds,
            ton_mainnet_endpoint,
            ton_testnet_endpoint,
            cors_allowed_origins,
            log_level,
        })
    }
}

/// Strips the scheme and any trailing slash so an origin URL matches the
/// domain value wallets put into proofs.
pub fn normalize_origin(origin: &str) -> String {
    origin
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_str() {
        assert_eq!(
            Environment::from_str("dev").unwrap(),
            Environment::Development
        );
        assert_eq!(
            Environment::from_str("staging").unwrap(),
            Environment::Staging
        );
        assert_eq!(
            Environment::from_str("production").unwrap(),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str("PROD").unwrap(),
            Environment::Production
        );
        assert!(Environment::from_str("invalid").is_err());
    }

    #[test]
    fn test_environment_is_production() {
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_normalize_origin() {
        assert_eq!(normalize_origin("http://localhost:3000"), "localhost:3000");
        assert_eq!(normalize_origin("http://localhost:3000/"), "localhost:3000");
        assert_eq!(
            normalize_origin("https://app.example.com/"),
            "app.example.com"
        );
        assert_eq!(normalize_origin(" app.example.com "), "app.example.com");
    }
}
