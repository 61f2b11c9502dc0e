//! TON v4 block API client
//!
//! Thin reqwest client over the block-oriented v4 HTTP API
//! (`mainnet-v4.tonhubapi.com` / `testnet-v4.tonhubapi.com`). Used to run
//! the `get_public_key` get-method against deployed wallets and to fetch
//! account state after authentication.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::address::TonAddress;
use crate::models::TonNetwork;

/// Errors from the v4 block API
#[derive(Error, Debug)]
pub enum TonClientError {
    #[error("ton api request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ton api returned unexpected data: {0}")]
    UnexpectedResponse(String),

    #[error("get method exited with code {0}")]
    MethodFailed(i32),
}

#[derive(Debug, Deserialize)]
struct LastBlockResponse {
    last: BlockRef,
}

#[derive(Debug, Deserialize)]
struct BlockRef {
    seqno: u32,
}

#[derive(Debug, Deserialize)]
struct RunMethodResponse {
    #[serde(rename = "exitCode")]
    exit_code: i32,
    #[serde(default)]
    result: Vec<StackEntry>,
}

#[derive(Debug, Deserialize)]
struct StackEntry {
    #[serde(rename = "type")]
    kind: String,
    value: Option<String>,
}

/// Account snapshot as reported by the v4 API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account: Account,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub balance: AccountBalance,
    pub state: AccountState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    pub coins: String,
    #[serde(default)]
    pub currencies: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountState {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Client of one v4 block API endpoint.
#[derive(Debug, Clone)]
pub struct TonApiClient {
    endpoint: String,
    http: reqwest::Client,
}

impl TonApiClient {
    pub fn new(endpoint: impl Into<String>, http: reqwest::Client) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self { endpoint, http }
    }

    /// Sequence number of the latest masterchain block.
    pub async fn get_last_block_seqno(&self) -> Result<u32, TonClientError> {
        let response: LastBlockResponse =
            self.get_json(&format!("{}/block/latest", self.endpoint)).await?;
        Ok(response.last.seqno)
    }

    /// Runs the `get_public_key` get-method against a deployed wallet.
    pub async fn get_wallet_public_key(
        &self,
        address: &TonAddress,
    ) -> Result<[u8; 32], TonClientError> {
        let seqno = self.get_last_block_seqno().await?;
        let url = format!(
            "{}/block/{}/{}/run/get_public_key",
            self.endpoint,
            seqno,
            address.to_friendly(true, false)
        );
        let response: RunMethodResponse = self.get_json(&url).await?;

        if response.exit_code != 0 {
            return Err(TonClientError::MethodFailed(response.exit_code));
        }
        let entry = response.result.first().ok_or_else(|| {
            TonClientError::UnexpectedResponse("empty get_public_key stack".to_string())
        })?;
        if entry.kind != "int" {
            return Err(TonClientError::UnexpectedResponse(format!(
                "expected int stack entry, got {}",
                entry.kind
            )));
        }
        let value = entry.value.as_deref().ok_or_else(|| {
            TonClientError::UnexpectedResponse("int stack entry without value".to_string())
        })?;
        parse_stack_int(value)
    }

    /// Account balance and contract state at the latest block.
    pub async fn get_account_info(
        &self,
        address: &TonAddress,
    ) -> Result<AccountInfo, TonClientError> {
        let seqno = self.get_last_block_seqno().await?;
        let url = format!(
            "{}/block/{}/{}",
            self.endpoint,
            seqno,
            address.to_friendly(true, false)
        );
        self.get_json(&url).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, TonClientError> {
        Ok(self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

/// One client per supported network, built once at startup and injected.
#[derive(Debug, Clone)]
pub struct TonClients {
    mainnet: Arc<TonApiClient>,
    testnet: Arc<TonApiClient>,
}

impl TonClients {
    pub fn new(mainnet: TonApiClient, testnet: TonApiClient) -> Self {
        Self {
            mainnet: Arc::new(mainnet),
            testnet: Arc::new(testnet),
        }
    }

    pub fn for_network(&self, network: TonNetwork) -> Arc<TonApiClient> {
        match network {
            TonNetwork::Mainnet => self.mainnet.clone(),
            TonNetwork::Testnet => self.testnet.clone(),
        }
    }
}

/// Decodes a get-method integer (hex, possibly shorter than 32 bytes) into a
/// left-padded 32-byte key.
fn parse_stack_int(raw: &str) -> Result<[u8; 32], TonClientError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.len() > 64 || digits.is_empty() {
        return Err(TonClientError::UnexpectedResponse(format!(
            "integer out of range: {}",
            raw
        )));
    }
    let padded = format!("{:0>64}", digits);
    let bytes = hex::decode(&padded).map_err(|e| {
        TonClientError::UnexpectedResponse(format!("integer is not hex: {}", e))
    })?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}
