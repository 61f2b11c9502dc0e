//! Known wallet contract data layouts
//!
//! Standard TON wallets keep the owner's Ed25519 public key at a fixed
//! offset in their data cell. When a proof's StateInit carries a recognized
//! wallet code cell, the key can be read straight out of it and no chain
//! round-trip is needed. Unknown code falls back to the on-chain
//! `get_public_key` get-method.

use super::cell::{Cell, CellError};
use super::state_init::StateInit;

/// Wallet contract versions with a known data layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletVersion {
    V3R1,
    V3R2,
    V4R2,
    V5R1,
}

/// Published code cell hashes of the recognized wallet versions.
const KNOWN_WALLET_CODES: &[(&str, WalletVersion)] = &[
    (
        "b61041a58a7980b946e8fb9e198e3c904d24799ffa36574ea4251c41a566f581",
        WalletVersion::V3R1,
    ),
    (
        "84dafa449f98a6987789ba232358072bc0f76dc4524002a5d0918b9a75d2d599",
        WalletVersion::V3R2,
    ),
    (
        "feb5ff6820e2ff0d9483e7e0d62c817d846789fb4ae580c878866d959dabd5c0",
        WalletVersion::V4R2,
    ),
    (
        "20834b7b72b112147e1b2fb465fb84e74d1a30f04f737d4f62a668e9552d2b48",
        WalletVersion::V5R1,
    ),
];

/// Extracts the owner public key from a recognized wallet StateInit.
///
/// Returns `None` when the code cell is not a known wallet (or the data cell
/// does not parse), in which case the caller should ask a chain node.
pub fn try_parse_public_key(state_init: &StateInit) -> Option<[u8; 32]> {
    let code = state_init.code.as_ref()?;
    let data = state_init.data.as_ref()?;

    let code_hash = hex::encode(code.hash());
    let version = KNOWN_WALLET_CODES
        .iter()
        .find(|(hash, _)| *hash == code_hash)
        .map(|(_, version)| *version)?;

    match parse_wallet_data(version, data) {
        Ok(key) => Some(key),
        Err(error) => {
            tracing::warn!(?version, %error, "recognized wallet code but data cell did not parse");
            None
        }
    }
}

/// Reads the public key out of a wallet data cell for a known version.
///
/// v3 and v4 store `seqno:u32 wallet_id:u32 key:bits256`; v5 (W5) prefixes a
/// one-bit signature-allowed flag.
pub fn parse_wallet_data(version: WalletVersion, data: &Cell) -> Result<[u8; 32], CellError> {
    let mut parser = data.parser();
    match version {
        WalletVersion::V3R1 | WalletVersion::V3R2 | WalletVersion::V4R2 => {
            parser.load_uint(32)?;
            parser.load_uint(32)?;
        }
        WalletVersion::V5R1 => {
            parser.load_bit()?;
            parser.load_uint(32)?;
            parser.load_uint(32)?;
        }
    }
    let bytes = parser.load_bits(256)?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}
