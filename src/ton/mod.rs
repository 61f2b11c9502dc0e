//! TON blockchain primitives
//!
//! Cell/Bag-of-Cells codec, addresses, wallet contract data layouts and the
//! v4 block API client used to resolve wallet public keys and account state.

pub mod address;
pub mod cell;
pub mod client;
pub mod state_init;
pub mod wallets;

pub use address::{AddressError, TonAddress};
pub use cell::{ArcCell, Cell, CellBuilder, CellError};
pub use client::{AccountInfo, TonApiClient, TonClientError, TonClients};
pub use state_init::StateInit;
