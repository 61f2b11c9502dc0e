//! Contract StateInit parsing and address derivation
//!
//! A wallet proves control of an address by shipping the StateInit the
//! contract was (or would be) deployed from. The contract address is the
//! representation hash of that very cell, which makes the derivation check a
//! hash comparison.

use super::address::TonAddress;
use super::cell::{ArcCell, Cell, CellError};

/// Parsed `StateInit`: optional code and data cells plus the root they came
/// from. `split_depth`, `special` and `library` fields are skipped, not kept.
#[derive(Debug, Clone)]
pub struct StateInit {
    pub code: Option<ArcCell>,
    pub data: Option<ArcCell>,
    root: ArcCell,
}

impl StateInit {
    /// Parses a StateInit from its root cell.
    ///
    /// Layout: `split_depth:(Maybe (## 5)) special:(Maybe TickTock)
    /// code:(Maybe ^Cell) data:(Maybe ^Cell) library:(Maybe ^Cell)`.
    pub fn parse(root: ArcCell) -> Result<Self, CellError> {
        let mut parser = root.parser();

        if parser.load_bit()? {
            parser.load_uint(5)?;
        }
        if parser.load_bit()? {
            parser.load_uint(2)?;
        }

        let code = if parser.load_bit()? {
            Some(parser.load_ref()?.clone())
        } else {
            None
        };
        let data = if parser.load_bit()? {
            Some(parser.load_ref()?.clone())
        } else {
            None
        };
        if parser.load_bit()? {
            parser.load_ref()?;
        }

        Ok(StateInit { code, data, root })
    }

    /// Parses a StateInit from a base64 Bag-of-Cells.
    pub fn from_boc_base64(encoded: &str) -> Result<Self, CellError> {
        Self::parse(Cell::from_boc_base64(encoded)?)
    }

    /// Hash of the StateInit root cell.
    pub fn root_hash(&self) -> [u8; 32] {
        self.root.hash()
    }

    /// The contract address this StateInit deploys to in `workchain`.
    pub fn derive_address(&self, workchain: i32) -> TonAddress {
        TonAddress::new(workchain, self.root.hash())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ton::cell::{boc_base64, CellBuilder};

    fn build_state_init(code: ArcCell, data: ArcCell) -> ArcCell {
        let mut builder = CellBuilder::new();
        builder
            .store_bit(false)
            .store_bit(false)
            .store_bit(true)
            .store_ref(code)
            .store_bit(true)
            .store_ref(data)
            .store_bit(false);
        Arc::new(builder.build().unwrap())
    }

    #[test]
    fn test_parse_code_and_data() {
        let code = Arc::new(CellBuilder::new().store_uint(0xc0de, 16).build().unwrap());
        let data = Arc::new(CellBuilder::new().store_uint(0xda7a, 16).build().unwrap());
        let root = build_state_init(code.clone(), data.clone());

        let state_init = StateInit::parse(root.clone()).unwrap();
        assert_eq!(state_init.code.as_ref().unwrap().hash(), code.hash());
        assert_eq!(state_init.data.as_ref().unwrap().hash(), data.hash());
        assert_eq!(state_init.root_hash(), root.hash());
    }

    #[test]
    fn test_parse_from_boc_base64() {
        let code = Arc::new(CellBuilder::new().store_uint(1, 8).build().unwrap());
        let data = Arc::new(CellBuilder::new().store_uint(2, 8).build().unwrap());
        let root = build_state_init(code, data);

        let state_init = StateInit::from_boc_base64(&boc_base64(&root)).unwrap();
        assert_eq!(state_init.root_hash(), root.hash());
    }

    #[test]
    fn test_derived_address_uses_root_hash() {
        let code = Arc::new(CellBuilder::new().build().unwrap());
        let data = Arc::new(CellBuilder::new().build().unwrap());
        let root = build_state_init(code, data);

        let state_init = StateInit::parse(root.clone()).unwrap();
        let address = state_init.derive_address(0);
        assert_eq!(address.workchain, 0);
        assert_eq!(address.hash, root.hash());
    }

    #[test]
    fn test_empty_cell_rejected() {
        let root = Arc::new(CellBuilder::new().build().unwrap());
        assert!(StateInit::parse(root).is_err());
    }

    #[test]
    fn test_missing_code_ref_rejected() {
        // Flags promise a code cell that is not attached.
        let mut builder = CellBuilder::new();
        builder
            .store_bit(false)
            .store_bit(false)
            .store_bit(true)
            .store_bit(false)
            .store_bit(false);
        let root = Arc::new(builder.build().unwrap());
        assert!(StateInit::parse(root).is_err());
    }
}
