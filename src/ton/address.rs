//! TON account addresses
//!
//! Addresses come in a raw form (`0:hex`) and a friendly form (36 bytes of
//! tag/workchain/hash/CRC16, base64-encoded). TON Connect clients may submit
//! either; the v4 block API wants the friendly form in URLs.

use std::fmt;

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use thiserror::Error;

/// Tag byte of a bounceable friendly address.
const TAG_BOUNCEABLE: u8 = 0x11;
/// Tag byte of a non-bounceable friendly address.
const TAG_NON_BOUNCEABLE: u8 = 0x51;
/// Testnet-only flag on the tag byte.
const FLAG_TEST_ONLY: u8 = 0x80;

/// Errors that can occur while parsing an address
#[derive(Error, Debug)]
pub enum AddressError {
    #[error("invalid address format: {0}")]
    InvalidFormat(String),

    #[error("invalid address checksum")]
    InvalidChecksum,
}

/// A parsed TON account address: workchain plus a 32-byte account hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TonAddress {
    pub workchain: i32,
    pub hash: [u8; 32],
}

impl TonAddress {
    pub fn new(workchain: i32, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Parses either the raw (`0:hex`) or the friendly (base64) form.
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        if address.contains(':') {
            Self::parse_raw(address)
        } else {
            Self::parse_friendly(address)
        }
    }

    fn parse_raw(address: &str) -> Result<Self, AddressError> {
        let (workchain, hash_hex) = address
            .split_once(':')
            .ok_or_else(|| AddressError::InvalidFormat("missing ':' separator".to_string()))?;

        let workchain: i32 = workchain
            .parse()
            .map_err(|_| AddressError::InvalidFormat("bad workchain number".to_string()))?;

        let bytes = hex::decode(hash_hex)
            .map_err(|_| AddressError::InvalidFormat("account hash is not hex".to_string()))?;
        let hash: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AddressError::InvalidFormat("account hash must be 32 bytes".to_string()))?;

        Ok(Self { workchain, hash })
    }

    /// Friendly addresses are 36 bytes base64-encoded: one tag byte, one
    /// workchain byte, the 32-byte hash and a CRC16-XModem checksum.
    fn parse_friendly(address: &str) -> Result<Self, AddressError> {
        let engine = if address.contains('-') || address.contains('_') {
            &URL_SAFE_NO_PAD
        } else {
            &STANDARD_NO_PAD
        };
        let bytes = engine
            .decode(address.trim_end_matches('='))
            .map_err(|_| AddressError::InvalidFormat("invalid base64 encoding".to_string()))?;

        if bytes.len() != 36 {
            return Err(AddressError::InvalidFormat(format!(
                "expected 36 bytes, got {}",
                bytes.len()
            )));
        }

        let tag = bytes[0] & !FLAG_TEST_ONLY;
        if tag != TAG_BOUNCEABLE && tag != TAG_NON_BOUNCEABLE {
            return Err(AddressError::InvalidFormat(format!(
                "unknown address tag {:#04x}",
                bytes[0]
            )));
        }

        let checksum = crc16_xmodem(&bytes[..34]);
        if bytes[34..36] != checksum.to_be_bytes() {
            return Err(AddressError::InvalidChecksum);
        }

        let workchain = bytes[1] as i8 as i32;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);

        Ok(Self { workchain, hash })
    }

    /// Raw `workchain:hex` rendering.
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }

    /// URL-safe friendly rendering, as expected by the v4 block API.
    pub fn to_friendly(&self, bounceable: bool, test_only: bool) -> String {
        let mut bytes = [0u8; 36];
        bytes[0] = if bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if test_only {
            bytes[0] |= FLAG_TEST_ONLY;
        }
        bytes[1] = self.workchain as i8 as u8;
        bytes[2..34].copy_from_slice(&self.hash);
        let checksum = crc16_xmodem(&bytes[..34]);
        bytes[34..36].copy_from_slice(&checksum.to_be_bytes());
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

impl fmt::Display for TonAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_raw())
    }
}

/// CRC16-XModem, the checksum friendly addresses carry (big-endian).
fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = crc << 1 ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TonAddress {
        TonAddress::new(0, [0xa7; 32])
    }

    #[test]
    fn test_raw_round_trip() {
        let address = sample();
        let parsed = TonAddress::parse(&address.to_raw()).unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_friendly_round_trip() {
        let address = sample();
        let friendly = address.to_friendly(true, false);
        assert_eq!(friendly.len(), 48);
        assert_eq!(TonAddress::parse(&friendly).unwrap(), address);

        let non_bounceable = address.to_friendly(false, true);
        assert_eq!(TonAddress::parse(&non_bounceable).unwrap(), address);
    }

    #[test]
    fn test_friendly_standard_alphabet_accepted() {
        let address = sample();
        let std_form = address
            .to_friendly(true, false)
            .replace('-', "+")
            .replace('_', "/");
        assert_eq!(TonAddress::parse(&std_form).unwrap(), address);
    }

    #[test]
    fn test_masterchain_round_trip() {
        let address = TonAddress::new(-1, [0x3c; 32]);
        assert!(address.to_raw().starts_with("-1:"));
        assert_eq!(TonAddress::parse(&address.to_raw()).unwrap(), address);
        assert_eq!(
            TonAddress::parse(&address.to_friendly(true, false)).unwrap(),
            address
        );
    }

    #[test]
    fn test_corrupted_checksum_rejected() {
        let friendly = sample().to_friendly(true, false);
        let mut bytes = URL_SAFE_NO_PAD.decode(&friendly).unwrap();
        bytes[35] ^= 0x01;
        let corrupted = URL_SAFE_NO_PAD.encode(&bytes);
        assert!(matches!(
            TonAddress::parse(&corrupted),
            Err(AddressError::InvalidChecksum)
        ));
    }

    #[test]
    fn test_invalid_formats_rejected() {
        assert!(TonAddress::parse("0:zz").is_err());
        assert!(TonAddress::parse("0:abcd").is_err());
        assert!(TonAddress::parse("w:0000000000000000000000000000000000000000000000000000000000000000").is_err());
        assert!(TonAddress::parse("short").is_err());
    }
}
