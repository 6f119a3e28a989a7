//! # Value Objects
//!
//! Immutable primitives shared by every part of the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Re-export U256 from primitive-types for 256-bit ledger arithmetic
pub use primitive_types::{U256, U512};

/// A 32-byte Keccak-256 digest.
pub type Hash = [u8; 32];

/// Basis-point denominator: 10000 = 100%.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Upper bound for either directional tax rate (50%).
pub const MAX_TAX_RATE_BPS: u16 = 5_000;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte Ethereum-style account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (0x0000...0000). Used as mint source, burn sink
    /// and native-asset sentinel.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == 20 {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(slice);
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Builds a test-friendly address whose last byte is `tag`.
    #[must_use]
    pub const fn from_low_u8(tag: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[19] = tag;
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// ABI word encoding: left-padded to 32 bytes.
    #[must_use]
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Failure to parse an address from text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressParseError {
    /// Not valid hexadecimal.
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),

    /// Decoded to the wrong number of bytes.
    #[error("address must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes).ok_or(AddressParseError::InvalidLength(bytes.len()))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; 20] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

// =============================================================================
// ARITHMETIC HELPERS
// =============================================================================

/// Encodes a U256 as a big-endian ABI word.
#[must_use]
pub fn u256_to_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

/// `floor(amount * bps / 10000)` without intermediate overflow.
#[must_use]
pub fn bps_of(amount: U256, bps: u16) -> U256 {
    let bps = bps.min(BPS_DENOMINATOR);
    let scaled = amount.full_mul(U256::from(bps)) / U512::from(BPS_DENOMINATOR);
    // bps <= denominator keeps the quotient <= amount
    U256::try_from(scaled).unwrap_or(amount)
}

// =============================================================================
// ECDSA SIGNATURE
// =============================================================================

/// secp256k1 signature (r, s, v) as produced by Ethereum wallets.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct EcdsaSignature {
    /// r component (32 bytes).
    pub r: [u8; 32],
    /// s component (32 bytes).
    pub s: [u8; 32],
    /// Recovery id (0 or 1, or 27/28 in legacy format).
    pub v: u8,
}

impl EcdsaSignature {
    /// Creates a new signature.
    #[must_use]
    pub const fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Parses the 65-byte `r || s || v` wire form.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Self { r, s, v: bytes[64] }
    }

    /// Serializes to the 65-byte `r || s || v` wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::new([1u8; 20]).is_zero());
    }

    #[test]
    fn test_address_parse_and_display() {
        let text = "0x00000000000000000000000000000000000000ab";
        let addr: Address = text.parse().unwrap();
        assert_eq!(addr, Address::from_low_u8(0xab));
        assert_eq!(addr.to_string(), text);

        let bare: Address = "00000000000000000000000000000000000000ab".parse().unwrap();
        assert_eq!(bare, addr);
    }

    #[test]
    fn test_address_parse_rejects_bad_input() {
        assert!(matches!(
            "0x1234".parse::<Address>(),
            Err(AddressParseError::InvalidLength(2))
        ));
        assert!(matches!(
            "0xzz".parse::<Address>(),
            Err(AddressParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_address_word_is_left_padded() {
        let word = Address::from_low_u8(7).to_word();
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(word[31], 7);
    }

    #[test]
    fn test_bps_of_floors() {
        assert_eq!(bps_of(U256::from(10_000), 1_000), U256::from(1_000));
        assert_eq!(bps_of(U256::from(999), 1_000), U256::from(99));
        assert_eq!(bps_of(U256::from(1), 5_000), U256::zero());
        assert_eq!(bps_of(U256::MAX, 10_000), U256::MAX);
    }

    #[test]
    fn test_signature_wire_form() {
        let sig = EcdsaSignature::new([1u8; 32], [2u8; 32], 27);
        assert_eq!(EcdsaSignature::from_bytes(&sig.to_bytes()), sig);
    }
}
