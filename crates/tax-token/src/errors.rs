//! # Error Types
//!
//! Every call either commits all of its effects or returns one of these
//! errors with nothing changed.

use crate::domain::entities::Capability;
use crate::domain::value_objects::{Address, U256};
use thiserror::Error;

// =============================================================================
// TOP-LEVEL TAXONOMY
// =============================================================================

/// Errors returned by ledger operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Caller lacks the capability the operation requires.
    #[error("access denied: account {caller} is missing capability {capability}")]
    AccessDenied {
        /// Account that attempted the call.
        caller: Address,
        /// Capability the call requires.
        capability: Capability,
    },

    /// Input or state validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A blacklisted sender tried to move funds anywhere but the safe harbor.
    #[error("blacklisted account {from} may not transfer to {to}")]
    BlacklistViolation {
        /// Blacklisted sender.
        from: Address,
        /// Rejected destination.
        to: Address,
    },

    /// Permit signature rejected.
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    /// The external withdrawal primitive failed.
    #[error("withdrawal failed: {0}")]
    Withdrawal(#[from] VaultError),
}

// =============================================================================
// VALIDATION ERRORS
// =============================================================================

/// Input and balance validation failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// An address argument was the zero address.
    #[error("zero address is not allowed")]
    ZeroAddress,

    /// Transfer amount must be positive.
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Source balance does not cover the amount.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount requested.
        required: U256,
        /// Balance held.
        available: U256,
    },

    /// Spender allowance does not cover the amount.
    #[error("insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance {
        /// Amount requested.
        required: U256,
        /// Allowance granted.
        available: U256,
    },

    /// Tax rate above the 50% ceiling.
    #[error("tax rate {rate} bps exceeds maximum {max} bps")]
    TaxRateTooHigh {
        /// Requested rate.
        rate: u16,
        /// Allowed ceiling.
        max: u16,
    },

    /// A non-zero tax rate needs somewhere to send the tax.
    #[error("cannot set a non-zero tax rate while the tax recipient list is empty")]
    NoTaxRecipients,

    /// Tax recipient wallet was the zero address.
    #[error("tax recipient at position {index} has the zero address")]
    RecipientZeroAddress {
        /// Position in the submitted list.
        index: usize,
    },

    /// Same wallet listed twice.
    #[error("duplicate tax recipient wallet {0}")]
    DuplicateRecipient(Address),

    /// Recipient share above 100%.
    #[error("tax recipient share {share} bps exceeds {max} bps")]
    ShareOutOfRange {
        /// Offending share.
        share: u16,
        /// Allowed ceiling.
        max: u16,
    },

    /// Shares do not add up to exactly 10000.
    #[error("tax recipient shares total {total} bps, expected 10000")]
    InvalidShareTotal {
        /// Observed total.
        total: u32,
    },

    /// Minting would overflow the total supply.
    #[error("total supply overflow")]
    SupplyOverflow,
}

// =============================================================================
// SIGNATURE ERRORS
// =============================================================================

/// Errors raised while verifying a permit signature.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The permit deadline has passed.
    #[error("permit expired: deadline {deadline}, now {now}")]
    Expired {
        /// Signed deadline (unix seconds).
        deadline: U256,
        /// Current time (unix seconds).
        now: u64,
    },

    /// Recovered signer differs from the owner.
    #[error("invalid signer: expected {expected}, recovered {recovered}")]
    InvalidSigner {
        /// Owner named in the permit.
        expected: Address,
        /// Address recovered from the signature.
        recovered: Address,
    },

    /// The signature format is invalid (zero or out-of-range scalars).
    #[error("invalid signature format")]
    InvalidFormat,

    /// Signature has high S value (EIP-2 malleability protection).
    #[error("malleable signature (high S value)")]
    MalleableSignature,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28).
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// Failed to recover a public key from the signature.
    #[error("failed to recover public key")]
    RecoveryFailed,
}

// =============================================================================
// COLLABORATOR ERRORS
// =============================================================================

/// Error from the external asset-transfer primitive used by `withdraw`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VaultError {
    /// The vault does not hold enough of the asset.
    #[error("insufficient {asset} held: required {required}, available {available}")]
    InsufficientFunds {
        /// Asset address (zero for the native asset).
        asset: Address,
        /// Amount requested.
        required: U256,
        /// Amount held.
        available: U256,
    },

    /// The transfer primitive refused the call.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_names_caller_and_capability() {
        let err = TokenError::AccessDenied {
            caller: Address::from_low_u8(9),
            capability: Capability::BurnControl,
        };
        let text = err.to_string();
        assert!(text.contains("0x0000000000000000000000000000000000000009"));
        assert!(text.contains("BURN_ROLE"));
    }

    #[test]
    fn test_validation_converts_into_token_error() {
        let err: TokenError = ValidationError::ZeroAmount.into();
        assert_eq!(err, TokenError::Validation(ValidationError::ZeroAmount));
    }
}
