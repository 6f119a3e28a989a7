//! # Domain Entities
//!
//! Recipients, capabilities and the records produced by a settled transfer.

use super::value_objects::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::fmt;

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Administrative capabilities checked before gated operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    /// Manages capabilities, exchange pools, the recipient list and withdrawals.
    Admin,
    /// Adds and removes blacklist entries.
    BlacklistControl,
    /// Sets tax exemptions and tax rates.
    TaxControl,
    /// Burns tokens from the caller's own balance.
    BurnControl,
}

impl Capability {
    /// All capabilities, granted to the initial admin.
    pub const ALL: [Capability; 4] = [
        Capability::Admin,
        Capability::BlacklistControl,
        Capability::TaxControl,
        Capability::BurnControl,
    ];

    /// Canonical role name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Capability::Admin => "DEFAULT_ADMIN_ROLE",
            Capability::BlacklistControl => "BLACKLIST_ROLE",
            Capability::TaxControl => "TAX_ROLE",
            Capability::BurnControl => "BURN_ROLE",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TAX RECIPIENTS
// =============================================================================

/// One entry of the ordered tax-recipient list.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRecipient {
    /// Wallet credited with this recipient's portion.
    #[serde_as(as = "DisplayFromStr")]
    pub wallet: Address,
    /// Informational label, not required to be unique.
    pub label: String,
    /// Portion of every collected tax, in basis points.
    pub share: u16,
}

impl TaxRecipient {
    /// Creates a recipient entry.
    pub fn new(wallet: Address, label: impl Into<String>, share: u16) -> Self {
        Self {
            wallet,
            label: label.into(),
            share,
        }
    }
}

// =============================================================================
// TRANSFER CLASSIFICATION
// =============================================================================

/// How a transfer was classified by the tax engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxClass {
    /// Blacklisted sender moving funds to the safe harbor.
    SafeHarbor,
    /// Sender or receiver is tax-exempt.
    Exempt,
    /// Neither side is an exchange pool.
    PeerToPeer,
    /// Both sides are exchange pools.
    PoolToPool,
    /// Tokens leave a pool.
    Buy,
    /// Tokens enter a pool.
    Sell,
}

impl TaxClass {
    /// Only buys and sells are taxed.
    #[must_use]
    pub const fn is_taxable(&self) -> bool {
        matches!(self, TaxClass::Buy | TaxClass::Sell)
    }
}

/// Phases of a transfer as it moves through the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferPhase {
    /// Request received, nothing checked yet.
    Pending,
    /// Addresses, amount, balance and tax classification accepted.
    Validated,
    /// All balance changes committed and notifications emitted.
    Settled,
    /// Rejected with no state change.
    Aborted,
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferPhase::Pending => "pending",
            TransferPhase::Validated => "validated",
            TransferPhase::Settled => "settled",
            TransferPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Amount credited to one tax recipient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Recipient wallet.
    pub wallet: Address,
    /// Tokens credited.
    pub amount: U256,
}

/// Receipt returned by a settled transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Sender.
    pub from: Address,
    /// Receiver.
    pub to: Address,
    /// Gross amount debited from the sender.
    pub amount: U256,
    /// Classification that decided the tax.
    pub class: TaxClass,
    /// Tax withheld and paid to recipients.
    pub tax: U256,
    /// Amount credited to the receiver.
    pub net_amount: U256,
    /// Per-recipient tax payouts, in list order.
    pub payouts: Vec<Payout>,
}
