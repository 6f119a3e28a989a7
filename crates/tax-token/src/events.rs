//! # Event Schema
//!
//! Notifications published to downstream observers. A call publishes its
//! events only after it has committed; an aborted call publishes nothing.

use crate::domain::entities::{Capability, TaxRecipient};
use crate::domain::value_objects::{Address, U256};
use serde::{Deserialize, Serialize};

/// A notification emitted by a committed ledger call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TokenEvent {
    /// Balance moved. `from` is zero for mints, `to` is zero for burns.
    Transfer {
        /// Debited account.
        from: Address,
        /// Credited account.
        to: Address,
        /// Amount moved.
        value: U256,
    },

    /// Allowance overwritten or consumed.
    Approval {
        /// Token owner.
        owner: Address,
        /// Approved spender.
        spender: Address,
        /// New allowance.
        value: U256,
    },

    /// Blacklist flag written.
    BlacklistUpdated {
        /// Affected account.
        account: Address,
        /// New flag.
        blacklisted: bool,
    },

    /// Tax-exemption flag written.
    TaxExemptionUpdated {
        /// Affected account.
        account: Address,
        /// New flag.
        exempt: bool,
    },

    /// Buy tax rate changed.
    BuyTaxRateUpdated {
        /// Previous rate (bps).
        old_rate: u16,
        /// New rate (bps).
        new_rate: u16,
    },

    /// Sell tax rate changed.
    SellTaxRateUpdated {
        /// Previous rate (bps).
        old_rate: u16,
        /// New rate (bps).
        new_rate: u16,
    },

    /// Tax recipient list replaced.
    TaxRecipientsUpdated {
        /// The full new list, in order.
        recipients: Vec<TaxRecipient>,
    },

    /// Exchange pool registered.
    ExchangePoolAdded {
        /// Pool address.
        pool: Address,
    },

    /// Exchange pool unregistered.
    ExchangePoolRemoved {
        /// Pool address.
        pool: Address,
    },

    /// Capability granted to an account.
    CapabilityGranted {
        /// Capability granted.
        capability: Capability,
        /// Receiving account.
        account: Address,
        /// Admin that granted it.
        sender: Address,
    },

    /// Capability revoked from an account.
    CapabilityRevoked {
        /// Capability revoked.
        capability: Capability,
        /// Affected account.
        account: Address,
        /// Admin that revoked it.
        sender: Address,
    },

    /// Asset withdrawn from the token contract.
    AssetWithdrawn {
        /// Asset address (zero for the native asset).
        asset: Address,
        /// Receiving account.
        to: Address,
        /// Amount withdrawn.
        amount: U256,
    },
}

impl TokenEvent {
    /// Event name as published to subscribers.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            TokenEvent::Transfer { .. } => "Transfer",
            TokenEvent::Approval { .. } => "Approval",
            TokenEvent::BlacklistUpdated { .. } => "BlacklistUpdated",
            TokenEvent::TaxExemptionUpdated { .. } => "TaxExemptionUpdated",
            TokenEvent::BuyTaxRateUpdated { .. } => "BuyTaxRateUpdated",
            TokenEvent::SellTaxRateUpdated { .. } => "SellTaxRateUpdated",
            TokenEvent::TaxRecipientsUpdated { .. } => "TaxRecipientsUpdated",
            TokenEvent::ExchangePoolAdded { .. } => "ExchangePoolAdded",
            TokenEvent::ExchangePoolRemoved { .. } => "ExchangePoolRemoved",
            TokenEvent::CapabilityGranted { .. } => "CapabilityGranted",
            TokenEvent::CapabilityRevoked { .. } => "CapabilityRevoked",
            TokenEvent::AssetWithdrawn { .. } => "AssetWithdrawn",
        }
    }
}
