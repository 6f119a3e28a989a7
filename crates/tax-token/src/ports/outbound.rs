//! # Outbound Ports (Driven Ports / SPI)
//!
//! Collaborators the ledger depends on but does not own.

use crate::domain::entities::Capability;
use crate::domain::value_objects::{Address, U256};
use crate::errors::VaultError;
use crate::events::TokenEvent;

/// Capability registry consulted before every gated operation.
///
/// The service only calls `grant`/`revoke` after confirming the caller holds
/// [`Capability::Admin`].
pub trait AccessControl {
    /// Whether `account` holds `capability`.
    fn has_capability(&self, account: &Address, capability: Capability) -> bool;

    /// Grants `capability` to `account`. Returns true if it was not held.
    fn grant(&mut self, capability: Capability, account: Address) -> bool;

    /// Revokes `capability` from `account`. Returns true if it was held.
    fn revoke(&mut self, capability: Capability, account: Address) -> bool;
}

/// Downstream observer of committed notifications.
pub trait EventSink {
    /// Receives one event. Called in emission order, only after commit.
    fn publish(&mut self, event: TokenEvent);
}

/// External transfer primitive used by `withdraw` for assets the ledger
/// does not track itself (the native asset and foreign tokens).
pub trait AssetVault {
    /// Amount of `asset` held by the token contract.
    fn balance_of(&self, asset: &Address) -> U256;

    /// Sends `amount` of `asset` to `to`.
    ///
    /// # Errors
    /// * `VaultError::InsufficientFunds` - not enough of the asset is held
    /// * `VaultError::Rejected` - the primitive refused the transfer
    fn transfer_out(&mut self, asset: Address, to: Address, amount: U256)
        -> Result<(), VaultError>;
}

/// Source of the current time for permit deadlines.
pub trait Clock {
    /// Current unix time in seconds.
    fn now(&self) -> u64;
}
