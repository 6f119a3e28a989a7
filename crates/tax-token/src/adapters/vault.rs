//! # Asset Vault Adapter
//!
//! Tracks foreign-asset and native holdings of the token contract and the
//! payouts made from them.

use crate::domain::value_objects::{Address, U256};
use crate::errors::VaultError;
use crate::ports::outbound::AssetVault;
use std::collections::HashMap;

/// In-memory custody of non-ledger assets.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVault {
    holdings: HashMap<Address, U256>,
    paid_out: HashMap<(Address, Address), U256>,
}

impl InMemoryVault {
    /// Creates an empty vault.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `amount` of `asset` arriving at the contract.
    pub fn deposit(&mut self, asset: Address, amount: U256) {
        let held = self.holdings.entry(asset).or_default();
        *held = held.saturating_add(amount);
    }

    /// Total of `asset` paid to `to` so far.
    #[must_use]
    pub fn paid_to(&self, asset: &Address, to: &Address) -> U256 {
        self.paid_out.get(&(*asset, *to)).copied().unwrap_or_default()
    }
}

impl AssetVault for InMemoryVault {
    fn balance_of(&self, asset: &Address) -> U256 {
        self.holdings.get(asset).copied().unwrap_or_default()
    }

    fn transfer_out(
        &mut self,
        asset: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), VaultError> {
        if to.is_zero() {
            return Err(VaultError::Rejected("recipient is the zero address".into()));
        }
        let available = self.balance_of(&asset);
        if available < amount {
            return Err(VaultError::InsufficientFunds {
                asset,
                required: amount,
                available,
            });
        }
        self.holdings.insert(asset, available - amount);
        let paid = self.paid_out.entry((asset, to)).or_default();
        *paid = paid.saturating_add(amount);
        Ok(())
    }
}
