//! # Ledger
//!
//! Balance, allowance and nonce bookkeeping.
//!
//! Every mutating method validates all of its preconditions before touching
//! state, so a returned error always means nothing changed.
//!
//! ## Invariants
//! - `total_supply == sum(balances)`
//! - balances never go negative (enforced by `U256` plus explicit checks)
//! - nonces only increase

use super::value_objects::{Address, U256};
use crate::errors::ValidationError;
use crate::events::TokenEvent;
use std::collections::HashMap;

/// In-memory token ledger.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    nonces: HashMap<Address, U256>,
    total_supply: U256,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Balance of `account` (zero for unknown accounts).
    #[must_use]
    pub fn balance_of(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Total tokens in existence.
    #[must_use]
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Remaining amount `spender` may move on behalf of `owner`.
    #[must_use]
    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    /// Next permit nonce for `owner`.
    #[must_use]
    pub fn nonce_of(&self, owner: &Address) -> U256 {
        self.nonces.get(owner).copied().unwrap_or_default()
    }

    /// Sum of all balances, or None if it does not fit in 256 bits.
    #[must_use]
    pub fn sum_of_balances(&self) -> Option<U256> {
        self.balances
            .values()
            .try_fold(U256::zero(), |acc, balance| acc.checked_add(*balance))
    }

    /// Number of accounts that have ever been credited.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    // =========================================================================
    // Checks
    // =========================================================================

    /// Checks the preconditions of moving `amount` from `from` to `to`.
    pub fn check_transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<(), ValidationError> {
        if from.is_zero() || to.is_zero() {
            return Err(ValidationError::ZeroAddress);
        }
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount);
        }
        self.check_balance(from, amount)
    }

    /// Checks that `account` holds at least `amount`.
    pub fn check_balance(&self, account: &Address, amount: U256) -> Result<(), ValidationError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(ValidationError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        Ok(())
    }

    /// Checks that `spender` may move `amount` of `owner`'s tokens.
    pub fn check_allowance(
        &self,
        owner: &Address,
        spender: &Address,
        amount: U256,
    ) -> Result<(), ValidationError> {
        let available = self.allowance(owner, spender);
        if available < amount {
            return Err(ValidationError::InsufficientAllowance {
                required: amount,
                available,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Untaxed balance move.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TokenEvent, ValidationError> {
        self.check_transfer(&from, &to, amount)?;
        self.debit(&from, amount);
        self.credit(&to, amount);
        Ok(TokenEvent::Transfer {
            from,
            to,
            value: amount,
        })
    }

    /// Overwrites the allowance of `spender` over `owner`'s tokens.
    pub fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TokenEvent, ValidationError> {
        if owner.is_zero() || spender.is_zero() {
            return Err(ValidationError::ZeroAddress);
        }
        self.allowances.insert((owner, spender), amount);
        Ok(TokenEvent::Approval {
            owner,
            spender,
            value: amount,
        })
    }

    /// Decrements an allowance by exactly `amount`.
    pub fn spend_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TokenEvent, ValidationError> {
        self.check_allowance(&owner, &spender, amount)?;
        let remaining = self.allowance(&owner, &spender) - amount;
        self.allowances.insert((owner, spender), remaining);
        Ok(TokenEvent::Approval {
            owner,
            spender,
            value: remaining,
        })
    }

    /// Creates `amount` new tokens in `account`.
    pub fn mint(&mut self, account: Address, amount: U256) -> Result<TokenEvent, ValidationError> {
        if account.is_zero() {
            return Err(ValidationError::ZeroAddress);
        }
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(ValidationError::SupplyOverflow)?;
        self.total_supply = new_supply;
        self.credit(&account, amount);
        Ok(TokenEvent::Transfer {
            from: Address::ZERO,
            to: account,
            value: amount,
        })
    }

    /// Destroys `amount` tokens held by `account`.
    pub fn burn(&mut self, account: Address, amount: U256) -> Result<TokenEvent, ValidationError> {
        if account.is_zero() {
            return Err(ValidationError::ZeroAddress);
        }
        self.check_balance(&account, amount)?;
        self.debit(&account, amount);
        self.total_supply -= amount;
        Ok(TokenEvent::Transfer {
            from: account,
            to: Address::ZERO,
            value: amount,
        })
    }

    /// Returns the current nonce of `owner` and advances it.
    pub fn use_nonce(&mut self, owner: &Address) -> U256 {
        let current = self.nonce_of(owner);
        self.nonces.insert(*owner, current.saturating_add(U256::one()));
        current
    }

    /// Removes `amount` from `account`. Callers check the balance first.
    pub(crate) fn debit(&mut self, account: &Address, amount: U256) {
        let balance = self.balances.entry(*account).or_default();
        *balance = balance.saturating_sub(amount);
    }

    /// Adds `amount` to `account`, creating it on first credit.
    pub(crate) fn credit(&mut self, account: &Address, amount: U256) {
        // total_supply bounds every balance, so this cannot saturate
        let balance = self.balances.entry(*account).or_default();
        *balance = balance.saturating_add(amount);
    }
}
