//! # Inbound Ports (Driving Ports / API)
//!
//! The externally callable surface of the token. Every mutating call names
//! its caller explicitly; the surrounding sequencer is responsible for
//! authenticating it.

use crate::domain::entities::{Capability, Settlement, TaxRecipient};
use crate::domain::value_objects::{Address, EcdsaSignature, Hash, U256};
use crate::errors::TokenError;

/// Primary token API.
///
/// Calls run serially. Each one either commits all of its effects and
/// notifications or returns an error with nothing changed.
pub trait TaxTokenApi {
    // =========================================================================
    // Views
    // =========================================================================

    /// Token name (also the EIP-712 domain name).
    fn name(&self) -> &str;

    /// Token symbol.
    fn symbol(&self) -> &str;

    /// Display decimals.
    fn decimals(&self) -> u8;

    /// Total tokens in existence.
    fn total_supply(&self) -> U256;

    /// Balance of `account`.
    fn balance_of(&self, account: &Address) -> U256;

    /// Remaining allowance of `spender` over `owner`'s tokens.
    fn allowance(&self, owner: &Address, spender: &Address) -> U256;

    /// Next permit nonce of `owner`.
    fn nonce_of(&self, owner: &Address) -> U256;

    /// EIP-712 domain separator.
    fn domain_separator(&self) -> Hash;

    /// Tax a transfer of `amount` from `from` to `to` would pay right now.
    ///
    /// Side-effect free. Fails with `BlacklistViolation` exactly when the
    /// transfer itself would.
    fn get_tax(&self, from: &Address, to: &Address, amount: U256) -> Result<U256, TokenError>;

    /// Buy rate in basis points.
    fn buy_tax_rate(&self) -> u16;

    /// Sell rate in basis points.
    fn sell_tax_rate(&self) -> u16;

    /// Tax recipients in distribution order.
    fn tax_recipients(&self) -> &[TaxRecipient];

    /// Whether `account` is blacklisted.
    fn is_blacklisted(&self, account: &Address) -> bool;

    /// Whether `account` is tax-exempt.
    fn is_tax_exempt(&self, account: &Address) -> bool;

    /// Whether `account` is an exchange pool.
    fn is_exchange_pool(&self, account: &Address) -> bool;

    /// Whether `account` holds `capability`.
    fn has_capability(&self, account: &Address, capability: Capability) -> bool;

    // =========================================================================
    // Holder Operations
    // =========================================================================

    /// Moves `amount` from `caller` to `to`, withholding any tax.
    fn transfer(&mut self, caller: Address, to: Address, amount: U256)
        -> Result<Settlement, TokenError>;

    /// Sets `caller`'s allowance for `spender` to exactly `amount`.
    fn approve(&mut self, caller: Address, spender: Address, amount: U256)
        -> Result<(), TokenError>;

    /// Spends `caller`'s allowance over `owner` to move `amount` to `to`.
    fn transfer_from(
        &mut self,
        caller: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> Result<Settlement, TokenError>;

    /// Sets an allowance from an owner signature instead of an owner call.
    fn permit(
        &mut self,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: U256,
        signature: &EcdsaSignature,
    ) -> Result<(), TokenError>;

    /// Destroys `amount` of `caller`'s tokens. Requires `BurnControl`.
    fn burn(&mut self, caller: Address, amount: U256) -> Result<(), TokenError>;

    // =========================================================================
    // Administration
    // =========================================================================

    /// Requires `BlacklistControl`.
    fn set_blacklist_status(
        &mut self,
        caller: Address,
        account: Address,
        blacklisted: bool,
    ) -> Result<(), TokenError>;

    /// Requires `TaxControl`.
    fn set_tax_exempt(&mut self, caller: Address, account: Address, exempt: bool)
        -> Result<(), TokenError>;

    /// Requires `TaxControl`; rate <= 5000.
    fn set_buy_tax_rate(&mut self, caller: Address, rate_bps: u16) -> Result<(), TokenError>;

    /// Requires `TaxControl`; rate <= 5000.
    fn set_sell_tax_rate(&mut self, caller: Address, rate_bps: u16) -> Result<(), TokenError>;

    /// Requires `Admin`. Replaces the whole list atomically.
    fn replace_tax_recipients(
        &mut self,
        caller: Address,
        recipients: Vec<TaxRecipient>,
    ) -> Result<(), TokenError>;

    /// Requires `Admin`. Emits only if the pool was not registered.
    fn add_exchange_pool(&mut self, caller: Address, pool: Address) -> Result<(), TokenError>;

    /// Requires `Admin`. Emits only if the pool was registered.
    fn remove_exchange_pool(&mut self, caller: Address, pool: Address) -> Result<(), TokenError>;

    /// Requires `Admin`. Sends `amount` of `asset` (zero address = native
    /// asset) held by the token contract to `caller`.
    fn withdraw(&mut self, caller: Address, asset: Address, amount: U256)
        -> Result<(), TokenError>;

    /// Requires `Admin`.
    fn grant_capability(
        &mut self,
        caller: Address,
        capability: Capability,
        account: Address,
    ) -> Result<(), TokenError>;

    /// Requires `Admin`.
    fn revoke_capability(
        &mut self,
        caller: Address,
        capability: Capability,
        account: Address,
    ) -> Result<(), TokenError>;
}
