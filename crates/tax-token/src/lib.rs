//! # Tax Token - Taxed Fungible-Token Ledger
//!
//! A fungible-token ledger that withholds a directional tax on transfers into
//! and out of registered exchange pools, splits the tax across an ordered
//! list of recipients, and accepts signed (EIP-712) approvals in place of
//! owner-sent ones.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Supply Conservation | `domain/invariants.rs` - `check_supply_invariant()` |
//! | INVARIANT-2 | Recipient Shares Sum to 10000 | `domain/registry.rs` - `validate_recipients()` |
//! | INVARIANT-3 | Unique, Non-zero Recipient Wallets | `domain/registry.rs` - `validate_recipients()` |
//! | INVARIANT-4 | Recipient Index Mirrors List | `domain/registry.rs` - `replace_tax_recipients()` |
//! | INVARIANT-5 | Rates <= 5000 bps | `domain/tax.rs` - `check_rate()` |
//!
//! ## Tax Classification
//!
//! | Sender | Receiver | Result |
//! |--------|----------|--------|
//! | blacklisted | safe harbor | untaxed |
//! | blacklisted | anything else | `BlacklistViolation` |
//! | exempt | any | untaxed |
//! | any | exempt | untaxed |
//! | non-pool | non-pool | untaxed |
//! | pool | pool | untaxed |
//! | pool | non-pool | buy rate |
//! | non-pool | pool | sell rate |
//!
//! ## Capabilities
//!
//! | Capability | Operations |
//! |------------|------------|
//! | `Admin` | recipients, pools, withdrawals, grant/revoke |
//! | `BlacklistControl` | `set_blacklist_status` |
//! | `TaxControl` | `set_tax_exempt`, `set_buy_tax_rate`, `set_sell_tax_rate` |
//! | `BurnControl` | `burn` |
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose | In-memory adapter |
//! |-------|---------|-------------------|
//! | `AccessControl` | Capability checks and role changes | `InMemoryAccessControl` |
//! | `EventSink` | Committed notifications | `InMemoryEventLog` |
//! | `AssetVault` | Native and foreign asset withdrawals | `InMemoryVault` |
//! | `Clock` | Permit deadlines | `SystemClock`, `ManualClock` |
//!
//! ## Usage Example
//!
//! ```ignore
//! use tax_token::prelude::*;
//!
//! let config = TokenConfig::load("token.toml")?;
//! let admin = config.admin;
//! let mut token = TaxTokenService::new(
//!     config,
//!     InMemoryAccessControl::new(),
//!     InMemoryEventLog::new(),
//!     InMemoryVault::new(),
//!     SystemClock,
//! )?;
//!
//! token.add_exchange_pool(admin, pool)?;
//! let receipt = token.transfer(pool, buyer, U256::from(1_000))?;
//! println!("tax withheld: {}", receipt.tax);
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        Capability, Payout, Settlement, TaxClass, TaxRecipient, TransferPhase,
    };

    // Value objects
    pub use crate::domain::value_objects::{
        Address, EcdsaSignature, Hash, U256, BPS_DENOMINATOR, MAX_TAX_RATE_BPS,
    };

    // Domain services
    pub use crate::domain::permit::{keccak256, PermitMessage, SigningDomain};
    pub use crate::domain::tax::{distribute, TaxPolicy, TaxRates};

    // Invariants
    pub use crate::domain::invariants::{
        check_all_invariants, InvariantCheckResult, InvariantViolation,
    };

    // Ports
    pub use crate::ports::inbound::TaxTokenApi;
    pub use crate::ports::outbound::{AccessControl, AssetVault, Clock, EventSink};

    // Adapters
    pub use crate::adapters::{
        InMemoryAccessControl, InMemoryEventLog, InMemoryVault, ManualClock, SystemClock,
    };

    // Events
    pub use crate::events::TokenEvent;

    // Errors
    pub use crate::errors::{SignatureError, TokenError, ValidationError, VaultError};

    // Configuration
    pub use crate::config::{ConfigError, TokenConfig};

    // Service
    pub use crate::service::{ServiceStats, TaxTokenService};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
