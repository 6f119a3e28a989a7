//! # Domain Invariants
//!
//! Properties that must hold between any two calls:
//! - INVARIANT-1: Supply Conservation (`total_supply == sum(balances)`)
//! - INVARIANT-2: Recipient Shares (non-empty list sums to exactly 10000)
//! - INVARIANT-3: Recipient Uniqueness (no duplicate or zero wallet)
//! - INVARIANT-4: Recipient Index (membership set mirrors the list)
//! - INVARIANT-5: Rate Bounds (both rates <= 5000)

use super::ledger::Ledger;
use super::registry::Registry;
use super::tax::TaxRates;
use super::value_objects::{U256, BPS_DENOMINATOR, MAX_TAX_RATE_BPS};
use std::collections::HashSet;

/// INVARIANT-1: Supply Conservation
#[must_use]
pub fn check_supply_invariant(ledger: &Ledger) -> bool {
    ledger.sum_of_balances() == Some(ledger.total_supply())
}

/// INVARIANT-2: Recipient Shares
#[must_use]
pub fn check_recipient_shares_invariant(registry: &Registry) -> bool {
    let recipients = registry.tax_recipients();
    if recipients.is_empty() {
        return true;
    }
    let total: u32 = recipients.iter().map(|r| u32::from(r.share)).sum();
    total == u32::from(BPS_DENOMINATOR)
}

/// INVARIANT-3: Recipient Uniqueness
#[must_use]
pub fn check_recipient_uniqueness_invariant(registry: &Registry) -> bool {
    let mut seen = HashSet::new();
    registry
        .tax_recipients()
        .iter()
        .all(|r| !r.wallet.is_zero() && seen.insert(r.wallet))
}

/// INVARIANT-4: Recipient Index
///
/// The membership index holds exactly the listed wallets.
#[must_use]
pub fn check_recipient_index_invariant(registry: &Registry) -> bool {
    let recipients = registry.tax_recipients();
    registry.recipient_index_len() == recipients.len()
        && recipients.iter().all(|r| registry.is_tax_recipient(&r.wallet))
}

/// INVARIANT-5: Rate Bounds
#[must_use]
pub fn check_rate_invariant(rates: &TaxRates) -> bool {
    rates.buy_bps() <= MAX_TAX_RATE_BPS && rates.sell_bps() <= MAX_TAX_RATE_BPS
}

/// Check all invariants at once.
#[must_use]
pub fn check_all_invariants(
    ledger: &Ledger,
    registry: &Registry,
    rates: &TaxRates,
) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_supply_invariant(ledger) {
        violations.push(InvariantViolation::SupplyMismatch {
            total_supply: ledger.total_supply(),
            sum_of_balances: ledger.sum_of_balances(),
        });
    }

    if !check_recipient_shares_invariant(registry) {
        violations.push(InvariantViolation::RecipientSharesInvalid);
    }

    if !check_recipient_uniqueness_invariant(registry) {
        violations.push(InvariantViolation::RecipientWalletInvalid);
    }

    if !check_recipient_index_invariant(registry) {
        violations.push(InvariantViolation::RecipientIndexOutOfSync {
            listed: registry.tax_recipients().len(),
            indexed: registry.recipient_index_len(),
        });
    }

    if !check_rate_invariant(rates) {
        violations.push(InvariantViolation::RateOutOfBounds {
            buy_bps: rates.buy_bps(),
            sell_bps: rates.sell_bps(),
        });
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

/// Result of invariant checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns the violations (empty if valid).
    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        match self {
            Self::Valid => &[],
            Self::Invalid(v) => v,
        }
    }
}

/// Specific invariant violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Total supply differs from the balance sum (None if the sum overflowed).
    SupplyMismatch {
        /// Recorded supply.
        total_supply: U256,
        /// Observed sum.
        sum_of_balances: Option<U256>,
    },
    /// Non-empty recipient list does not sum to 10000.
    RecipientSharesInvalid,
    /// Duplicate or zero recipient wallet.
    RecipientWalletInvalid,
    /// Membership index does not mirror the recipient list.
    RecipientIndexOutOfSync {
        /// Entries in the list.
        listed: usize,
        /// Entries in the index.
        indexed: usize,
    },
    /// A tax rate exceeds the ceiling.
    RateOutOfBounds {
        /// Buy rate.
        buy_bps: u16,
        /// Sell rate.
        sell_bps: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::TaxRecipient;
    use crate::domain::value_objects::Address;

    #[test]
    fn test_fresh_state_is_valid() {
        let result = check_all_invariants(&Ledger::new(), &Registry::new(), &TaxRates::default());
        assert!(result.is_valid());
        assert!(result.violations().is_empty());
    }

    #[test]
    fn test_valid_after_mints_and_recipients() {
        let mut ledger = Ledger::new();
        ledger.mint(Address::from_low_u8(1), U256::from(10)).unwrap();
        ledger.mint(Address::from_low_u8(2), U256::from(5)).unwrap();
        let mut registry = Registry::new();
        registry
            .replace_tax_recipients(vec![TaxRecipient::new(Address::from_low_u8(3), "ops", 10_000)])
            .unwrap();

        assert!(check_supply_invariant(&ledger));
        assert!(check_recipient_index_invariant(&registry));
        let rates = TaxRates::new(5000, 5000).unwrap();
        assert!(check_all_invariants(&ledger, &registry, &rates).is_valid());
    }

    #[test]
    fn test_recipient_exemption_is_not_an_invariant() {
        let mut registry = Registry::new();
        let wallet = Address::from_low_u8(3);
        registry
            .replace_tax_recipients(vec![TaxRecipient::new(wallet, "ops", 10_000)])
            .unwrap();
        registry.set_tax_exempt(wallet, false);

        assert!(check_recipient_index_invariant(&registry));
        assert!(check_all_invariants(&Ledger::new(), &registry, &TaxRates::default()).is_valid());
    }

    #[test]
    fn test_detects_unbacked_credit() {
        let mut ledger = Ledger::new();
        ledger.mint(Address::from_low_u8(1), U256::from(10)).unwrap();
        ledger.credit(&Address::from_low_u8(2), U256::from(1));

        let result = check_all_invariants(&ledger, &Registry::new(), &TaxRates::default());
        assert_eq!(
            result.violations(),
            &[InvariantViolation::SupplyMismatch {
                total_supply: U256::from(10),
                sum_of_balances: Some(U256::from(11)),
            }]
        );
    }
}
