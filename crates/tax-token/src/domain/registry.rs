//! # Registries
//!
//! Address sets that drive tax classification, plus the ordered tax
//! recipient list and its membership index.

use super::entities::TaxRecipient;
use super::value_objects::{Address, BPS_DENOMINATOR};
use crate::errors::ValidationError;
use std::collections::HashSet;

/// Blacklist, exemptions, exchange pools and tax recipients.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    blacklisted: HashSet<Address>,
    tax_exempt: HashSet<Address>,
    exchange_pools: HashSet<Address>,
    /// Distribution order matters: the last entry absorbs rounding dust.
    recipients: Vec<TaxRecipient>,
    recipient_wallets: HashSet<Address>,
}

impl Registry {
    /// Creates empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `account` is blacklisted.
    #[must_use]
    pub fn is_blacklisted(&self, account: &Address) -> bool {
        self.blacklisted.contains(account)
    }

    /// Whether `account` is tax-exempt.
    #[must_use]
    pub fn is_tax_exempt(&self, account: &Address) -> bool {
        self.tax_exempt.contains(account)
    }

    /// Whether `account` is a registered exchange pool.
    #[must_use]
    pub fn is_exchange_pool(&self, account: &Address) -> bool {
        self.exchange_pools.contains(account)
    }

    /// Whether `account` is a current tax recipient.
    #[must_use]
    pub fn is_tax_recipient(&self, account: &Address) -> bool {
        self.recipient_wallets.contains(account)
    }

    /// Size of the recipient membership index.
    #[must_use]
    pub fn recipient_index_len(&self) -> usize {
        self.recipient_wallets.len()
    }

    /// The tax recipient list, in distribution order.
    #[must_use]
    pub fn tax_recipients(&self) -> &[TaxRecipient] {
        &self.recipients
    }

    /// Writes the blacklist flag for `account`.
    pub fn set_blacklisted(&mut self, account: Address, flag: bool) {
        if flag {
            self.blacklisted.insert(account);
        } else {
            self.blacklisted.remove(&account);
        }
    }

    /// Writes the tax-exemption flag for `account`.
    pub fn set_tax_exempt(&mut self, account: Address, flag: bool) {
        if flag {
            self.tax_exempt.insert(account);
        } else {
            self.tax_exempt.remove(&account);
        }
    }

    /// Registers a pool. Returns true if the set changed.
    pub fn add_exchange_pool(&mut self, pool: Address) -> bool {
        self.exchange_pools.insert(pool)
    }

    /// Unregisters a pool. Returns true if the set changed.
    pub fn remove_exchange_pool(&mut self, pool: &Address) -> bool {
        self.exchange_pools.remove(pool)
    }

    /// Replaces the tax recipient list wholesale.
    ///
    /// Previous recipients lose their exemption and membership; new ones
    /// gain both. Validation runs to completion before anything is touched,
    /// so on error the registry is exactly as it was.
    pub fn replace_tax_recipients(
        &mut self,
        recipients: Vec<TaxRecipient>,
    ) -> Result<(), ValidationError> {
        validate_recipients(&recipients)?;

        for old in self.recipients.drain(..) {
            self.tax_exempt.remove(&old.wallet);
            self.recipient_wallets.remove(&old.wallet);
        }

        for recipient in &recipients {
            self.tax_exempt.insert(recipient.wallet);
            self.recipient_wallets.insert(recipient.wallet);
        }
        self.recipients = recipients;
        Ok(())
    }
}

/// Checks a candidate recipient list in submission order.
///
/// Rejects zero wallets, duplicate wallets, shares above 10000 and totals
/// other than exactly 10000. Stops at the first entry that pushes the running
/// total past 10000.
pub fn validate_recipients(recipients: &[TaxRecipient]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(recipients.len());
    let mut total: u32 = 0;

    for (index, recipient) in recipients.iter().enumerate() {
        if recipient.wallet.is_zero() {
            return Err(ValidationError::RecipientZeroAddress { index });
        }
        if !seen.insert(recipient.wallet) {
            return Err(ValidationError::DuplicateRecipient(recipient.wallet));
        }
        if recipient.share > BPS_DENOMINATOR {
            return Err(ValidationError::ShareOutOfRange {
                share: recipient.share,
                max: BPS_DENOMINATOR,
            });
        }
        total += u32::from(recipient.share);
        if total > u32::from(BPS_DENOMINATOR) {
            return Err(ValidationError::InvalidShareTotal { total });
        }
    }

    if total != u32::from(BPS_DENOMINATOR) {
        return Err(ValidationError::InvalidShareTotal { total });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: u8) -> Address {
        Address::from_low_u8(tag)
    }

    fn split(entries: &[(u8, u16)]) -> Vec<TaxRecipient> {
        entries
            .iter()
            .map(|(tag, share)| TaxRecipient::new(addr(*tag), format!("r{tag}"), *share))
            .collect()
    }

    #[test]
    fn test_pool_membership_reports_change() {
        let mut registry = Registry::new();
        assert!(registry.add_exchange_pool(addr(1)));
        assert!(!registry.add_exchange_pool(addr(1)));
        assert!(registry.is_exchange_pool(&addr(1)));
        assert!(registry.remove_exchange_pool(&addr(1)));
        assert!(!registry.remove_exchange_pool(&addr(1)));
    }

    #[test]
    fn test_flags_are_idempotent() {
        let mut registry = Registry::new();
        registry.set_tax_exempt(addr(1), true);
        registry.set_tax_exempt(addr(1), true);
        assert!(registry.is_tax_exempt(&addr(1)));
        registry.set_blacklisted(addr(1), true);
        registry.set_blacklisted(addr(1), false);
        assert!(!registry.is_blacklisted(&addr(1)));
    }

    #[test]
    fn test_replace_swaps_exemptions() {
        let mut registry = Registry::new();
        registry
            .replace_tax_recipients(split(&[(1, 5000), (2, 5000)]))
            .unwrap();
        assert!(registry.is_tax_exempt(&addr(1)));
        assert!(registry.is_tax_recipient(&addr(2)));

        registry
            .replace_tax_recipients(split(&[(2, 2500), (3, 7500)]))
            .unwrap();
        assert!(!registry.is_tax_exempt(&addr(1)));
        assert!(!registry.is_tax_recipient(&addr(1)));
        assert!(registry.is_tax_exempt(&addr(2)));
        assert!(registry.is_tax_exempt(&addr(3)));
        let wallets: Vec<_> = registry.tax_recipients().iter().map(|r| r.wallet).collect();
        assert_eq!(wallets, vec![addr(2), addr(3)]);
    }

    #[test]
    fn test_replace_rejects_bad_total_and_keeps_old_list() {
        let mut registry = Registry::new();
        let original = split(&[(1, 10_000)]);
        registry.replace_tax_recipients(original.clone()).unwrap();

        let err = registry
            .replace_tax_recipients(split(&[(2, 4000), (3, 5000)]))
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidShareTotal { total: 9000 });
        assert_eq!(registry.tax_recipients(), original.as_slice());
        assert!(registry.is_tax_exempt(&addr(1)));
        assert!(!registry.is_tax_exempt(&addr(2)));
    }

    #[test]
    fn test_validate_rejects_zero_and_duplicates() {
        assert_eq!(
            validate_recipients(&[TaxRecipient::new(Address::ZERO, "burn", 10_000)]),
            Err(ValidationError::RecipientZeroAddress { index: 0 })
        );
        assert_eq!(
            validate_recipients(&split(&[(1, 5000), (1, 5000)])),
            Err(ValidationError::DuplicateRecipient(addr(1)))
        );
        assert_eq!(
            validate_recipients(&[]),
            Err(ValidationError::InvalidShareTotal { total: 0 })
        );
    }

    #[test]
    fn test_share_total_cannot_wrap_around() {
        // 429_497 * 10000 + 7296 == 2^32 + 10000
        let mut list: Vec<TaxRecipient> = (1..=429_497u32)
            .map(|i| {
                let mut bytes = [0u8; 20];
                bytes[16..].copy_from_slice(&i.to_be_bytes());
                TaxRecipient::new(Address::new(bytes), "r", 10_000)
            })
            .collect();
        list.push(TaxRecipient::new(Address::new([0xee; 20]), "r", 7296));

        assert_eq!(
            validate_recipients(&list),
            Err(ValidationError::InvalidShareTotal { total: 20_000 })
        );

        let mut registry = Registry::new();
        assert!(registry.replace_tax_recipients(list).is_err());
        assert!(registry.tax_recipients().is_empty());
    }

    #[test]
    fn test_labels_need_not_be_unique() {
        let list = vec![
            TaxRecipient::new(addr(1), "team", 5000),
            TaxRecipient::new(addr(2), "team", 5000),
        ];
        assert!(validate_recipients(&list).is_ok());
    }
}
