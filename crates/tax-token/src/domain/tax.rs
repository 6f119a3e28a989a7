//! # Tax Engine
//!
//! Classifies a transfer against the registries and splits collected tax
//! across the recipient list.
//!
//! Classification precedence:
//!
//! | Step | Condition | Class | Tax |
//! |------|-----------|-------|-----|
//! | 1 | sender blacklisted | `SafeHarbor` or abort | 0 |
//! | 2 | either side exempt | `Exempt` | 0 |
//! | 3 | no pool involved | `PeerToPeer` | 0 |
//! | 4 | both sides pools | `PoolToPool` | 0 |
//! | 5 | sender is a pool | `Buy` | `floor(amount * buy / 10000)` |
//! | 6 | receiver is a pool | `Sell` | `floor(amount * sell / 10000)` |

use super::entities::{Payout, TaxClass, TaxRecipient};
use super::registry::Registry;
use super::value_objects::{bps_of, Address, U256, BPS_DENOMINATOR, MAX_TAX_RATE_BPS};
use crate::errors::{TokenError, ValidationError};
use serde::{Deserialize, Serialize};

/// Directional tax rates in basis points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRates {
    buy_bps: u16,
    sell_bps: u16,
}

impl TaxRates {
    /// Creates bounded rates.
    pub fn new(buy_bps: u16, sell_bps: u16) -> Result<Self, ValidationError> {
        check_rate(buy_bps)?;
        check_rate(sell_bps)?;
        Ok(Self { buy_bps, sell_bps })
    }

    /// Rate applied when tokens leave a pool.
    #[must_use]
    pub const fn buy_bps(&self) -> u16 {
        self.buy_bps
    }

    /// Rate applied when tokens enter a pool.
    #[must_use]
    pub const fn sell_bps(&self) -> u16 {
        self.sell_bps
    }

    /// Sets the buy rate, returning the previous one.
    pub fn set_buy_bps(&mut self, rate: u16) -> Result<u16, ValidationError> {
        check_rate(rate)?;
        Ok(std::mem::replace(&mut self.buy_bps, rate))
    }

    /// Sets the sell rate, returning the previous one.
    pub fn set_sell_bps(&mut self, rate: u16) -> Result<u16, ValidationError> {
        check_rate(rate)?;
        Ok(std::mem::replace(&mut self.sell_bps, rate))
    }
}

/// Rejects rates above 50%.
pub fn check_rate(rate: u16) -> Result<(), ValidationError> {
    if rate > MAX_TAX_RATE_BPS {
        return Err(ValidationError::TaxRateTooHigh {
            rate,
            max: MAX_TAX_RATE_BPS,
        });
    }
    Ok(())
}

/// Read-only view the tax engine evaluates a transfer against.
#[derive(Clone, Copy, Debug)]
pub struct TaxPolicy<'a> {
    /// Classification registries.
    pub registry: &'a Registry,
    /// Current rates.
    pub rates: TaxRates,
    /// Only destination a blacklisted sender may reach.
    pub safe_harbor: Address,
}

impl TaxPolicy<'_> {
    /// Classifies a transfer. Fails only for a blacklisted sender aiming
    /// anywhere but the safe harbor.
    pub fn classify(&self, from: &Address, to: &Address) -> Result<TaxClass, TokenError> {
        let registry = self.registry;

        if registry.is_blacklisted(from) {
            if *to == self.safe_harbor {
                return Ok(TaxClass::SafeHarbor);
            }
            return Err(TokenError::BlacklistViolation {
                from: *from,
                to: *to,
            });
        }

        if registry.is_tax_exempt(from) || registry.is_tax_exempt(to) {
            return Ok(TaxClass::Exempt);
        }

        let class = match (registry.is_exchange_pool(from), registry.is_exchange_pool(to)) {
            (false, false) => TaxClass::PeerToPeer,
            (true, true) => TaxClass::PoolToPool,
            (true, false) => TaxClass::Buy,
            (false, true) => TaxClass::Sell,
        };
        Ok(class)
    }

    /// Tax owed for `amount` under `class`.
    #[must_use]
    pub fn tax_for(&self, class: TaxClass, amount: U256) -> U256 {
        if !class.is_taxable() {
            return U256::zero();
        }
        let bps = if class == TaxClass::Buy {
            self.rates.buy_bps()
        } else {
            self.rates.sell_bps()
        };
        bps_of(amount, bps)
    }

    /// Classifies and prices a transfer in one step.
    pub fn classify_and_tax(
        &self,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<(TaxClass, U256), TokenError> {
        let class = self.classify(from, to)?;
        Ok((class, self.tax_for(class, amount)))
    }
}

/// Splits `tax` across `recipients`.
///
/// Every recipient but the last receives `floor(tax * share / 10000)`; the
/// last receives whatever remains, so the payouts always sum to `tax`.
/// An empty list yields no payouts.
///
/// # Errors
///
/// Fails if a share exceeds 10000 or the leading shares pay out more than
/// `tax`. A list accepted by `validate_recipients` never does.
pub fn distribute(tax: U256, recipients: &[TaxRecipient]) -> Result<Vec<Payout>, ValidationError> {
    let Some((last, leading)) = recipients.split_last() else {
        return Ok(Vec::new());
    };

    let mut payouts = Vec::with_capacity(recipients.len());
    let mut paid = U256::zero();
    for recipient in leading {
        if recipient.share > BPS_DENOMINATOR {
            return Err(ValidationError::ShareOutOfRange {
                share: recipient.share,
                max: BPS_DENOMINATOR,
            });
        }
        let amount = bps_of(tax, recipient.share);
        paid = paid
            .checked_add(amount)
            .filter(|paid| *paid <= tax)
            .ok_or_else(|| overallocated(recipients))?;
        payouts.push(Payout {
            wallet: recipient.wallet,
            amount,
        });
    }
    payouts.push(Payout {
        wallet: last.wallet,
        amount: tax - paid,
    });
    Ok(payouts)
}

fn overallocated(recipients: &[TaxRecipient]) -> ValidationError {
    let total = recipients
        .iter()
        .fold(0u32, |acc, r| acc.saturating_add(u32::from(r.share)));
    ValidationError::InvalidShareTotal { total }
}
