//! # Tax Token Service
//!
//! Wires the ledger, registries, tax engine and permit verifier to the
//! outbound ports and exposes them through [`TaxTokenApi`].
//!
//! ## Atomicity
//!
//! Every call validates everything it can fail on before its first mutation.
//! Notifications are collected in a per-call outbox and handed to the
//! [`EventSink`] only once the call has committed, so an error leaves
//! balances, allowances, nonces, registries and the sink untouched.
//!
//! ## Transfer Lifecycle
//!
//! ```text
//! Pending ──validate + classify──> Validated ──apply──> Settled
//!    │
//!    └──────────── any check fails ───────────────────> Aborted
//! ```

use crate::config::{ConfigError, TokenConfig};
use crate::domain::entities::{Capability, Payout, Settlement, TaxClass, TaxRecipient, TransferPhase};
use crate::domain::invariants::{check_all_invariants, InvariantCheckResult};
use crate::domain::ledger::Ledger;
use crate::domain::permit::{verify_signer, PermitMessage, SigningDomain};
use crate::domain::registry::Registry;
use crate::domain::tax::{check_rate, distribute, TaxPolicy, TaxRates};
use crate::domain::value_objects::{Address, EcdsaSignature, Hash, U256};
use crate::errors::{SignatureError, TokenError, ValidationError};
use crate::events::TokenEvent;
use crate::ports::inbound::TaxTokenApi;
use crate::ports::outbound::{AccessControl, AssetVault, Clock, EventSink};
use tracing::{debug, info, instrument, warn};

/// Counters kept by the service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Transfers that reached `Settled`.
    pub transfers_settled: u64,
    /// Transfers that ended in `Aborted`.
    pub transfers_aborted: u64,
    /// Permits accepted.
    pub permits_consumed: u64,
    /// Tax paid out to recipients across all settled transfers.
    pub tax_collected: U256,
}

/// The token.
pub struct TaxTokenService<A: AccessControl, E: EventSink, V: AssetVault, C: Clock> {
    config: TokenConfig,
    ledger: Ledger,
    registry: Registry,
    rates: TaxRates,
    safe_harbor: Address,
    domain_separator: Hash,
    access: A,
    events: E,
    vault: V,
    clock: C,
    stats: ServiceStats,
}

impl<A, E, V, C> TaxTokenService<A, E, V, C>
where
    A: AccessControl,
    E: EventSink,
    V: AssetVault,
    C: Clock,
{
    /// Deploys a token.
    ///
    /// Mints the initial supply to the admin, grants the admin every
    /// capability, exempts the admin and the contract address from tax and
    /// installs the initial recipient list.
    pub fn new(
        config: TokenConfig,
        mut access: A,
        events: E,
        vault: V,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let admin = config.admin;
        let rates = TaxRates::new(config.buy_tax_bps, config.sell_tax_bps)?;
        let supply = config.initial_supply_units()?;
        let mut outbox = Vec::new();

        let mut ledger = Ledger::new();
        if !supply.is_zero() {
            outbox.push(ledger.mint(admin, supply)?);
        }

        for capability in Capability::ALL {
            if access.grant(capability, admin) {
                outbox.push(TokenEvent::CapabilityGranted {
                    capability,
                    account: admin,
                    sender: admin,
                });
            }
        }

        let mut registry = Registry::new();
        for account in [admin, config.contract_address] {
            registry.set_tax_exempt(account, true);
            outbox.push(TokenEvent::TaxExemptionUpdated {
                account,
                exempt: true,
            });
        }
        if !config.tax_recipients.is_empty() {
            registry.replace_tax_recipients(config.tax_recipients.clone())?;
            outbox.push(TokenEvent::TaxRecipientsUpdated {
                recipients: config.tax_recipients.clone(),
            });
        }

        let domain_separator = SigningDomain {
            name: config.name.clone(),
            chain_id: config.chain_id,
            verifying_contract: config.contract_address,
        }
        .separator();

        info!(
            name = %config.name,
            symbol = %config.symbol,
            admin = %admin,
            supply = %supply,
            buy_bps = rates.buy_bps(),
            sell_bps = rates.sell_bps(),
            "Token deployed"
        );

        let mut service = Self {
            safe_harbor: config.safe_harbor(),
            config,
            ledger,
            registry,
            rates,
            domain_separator,
            access,
            events,
            vault,
            clock,
            stats: ServiceStats::default(),
        };
        service.commit(outbox);
        Ok(service)
    }

    /// Deployment parameters.
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Only destination a blacklisted sender may reach.
    pub fn safe_harbor(&self) -> Address {
        self.safe_harbor
    }

    /// Service counters.
    pub fn stats(&self) -> &ServiceStats {
        &self.stats
    }

    /// The event sink.
    pub fn event_sink(&self) -> &E {
        &self.events
    }

    /// Mutable event sink, e.g. to drain recorded events.
    pub fn event_sink_mut(&mut self) -> &mut E {
        &mut self.events
    }

    /// The asset vault.
    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Mutable asset vault, e.g. to record deposits.
    pub fn vault_mut(&mut self) -> &mut V {
        &mut self.vault
    }

    /// Mutable clock.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Checks every ledger and registry invariant.
    pub fn check_invariants(&self) -> InvariantCheckResult {
        check_all_invariants(&self.ledger, &self.registry, &self.rates)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn policy(&self) -> TaxPolicy<'_> {
        TaxPolicy {
            registry: &self.registry,
            rates: self.rates,
            safe_harbor: self.safe_harbor,
        }
    }

    fn ensure(&self, caller: &Address, capability: Capability) -> Result<(), TokenError> {
        if self.access.has_capability(caller, capability) {
            return Ok(());
        }
        warn!(caller = %caller, capability = %capability, "Access denied");
        Err(TokenError::AccessDenied {
            caller: *caller,
            capability,
        })
    }

    fn commit(&mut self, outbox: Vec<TokenEvent>) {
        for event in outbox {
            self.events.publish(event);
        }
    }

    /// Pending -> Validated. Reads only.
    fn plan_transfer(
        &self,
        from: Address,
        to: Address,
        amount: U256,
        spender: Option<Address>,
    ) -> Result<Settlement, TokenError> {
        if let Some(spender) = spender {
            self.ledger.check_allowance(&from, &spender, amount)?;
        }
        self.ledger.check_transfer(&from, &to, amount)?;
        let (class, tax) = self.policy().classify_and_tax(&from, &to, amount)?;

        let payouts = if tax.is_zero() {
            Vec::new()
        } else {
            distribute(tax, self.registry.tax_recipients())?
        };
        // With nobody to pay, the receiver keeps the gross amount.
        let tax = if payouts.is_empty() { U256::zero() } else { tax };

        Ok(Settlement {
            from,
            to,
            amount,
            class,
            tax,
            net_amount: amount - tax,
            payouts,
        })
    }

    /// Validated -> Settled. Infallible: every check ran in `plan_transfer`.
    fn apply_transfer(&mut self, plan: &Settlement, outbox: &mut Vec<TokenEvent>) {
        self.ledger.debit(&plan.from, plan.amount);
        self.ledger.credit(&plan.to, plan.net_amount);

        for Payout { wallet, amount } in &plan.payouts {
            self.ledger.credit(wallet, *amount);
            outbox.push(TokenEvent::Transfer {
                from: plan.from,
                to: *wallet,
                value: *amount,
            });
        }

        outbox.push(TokenEvent::Transfer {
            from: plan.from,
            to: plan.to,
            value: plan.net_amount,
        });
    }

    fn execute_transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
        spender: Option<Address>,
    ) -> Result<Settlement, TokenError> {
        debug!(phase = %TransferPhase::Pending, from = %from, to = %to, amount = %amount);

        let plan = match self.plan_transfer(from, to, amount, spender) {
            Ok(plan) => plan,
            Err(err) => {
                self.stats.transfers_aborted += 1;
                warn!(
                    phase = %TransferPhase::Aborted,
                    from = %from,
                    to = %to,
                    amount = %amount,
                    error = %err,
                    "Transfer aborted"
                );
                return Err(err);
            }
        };
        debug!(phase = %TransferPhase::Validated, class = ?plan.class, tax = %plan.tax);

        let mut outbox = Vec::with_capacity(plan.payouts.len() + 2);
        if let Some(spender) = spender {
            outbox.push(self.ledger.spend_allowance(from, spender, amount)?);
        }
        self.apply_transfer(&plan, &mut outbox);
        self.commit(outbox);

        self.stats.transfers_settled += 1;
        self.stats.tax_collected = self.stats.tax_collected.saturating_add(plan.tax);
        debug!(
            phase = %TransferPhase::Settled,
            class = ?plan.class,
            tax = %plan.tax,
            net = %plan.net_amount,
            "Transfer settled"
        );
        Ok(plan)
    }

    fn set_rate(&mut self, class: TaxClass, rate_bps: u16) -> Result<(), TokenError> {
        check_rate(rate_bps)?;
        if rate_bps != 0 && self.registry.tax_recipients().is_empty() {
            return Err(ValidationError::NoTaxRecipients.into());
        }

        let event = if class == TaxClass::Buy {
            let old_rate = self.rates.set_buy_bps(rate_bps)?;
            TokenEvent::BuyTaxRateUpdated {
                old_rate,
                new_rate: rate_bps,
            }
        } else {
            let old_rate = self.rates.set_sell_bps(rate_bps)?;
            TokenEvent::SellTaxRateUpdated {
                old_rate,
                new_rate: rate_bps,
            }
        };
        info!(class = ?class, rate_bps, "Tax rate updated");
        self.commit(vec![event]);
        Ok(())
    }
}

impl<A, E, V, C> TaxTokenApi for TaxTokenService<A, E, V, C>
where
    A: AccessControl,
    E: EventSink,
    V: AssetVault,
    C: Clock,
{
    fn name(&self) -> &str {
        &self.config.name
    }

    fn symbol(&self) -> &str {
        &self.config.symbol
    }

    fn decimals(&self) -> u8 {
        self.config.decimals
    }

    fn total_supply(&self) -> U256 {
        self.ledger.total_supply()
    }

    fn balance_of(&self, account: &Address) -> U256 {
        self.ledger.balance_of(account)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.ledger.allowance(owner, spender)
    }

    fn nonce_of(&self, owner: &Address) -> U256 {
        self.ledger.nonce_of(owner)
    }

    fn domain_separator(&self) -> Hash {
        self.domain_separator
    }

    fn get_tax(&self, from: &Address, to: &Address, amount: U256) -> Result<U256, TokenError> {
        self.policy()
            .classify_and_tax(from, to, amount)
            .map(|(_, tax)| tax)
    }

    fn buy_tax_rate(&self) -> u16 {
        self.rates.buy_bps()
    }

    fn sell_tax_rate(&self) -> u16 {
        self.rates.sell_bps()
    }

    fn tax_recipients(&self) -> &[TaxRecipient] {
        self.registry.tax_recipients()
    }

    fn is_blacklisted(&self, account: &Address) -> bool {
        self.registry.is_blacklisted(account)
    }

    fn is_tax_exempt(&self, account: &Address) -> bool {
        self.registry.is_tax_exempt(account)
    }

    fn is_exchange_pool(&self, account: &Address) -> bool {
        self.registry.is_exchange_pool(account)
    }

    fn has_capability(&self, account: &Address, capability: Capability) -> bool {
        self.access.has_capability(account, capability)
    }

    #[instrument(skip(self), fields(caller = %caller, to = %to, amount = %amount))]
    fn transfer(
        &mut self,
        caller: Address,
        to: Address,
        amount: U256,
    ) -> Result<Settlement, TokenError> {
        self.execute_transfer(caller, to, amount, None)
    }

    #[instrument(skip(self), fields(caller = %caller, spender = %spender))]
    fn approve(&mut self, caller: Address, spender: Address, amount: U256) -> Result<(), TokenError> {
        let event = self.ledger.approve(caller, spender, amount)?;
        self.commit(vec![event]);
        Ok(())
    }

    #[instrument(skip(self), fields(caller = %caller, owner = %owner, to = %to, amount = %amount))]
    fn transfer_from(
        &mut self,
        caller: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> Result<Settlement, TokenError> {
        self.execute_transfer(owner, to, amount, Some(caller))
    }

    #[instrument(skip(self, signature), fields(owner = %owner, spender = %spender))]
    fn permit(
        &mut self,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: U256,
        signature: &EcdsaSignature,
    ) -> Result<(), TokenError> {
        let now = self.clock.now();
        if U256::from(now) > deadline {
            warn!(deadline = %deadline, now, "Permit expired");
            return Err(SignatureError::Expired { deadline, now }.into());
        }
        if owner.is_zero() || spender.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }

        let message = PermitMessage {
            owner,
            spender,
            value,
            nonce: self.ledger.nonce_of(&owner),
            deadline,
        };
        let digest = message.signing_digest(&self.domain_separator);
        if let Err(err) = verify_signer(&digest, signature, owner) {
            warn!(error = %err, "Permit signature rejected");
            return Err(err.into());
        }

        let nonce = self.ledger.use_nonce(&owner);
        let event = self.ledger.approve(owner, spender, value)?;
        self.commit(vec![event]);
        self.stats.permits_consumed += 1;
        debug!(nonce = %nonce, value = %value, "Permit accepted");
        Ok(())
    }

    #[instrument(skip(self), fields(caller = %caller, amount = %amount))]
    fn burn(&mut self, caller: Address, amount: U256) -> Result<(), TokenError> {
        self.ensure(&caller, Capability::BurnControl)?;
        let event = self.ledger.burn(caller, amount)?;
        self.commit(vec![event]);
        info!(supply = %self.ledger.total_supply(), "Tokens burned");
        Ok(())
    }

    #[instrument(skip(self), fields(caller = %caller, account = %account))]
    fn set_blacklist_status(
        &mut self,
        caller: Address,
        account: Address,
        blacklisted: bool,
    ) -> Result<(), TokenError> {
        self.ensure(&caller, Capability::BlacklistControl)?;
        self.registry.set_blacklisted(account, blacklisted);
        info!(blacklisted, "Blacklist updated");
        self.commit(vec![TokenEvent::BlacklistUpdated {
            account,
            blacklisted,
        }]);
        Ok(())
    }

    #[instrument(skip(self), fields(caller = %caller, account = %account))]
    fn set_tax_exempt(
        &mut self,
        caller: Address,
        account: Address,
        exempt: bool,
    ) -> Result<(), TokenError> {
        self.ensure(&caller, Capability::TaxControl)?;
        self.registry.set_tax_exempt(account, exempt);
        info!(exempt, "Tax exemption updated");
        self.commit(vec![TokenEvent::TaxExemptionUpdated { account, exempt }]);
        Ok(())
    }

    #[instrument(skip(self), fields(caller = %caller))]
    fn set_buy_tax_rate(&mut self, caller: Address, rate_bps: u16) -> Result<(), TokenError> {
        self.ensure(&caller, Capability::TaxControl)?;
        self.set_rate(TaxClass::Buy, rate_bps)
    }

    #[instrument(skip(self), fields(caller = %caller))]
    fn set_sell_tax_rate(&mut self, caller: Address, rate_bps: u16) -> Result<(), TokenError> {
        self.ensure(&caller, Capability::TaxControl)?;
        self.set_rate(TaxClass::Sell, rate_bps)
    }

    #[instrument(skip(self, recipients), fields(caller = %caller, count = recipients.len()))]
    fn replace_tax_recipients(
        &mut self,
        caller: Address,
        recipients: Vec<TaxRecipient>,
    ) -> Result<(), TokenError> {
        self.ensure(&caller, Capability::Admin)?;
        if let Err(err) = self.registry.replace_tax_recipients(recipients) {
            warn!(error = %err, "Tax recipient list rejected");
            return Err(err.into());
        }
        let recipients = self.registry.tax_recipients().to_vec();
        info!(count = recipients.len(), "Tax recipients replaced");
        self.commit(vec![TokenEvent::TaxRecipientsUpdated { recipients }]);
        Ok(())
    }

    #[instrument(skip(self), fields(caller = %caller, pool = %pool))]
    fn add_exchange_pool(&mut self, caller: Address, pool: Address) -> Result<(), TokenError> {
        self.ensure(&caller, Capability::Admin)?;
        if pool.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }
        if self.registry.add_exchange_pool(pool) {
            info!("Exchange pool added");
            self.commit(vec![TokenEvent::ExchangePoolAdded { pool }]);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(caller = %caller, pool = %pool))]
    fn remove_exchange_pool(&mut self, caller: Address, pool: Address) -> Result<(), TokenError> {
        self.ensure(&caller, Capability::Admin)?;
        if self.registry.remove_exchange_pool(&pool) {
            info!("Exchange pool removed");
            self.commit(vec![TokenEvent::ExchangePoolRemoved { pool }]);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(caller = %caller, asset = %asset, amount = %amount))]
    fn withdraw(&mut self, caller: Address, asset: Address, amount: U256) -> Result<(), TokenError> {
        self.ensure(&caller, Capability::Admin)?;
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount.into());
        }

        let mut outbox = Vec::with_capacity(2);
        if asset == self.config.contract_address {
            outbox.push(self.ledger.transfer(asset, caller, amount)?);
        } else if let Err(err) = self.vault.transfer_out(asset, caller, amount) {
            warn!(error = %err, "Withdrawal failed");
            return Err(err.into());
        }

        outbox.push(TokenEvent::AssetWithdrawn {
            asset,
            to: caller,
            amount,
        });
        info!("Asset withdrawn");
        self.commit(outbox);
        Ok(())
    }

    #[instrument(skip(self), fields(caller = %caller, capability = %capability, account = %account))]
    fn grant_capability(
        &mut self,
        caller: Address,
        capability: Capability,
        account: Address,
    ) -> Result<(), TokenError> {
        self.ensure(&caller, Capability::Admin)?;
        if account.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }
        if self.access.grant(capability, account) {
            info!("Capability granted");
            self.commit(vec![TokenEvent::CapabilityGranted {
                capability,
                account,
                sender: caller,
            }]);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(caller = %caller, capability = %capability, account = %account))]
    fn revoke_capability(
        &mut self,
        caller: Address,
        capability: Capability,
        account: Address,
    ) -> Result<(), TokenError> {
        self.ensure(&caller, Capability::Admin)?;
        if self.access.revoke(capability, account) {
            info!("Capability revoked");
            self.commit(vec![TokenEvent::CapabilityRevoked {
                capability,
                account,
                sender: caller,
            }]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryAccessControl, InMemoryEventLog, InMemoryVault, ManualClock};

    type TestService =
        TaxTokenService<InMemoryAccessControl, InMemoryEventLog, InMemoryVault, ManualClock>;

    const ADMIN: Address = Address::from_low_u8(0xa1);
    const CONTRACT: Address = Address::from_low_u8(0xc0);

    fn service(config: TokenConfig) -> TestService {
        TaxTokenService::new(
            config,
            InMemoryAccessControl::new(),
            InMemoryEventLog::new(),
            InMemoryVault::new(),
            ManualClock::new(1_000),
        )
        .unwrap()
    }

    fn config() -> TokenConfig {
        let mut config = TokenConfig::new(ADMIN, CONTRACT).with_tax_recipients(vec![
            TaxRecipient::new(Address::from_low_u8(0xb1), "ops", 10_000),
        ]);
        config.initial_supply = 1_000;
        config.decimals = 0;
        config
    }

    #[test]
    fn test_constructor_state() {
        let token = service(config());
        assert_eq!(token.total_supply(), U256::from(1_000));
        assert_eq!(token.balance_of(&ADMIN), U256::from(1_000));
        assert!(token.is_tax_exempt(&ADMIN));
        assert!(token.is_tax_exempt(&CONTRACT));
        assert!(token.is_tax_exempt(&Address::from_low_u8(0xb1)));
        assert_eq!(token.safe_harbor(), ADMIN);
        for capability in Capability::ALL {
            assert!(token.has_capability(&ADMIN, capability));
        }
        assert!(token.check_invariants().is_valid());

        let log = token.event_sink();
        assert_eq!(log.events()[0].name(), "Transfer");
        assert_eq!(log.count_named("CapabilityGranted"), 4);
        assert_eq!(log.count_named("TaxRecipientsUpdated"), 1);
    }

    #[test]
    fn test_constructor_rejects_invalid_config() {
        let result = TaxTokenService::new(
            TokenConfig::default(),
            InMemoryAccessControl::new(),
            InMemoryEventLog::new(),
            InMemoryVault::new(),
            ManualClock::new(0),
        );
        assert!(matches!(result, Err(ConfigError::ZeroAddress { .. })));
    }

    #[test]
    fn test_zero_supply_emits_no_mint() {
        let mut config = config();
        config.initial_supply = 0;
        let token = service(config);
        assert_eq!(token.event_sink().count_named("Transfer"), 0);
    }

    #[test]
    fn test_plan_does_not_mutate() {
        let token = service(config());
        let user = Address::from_low_u8(1);
        let plan = token.plan_transfer(ADMIN, user, U256::from(10), None).unwrap();
        assert_eq!(plan.class, TaxClass::Exempt);
        assert_eq!(plan.net_amount, U256::from(10));
        assert_eq!(token.balance_of(&user), U256::zero());
    }

    #[test]
    fn test_stats_track_outcomes() {
        let mut token = service(config());
        let user = Address::from_low_u8(1);
        token.transfer(ADMIN, user, U256::from(10)).unwrap();
        assert!(token.transfer(user, ADMIN, U256::from(11)).is_err());
        assert_eq!(token.stats().transfers_settled, 1);
        assert_eq!(token.stats().transfers_aborted, 1);
        assert_eq!(token.stats().tax_collected, U256::zero());
    }

    #[test]
    fn test_rate_setter_emits_old_and_new() {
        let mut token = service(config());
        token.set_buy_tax_rate(ADMIN, 250).unwrap();
        assert_eq!(
            token.event_sink().events().last(),
            Some(&TokenEvent::BuyTaxRateUpdated {
                old_rate: 1000,
                new_rate: 250
            })
        );
        assert_eq!(token.buy_tax_rate(), 250);
        assert_eq!(token.sell_tax_rate(), 1000);
    }
}
