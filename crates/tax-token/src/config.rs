//! # Token Configuration
//!
//! Deployment parameters for a token instance, built in code or parsed from
//! TOML.
//!
//! ## Config File Format
//!
//! ```toml
//! name = "Harbor Token"
//! symbol = "HBR"
//! decimals = 18
//! initial_supply = 1000000
//! chain_id = 1
//! contract_address = "0x00000000000000000000000000000000000000c0"
//! admin = "0x00000000000000000000000000000000000000a1"
//! buy_tax_bps = 1000
//! sell_tax_bps = 1000
//!
//! [[tax_recipients]]
//! wallet = "0x00000000000000000000000000000000000000b1"
//! label = "marketing"
//! share = 10000
//! ```
//!
//! `safe_harbor` is optional and defaults to `admin`.

use crate::domain::entities::TaxRecipient;
use crate::domain::registry::validate_recipients;
use crate::domain::tax::check_rate;
use crate::domain::value_objects::{Address, U256};
use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default display decimals.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Default buy and sell rate (10%).
pub const DEFAULT_TAX_BPS: u16 = 1_000;

/// Token deployment configuration.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Token name; also the signature domain name.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Display decimals.
    pub decimals: u8,
    /// Supply minted to `admin` at construction, in whole tokens.
    pub initial_supply: u64,
    /// Chain id bound into permit signatures.
    pub chain_id: u64,
    /// Address of the token contract itself.
    #[serde_as(as = "DisplayFromStr")]
    pub contract_address: Address,
    /// Initial holder of every capability and of the initial supply.
    #[serde_as(as = "DisplayFromStr")]
    pub admin: Address,
    /// Only destination open to blacklisted senders. `None` means `admin`.
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub safe_harbor: Option<Address>,
    /// Initial buy rate.
    pub buy_tax_bps: u16,
    /// Initial sell rate.
    pub sell_tax_bps: u16,
    /// Initial recipient list. Empty means none installed.
    pub tax_recipients: Vec<TaxRecipient>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "Tax Token".to_string(),
            symbol: "TAX".to_string(),
            decimals: DEFAULT_DECIMALS,
            initial_supply: 1_000_000_000,
            chain_id: 1,
            contract_address: Address::ZERO,
            admin: Address::ZERO,
            safe_harbor: None,
            buy_tax_bps: DEFAULT_TAX_BPS,
            sell_tax_bps: DEFAULT_TAX_BPS,
            tax_recipients: Vec::new(),
        }
    }
}

impl TokenConfig {
    /// Default parameters for a deployment at `contract_address` owned by
    /// `admin`.
    #[must_use]
    pub fn new(admin: Address, contract_address: Address) -> Self {
        Self {
            admin,
            contract_address,
            ..Self::default()
        }
    }

    /// Sets the initial recipient list.
    #[must_use]
    pub fn with_tax_recipients(mut self, recipients: Vec<TaxRecipient>) -> Self {
        self.tax_recipients = recipients;
        self
    }

    /// Sets both initial rates.
    #[must_use]
    pub fn with_tax_rates(mut self, buy_bps: u16, sell_bps: u16) -> Self {
        self.buy_tax_bps = buy_bps;
        self.sell_tax_bps = sell_bps;
        self
    }

    /// Safe-harbor address after defaulting.
    #[must_use]
    pub fn safe_harbor(&self) -> Address {
        self.safe_harbor.unwrap_or(self.admin)
    }

    /// Initial supply in ledger units (`initial_supply * 10^decimals`).
    pub fn initial_supply_units(&self) -> Result<U256, ConfigError> {
        U256::from(10u8)
            .checked_pow(U256::from(self.decimals))
            .and_then(|scale| U256::from(self.initial_supply).checked_mul(scale))
            .ok_or(ConfigError::SupplyOverflow {
                supply: self.initial_supply,
                decimals: self.decimals,
            })
    }

    /// Checks the configuration is deployable.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - name is empty
    /// - admin, contract address or an explicit safe harbor is zero
    /// - a rate exceeds 5000 bps
    /// - a non-zero rate is configured without recipients
    /// - the recipient list is invalid
    /// - the scaled supply does not fit in 256 bits
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.admin.is_zero() {
            return Err(ConfigError::ZeroAddress { field: "admin" });
        }
        if self.contract_address.is_zero() {
            return Err(ConfigError::ZeroAddress {
                field: "contract_address",
            });
        }
        if self.safe_harbor.is_some_and(|harbor| harbor.is_zero()) {
            return Err(ConfigError::ZeroAddress {
                field: "safe_harbor",
            });
        }
        check_rate(self.buy_tax_bps)?;
        check_rate(self.sell_tax_bps)?;
        if self.tax_recipients.is_empty() {
            if self.buy_tax_bps != 0 || self.sell_tax_bps != 0 {
                return Err(ValidationError::NoTaxRecipients.into());
            }
        } else {
            validate_recipients(&self.tax_recipients)?;
        }
        self.initial_supply_units()?;
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read {path}: {error}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error text.
        error: String,
    },

    /// TOML parse or render error.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Token name is blank.
    #[error("token name must not be empty")]
    EmptyName,

    /// A required address is zero.
    #[error("{field} must not be the zero address")]
    ZeroAddress {
        /// Offending field.
        field: &'static str,
    },

    /// Rates or recipients rejected.
    #[error("invalid tax setup: {0}")]
    Invalid(#[from] ValidationError),

    /// `initial_supply * 10^decimals` overflows.
    #[error("initial supply {supply} with {decimals} decimals overflows")]
    SupplyOverflow {
        /// Whole-token supply.
        supply: u64,
        /// Decimals.
        decimals: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: u8) -> Address {
        Address::from_low_u8(tag)
    }

    fn deployable() -> TokenConfig {
        TokenConfig::new(addr(0xa1), addr(0xc0))
            .with_tax_recipients(vec![TaxRecipient::new(addr(0xb1), "marketing", 10_000)])
    }

    #[test]
    fn test_default_requires_addresses() {
        assert_eq!(
            TokenConfig::default().validate(),
            Err(ConfigError::ZeroAddress { field: "admin" })
        );
        assert!(deployable().validate().is_ok());
    }

    #[test]
    fn test_safe_harbor_defaults_to_admin() {
        let mut config = deployable();
        assert_eq!(config.safe_harbor(), addr(0xa1));
        config.safe_harbor = Some(addr(0xdd));
        assert_eq!(config.safe_harbor(), addr(0xdd));
    }

    #[test]
    fn test_explicit_zero_safe_harbor_is_rejected() {
        let mut config = deployable();
        config.safe_harbor = Some(Address::ZERO);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroAddress {
                field: "safe_harbor"
            })
        );

        let text = r#"
            contract_address = "0x00000000000000000000000000000000000000c0"
            admin = "0x00000000000000000000000000000000000000a1"
            safe_harbor = "0x0000000000000000000000000000000000000000"
            buy_tax_bps = 0
            sell_tax_bps = 0
        "#;
        assert_eq!(
            TokenConfig::from_toml_str(text),
            Err(ConfigError::ZeroAddress {
                field: "safe_harbor"
            })
        );
    }

    #[test]
    fn test_nonzero_rates_need_recipients() {
        let config = TokenConfig::new(addr(1), addr(2));
        assert_eq!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::NoTaxRecipients))
        );
        assert!(config.with_tax_rates(0, 0).validate().is_ok());
    }

    #[test]
    fn test_rate_ceiling() {
        let config = deployable().with_tax_rates(5001, 0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::TaxRateTooHigh { rate: 5001, .. }))
        ));
    }

    #[test]
    fn test_initial_supply_scaling() {
        let mut config = deployable();
        config.initial_supply = 3;
        config.decimals = 2;
        assert_eq!(config.initial_supply_units().unwrap(), U256::from(300));

        config.decimals = 200;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SupplyOverflow { decimals: 200, .. })
        ));
    }

    #[test]
    fn test_parse_toml() {
        let text = r#"
            name = "Harbor Token"
            symbol = "HBR"
            initial_supply = 1000
            chain_id = 31337
            contract_address = "0x00000000000000000000000000000000000000c0"
            admin = "0x00000000000000000000000000000000000000a1"
            safe_harbor = "0x00000000000000000000000000000000000000dd"
            sell_tax_bps = 2500

            [[tax_recipients]]
            wallet = "0x00000000000000000000000000000000000000b1"
            label = "ops"
            share = 4000

            [[tax_recipients]]
            wallet = "0x00000000000000000000000000000000000000b2"
            label = "dev"
            share = 6000
        "#;
        let config = TokenConfig::from_toml_str(text).unwrap();
        assert_eq!(config.name, "Harbor Token");
        assert_eq!(config.decimals, DEFAULT_DECIMALS);
        assert_eq!(config.chain_id, 31337);
        assert_eq!(config.admin, addr(0xa1));
        assert_eq!(config.safe_harbor(), addr(0xdd));
        assert_eq!(config.buy_tax_bps, DEFAULT_TAX_BPS);
        assert_eq!(config.sell_tax_bps, 2500);
        assert_eq!(config.tax_recipients.len(), 2);
        assert_eq!(config.tax_recipients[1].wallet, addr(0xb2));
    }

    #[test]
    fn test_parse_rejects_bad_address() {
        let err = TokenConfig::from_toml_str(r#"admin = "0x1234""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = deployable();
        let text = config.to_toml_string().unwrap();
        assert_eq!(TokenConfig::from_toml_str(&text).unwrap(), config);
    }
}
