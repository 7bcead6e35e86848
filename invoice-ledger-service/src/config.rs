use rust_decimal::Decimal;
use serde::Deserialize;
use service_core::config::{self as core_config, get_env, parse_env};
use service_core::error::AppError;

use crate::models::invoice::normalize_currency;
use crate::services::tax::DEFAULT_VAT_RATE;

/// Upper bound for `LEDGER_DEFAULT_DUE_DAYS`, ten years.
pub const MAX_DUE_DAYS: i64 = 3650;

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub ledger: LedgerSettings,
}

/// Business defaults for the ledger.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LedgerSettings {
    pub default_currency: String,
    pub default_due_days: i64,
    /// Fraction, e.g. `0.16`.
    pub vat_rate: Decimal,
    pub default_payment_method: String,
    pub id_strategy: IdStrategy,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            default_currency: "ZMW".to_string(),
            default_due_days: 14,
            vat_rate: DEFAULT_VAT_RATE,
            default_payment_method: "mobile_money".to_string(),
            id_strategy: IdStrategy::Uuid,
        }
    }
}

/// How entry ids are minted.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// `INV-<uuid>`
    Uuid,
    /// `INV-001`, `INV-002`, ...
    Sequential,
}

impl std::str::FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uuid" => Ok(IdStrategy::Uuid),
            "sequential" => Ok(IdStrategy::Sequential),
            _ => Err(format!("Invalid id strategy: {}", s)),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let defaults = LedgerSettings::default();

        let otlp_endpoint = get_env("OTLP_ENDPOINT", Some(""))?;

        let config = LedgerConfig {
            common: common_config,
            service_name: get_env("SERVICE_NAME", Some("invoice-ledger-service"))?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")))?,
            log_level: get_env("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: Some(otlp_endpoint).filter(|e| !e.trim().is_empty()),
            ledger: LedgerSettings {
                default_currency: get_env(
                    "LEDGER_DEFAULT_CURRENCY",
                    Some(&defaults.default_currency),
                )?
                .trim()
                .to_ascii_uppercase(),
                default_due_days: parse_env("LEDGER_DEFAULT_DUE_DAYS", "14")?,
                vat_rate: parse_env("LEDGER_VAT_RATE", "0.16")?,
                default_payment_method: get_env(
                    "LEDGER_DEFAULT_PAYMENT_METHOD",
                    Some(&defaults.default_payment_method),
                )?,
                id_strategy: parse_env("LEDGER_ID_STRATEGY", "uuid")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the ledger cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0..=MAX_DUE_DAYS).contains(&self.ledger.default_due_days) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LEDGER_DEFAULT_DUE_DAYS must be between 0 and {}",
                MAX_DUE_DAYS
            )));
        }
        let currency = normalize_currency(&self.ledger.default_currency).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("LEDGER_DEFAULT_CURRENCY: {}", e))
        })?;
        if currency != self.ledger.default_currency {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LEDGER_DEFAULT_CURRENCY must be an upper-case code, got '{}'",
                self.ledger.default_currency
            )));
        }
        if self.ledger.vat_rate < Decimal::ZERO || self.ledger.vat_rate > Decimal::ONE {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LEDGER_VAT_RATE must be between 0 and 1"
            )));
        }
        if self.ledger.default_payment_method.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LEDGER_DEFAULT_PAYMENT_METHOD cannot be empty"
            )));
        }
        Ok(())
    }
}
