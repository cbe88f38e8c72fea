//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` (optional; every field has a default) and
//! deserializes into strongly-typed structs. Secrets are referenced by
//! env-var name in the config and resolved at startup via `std::env::var`.
//! `PORT` and `BUY_AMOUNT` override the file when set.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::engine::{BuySettings, WithdrawSettings};
use crate::strategy::{SizingConfig, WithdrawalPolicy};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub exchange: ExchangeConfig,
    pub buy: BuyConfig,
    pub withdraw: WithdrawConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExchangeConfig {
    pub pair: String,
    /// Balance symbol of the fiat currency.
    pub fiat_asset: String,
    /// Balance symbol of the purchased asset.
    pub crypto_asset: String,
    /// Asset name used by the withdraw endpoint.
    pub withdraw_asset: String,
    /// Send orders with `validate=true` (checked by Kraken, never placed).
    pub validate_only: bool,
    pub api_key_env: String,
    pub api_secret_env: String,
    pub withdrawal_key_env: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            pair: "XBTEUR".into(),
            fiat_asset: "ZEUR".into(),
            crypto_asset: "XXBT".into(),
            withdraw_asset: "XBT".into(),
            validate_only: false,
            api_key_env: "KRAKEN_API_KEY".into(),
            api_secret_env: "KRAKEN_API_SECRET".into(),
            withdrawal_key_env: "KRAKEN_WITHDRAWAL_KEY".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BuyConfig {
    pub budget: Decimal,
    pub buffer: Decimal,
    pub min_balance_for_adjustment: Decimal,
    pub price_decimals: u32,
    pub volume_decimals: u32,
}

impl Default for BuyConfig {
    fn default() -> Self {
        let sizing = SizingConfig::default();
        Self {
            budget: dec!(5.00),
            buffer: sizing.buffer,
            min_balance_for_adjustment: sizing.min_balance_for_adjustment,
            price_decimals: sizing.price_decimals,
            volume_decimals: sizing.volume_decimals,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WithdrawConfig {
    pub threshold: Decimal,
}

impl Default for WithdrawConfig {
    fn default() -> Self {
        Self {
            threshold: WithdrawalPolicy::default().threshold,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotifyConfig {
    pub webhook_url_env: String,
    /// Write outcomes to the log instead of Slack when no webhook is set.
    /// Off by default: a missing webhook fails both actions.
    pub log_only: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url_env: "SLACK_WEBHOOK_URL".into(),
            log_only: false,
        }
    }
}

/// Secret and per-deployment values resolved from the environment.
/// Empty variables count as unset.
pub struct Secrets {
    pub api_key: Option<SecretString>,
    pub api_secret: Option<SecretString>,
    pub withdrawal_key: Option<String>,
    pub webhook_url: Option<SecretString>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise start from defaults. Then
    /// apply environment overrides.
    pub fn load_or_default(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::load(path)?
        } else {
            info!(path, "No config file found, using defaults");
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `PORT` and `BUY_AMOUNT` overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port: {port}"))?;
        }
        if let Some(amount) = lookup("BUY_AMOUNT").filter(|v| !v.is_empty()) {
            self.buy.budget = Decimal::from_str(&amount)
                .with_context(|| format!("BUY_AMOUNT is not a decimal: {amount}"))?;
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.is_empty())
    }

    pub fn resolve_secrets(&self) -> Secrets {
        Secrets {
            api_key: Self::resolve_env(&self.exchange.api_key_env).map(SecretString::new),
            api_secret: Self::resolve_env(&self.exchange.api_secret_env).map(SecretString::new),
            withdrawal_key: Self::resolve_env(&self.exchange.withdrawal_key_env),
            webhook_url: Self::resolve_env(&self.notify.webhook_url_env).map(SecretString::new),
        }
    }

    pub fn sizing_config(&self) -> SizingConfig {
        SizingConfig {
            buffer: self.buy.buffer,
            min_balance_for_adjustment: self.buy.min_balance_for_adjustment,
            price_decimals: self.buy.price_decimals,
            volume_decimals: self.buy.volume_decimals,
        }
    }

    pub fn buy_settings(&self) -> BuySettings {
        BuySettings {
            pair: self.exchange.pair.clone(),
            fiat_asset: self.exchange.fiat_asset.clone(),
            budget: self.buy.budget,
            validate_only: self.exchange.validate_only,
            sizing: self.sizing_config(),
        }
    }

    pub fn withdraw_settings(&self, destination_key: Option<String>) -> WithdrawSettings {
        WithdrawSettings {
            balance_asset: self.exchange.crypto_asset.clone(),
            withdraw_asset: self.exchange.withdraw_asset.clone(),
            destination_key,
            policy: WithdrawalPolicy::new(self.withdraw.threshold),
        }
    }
}
