//! Action engine — one buy or withdraw invocation, start to finish.
//!
//! Each action runs strictly in sequence: remote reads, a pure decision,
//! at most one remote write, then a best-effort notification. The
//! `ActionContext` is built once at startup and shared read-only between
//! requests.

pub mod buy;
pub mod withdraw;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use crate::exchange::ExchangeGateway;
use crate::notify::Notifier;
use crate::strategy::{SizingConfig, WithdrawalPolicy};
use crate::types::HelperError;

pub use buy::execute_buy;
pub use withdraw::execute_withdraw;

#[derive(Debug, Clone)]
pub struct BuySettings {
    /// Pair as sent to the exchange (`XBTEUR`).
    pub pair: String,
    /// Balance symbol holding the fiat used to pay (`ZEUR`).
    pub fiat_asset: String,
    /// Fiat amount spent per invocation.
    pub budget: Decimal,
    pub validate_only: bool,
    pub sizing: SizingConfig,
}

impl Default for BuySettings {
    fn default() -> Self {
        Self {
            pair: "XBTEUR".to_string(),
            fiat_asset: "ZEUR".to_string(),
            budget: dec!(5.00),
            validate_only: false,
            sizing: SizingConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WithdrawSettings {
    /// Balance symbol of the held asset (`XXBT`).
    pub balance_asset: String,
    /// Asset name expected by the withdraw endpoint (`XBT`).
    pub withdraw_asset: String,
    /// Withdrawal address name registered on the exchange.
    pub destination_key: Option<String>,
    pub policy: WithdrawalPolicy,
}

impl Default for WithdrawSettings {
    fn default() -> Self {
        Self {
            balance_asset: "XXBT".to_string(),
            withdraw_asset: "XBT".to_string(),
            destination_key: None,
            policy: WithdrawalPolicy::default(),
        }
    }
}

/// Everything an invocation needs, passed in explicitly.
pub struct ActionContext {
    /// `None` when exchange credentials are not configured.
    pub gateway: Option<Arc<dyn ExchangeGateway>>,
    /// `None` when no webhook is configured and log-only delivery was not
    /// opted into.
    pub notifier: Option<Arc<dyn Notifier>>,
    pub buy: BuySettings,
    pub withdraw: WithdrawSettings,
}

impl ActionContext {
    pub fn gateway(&self) -> Result<&dyn ExchangeGateway, HelperError> {
        self.gateway
            .as_deref()
            .ok_or_else(|| HelperError::Config("Kraken API key and secret are not configured".into()))
    }

    pub fn notifier(&self) -> Result<&dyn Notifier, HelperError> {
        self.notifier
            .as_deref()
            .ok_or_else(|| HelperError::Config("Slack webhook URL is not configured".into()))
    }

    pub fn destination_key(&self) -> Result<&str, HelperError> {
        self.withdraw
            .destination_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| HelperError::Config("Withdrawal destination key is not configured".into()))
    }
}
