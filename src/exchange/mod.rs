//! Exchange integrations.
//!
//! Defines the `ExchangeGateway` trait consumed by the action engine and
//! provides the Kraken REST implementation.

pub mod kraken;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{Balances, OrderIntent, WithdrawalIntent};

/// Abstraction over a spot exchange account.
///
/// Every method is a single remote round-trip. Failures (transport or
/// exchange-reported) come back as errors; nothing is retried here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Current best ask for `pair`.
    async fn get_ask_price(&self, pair: &str) -> Result<Decimal>;

    /// Snapshot of all account balances.
    async fn get_balances(&self) -> Result<Balances>;

    /// Place a limit buy. Returns the exchange's result payload verbatim.
    async fn submit_limit_buy(&self, order: &OrderIntent) -> Result<serde_json::Value>;

    /// Withdraw to a pre-registered destination. Returns the exchange's
    /// result payload verbatim.
    async fn submit_withdrawal(&self, withdrawal: &WithdrawalIntent) -> Result<serde_json::Value>;

    /// Exchange name for logging.
    fn name(&self) -> &'static str;
}
