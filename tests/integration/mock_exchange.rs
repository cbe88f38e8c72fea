//! Mock exchange and notifier for integration testing.
//!
//! Provides deterministic `ExchangeGateway` and `Notifier` implementations
//! that hold prices and balances in memory and record every call. No
//! network access.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

use kraken_helper::exchange::ExchangeGateway;
use kraken_helper::notify::Notifier;
use kraken_helper::types::{Balances, OrderIntent, WithdrawalIntent};

/// A mock exchange account.
///
/// Cloning shares the underlying state, so a test can keep a handle while
/// the service owns another.
#[derive(Clone)]
pub struct MockExchange {
    ask: Decimal,
    balances: Balances,
    calls: Arc<Mutex<Vec<String>>>,
    orders: Arc<Mutex<Vec<OrderIntent>>>,
    withdrawals: Arc<Mutex<Vec<WithdrawalIntent>>>,
    /// If set, every remote call fails with this message.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockExchange {
    pub fn new(ask: Decimal, balances: &[(&str, Decimal)]) -> Self {
        Self {
            ask,
            balances: balances
                .iter()
                .map(|(symbol, amount)| (symbol.to_string(), *amount))
                .collect(),
            calls: Arc::new(Mutex::new(Vec::new())),
            orders: Arc::new(Mutex::new(Vec::new())),
            withdrawals: Arc::new(Mutex::new(Vec::new())),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Force all subsequent remote calls to fail.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Names of the remote methods called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn orders(&self) -> Vec<OrderIntent> {
        self.orders.lock().unwrap().clone()
    }

    pub fn withdrawals(&self) -> Vec<WithdrawalIntent> {
        self.withdrawals.lock().unwrap().clone()
    }

    fn record(&self, method: &str) -> Result<()> {
        self.calls.lock().unwrap().push(method.to_string());
        match self.force_error.lock().unwrap().as_ref() {
            Some(msg) => Err(anyhow!("Kraken {method} returned errors: {msg}")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ExchangeGateway for MockExchange {
    async fn get_ask_price(&self, _pair: &str) -> Result<Decimal> {
        self.record("Ticker")?;
        Ok(self.ask)
    }

    async fn get_balances(&self) -> Result<Balances> {
        self.record("Balance")?;
        Ok(self.balances.clone())
    }

    async fn submit_limit_buy(&self, order: &OrderIntent) -> Result<serde_json::Value> {
        self.record("AddOrder")?;
        let mut orders = self.orders.lock().unwrap();
        orders.push(order.clone());
        Ok(serde_json::json!({
            "descr": { "order": order.to_string() },
            "txid": [format!("MOCK-{}", orders.len())],
        }))
    }

    async fn submit_withdrawal(&self, withdrawal: &WithdrawalIntent) -> Result<serde_json::Value> {
        self.record("Withdraw")?;
        let mut withdrawals = self.withdrawals.lock().unwrap();
        withdrawals.push(withdrawal.clone());
        Ok(serde_json::json!({ "refid": format!("REF-{}", withdrawals.len()) }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Records every message; optionally fails each delivery after recording it.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        self.messages.lock().unwrap().push(text.to_string());
        if self.fail {
            Err(anyhow!("webhook returned 503 Service Unavailable"))
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests for the mocks themselves
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_records_calls_in_order() {
        let mock = MockExchange::new(dec!(100), &[("ZEUR", dec!(10))]);
        mock.get_ask_price("XBTEUR").await.unwrap();
        mock.get_balances().await.unwrap();
        assert_eq!(mock.calls(), vec!["Ticker", "Balance"]);
    }

    #[tokio::test]
    async fn test_mock_forced_error() {
        let mock = MockExchange::new(dec!(100), &[]);
        mock.set_error("EAPI:Invalid nonce");
        let err = mock.get_balances().await.unwrap_err();
        assert!(err.to_string().contains("EAPI:Invalid nonce"));
    }

    #[tokio::test]
    async fn test_failing_notifier_still_records() {
        let notifier = RecordingNotifier::failing();
        assert!(notifier.notify("hi").await.is_err());
        assert_eq!(notifier.messages(), vec!["hi"]);
    }
}
