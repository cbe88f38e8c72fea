//! Shared types for the Kraken Helper service.
//!
//! These types form the data model passed between the sizing/withdrawal
//! strategies, the exchange gateway and the action engine. None of them
//! outlive a single invocation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

/// Account balance snapshot keyed by exchange asset symbol (`ZEUR`, `XXBT`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balances(HashMap<String, Decimal>);

impl Balances {
    /// Balance for `symbol`. Symbols the exchange did not report read as zero.
    pub fn get(&self, symbol: &str) -> Decimal {
        self.0.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }
}

impl FromIterator<(String, Decimal)> for Balances {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Order direction. The service only ever buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
}

impl OrderSide {
    /// Wire value for Kraken's `type` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type. Only limit orders are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
}

impl OrderType {
    /// Wire value for Kraken's `ordertype` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Limit => "limit",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Intents
// ---------------------------------------------------------------------------

/// A fully-sized order, ready to hand to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderIntent {
    pub pair: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Decimal,
    pub volume: Decimal,
    /// Ask the exchange to validate the order without placing it.
    pub validate_only: bool,
}

impl OrderIntent {
    pub fn limit_buy(pair: &str, price: Decimal, volume: Decimal, validate_only: bool) -> Self {
        Self {
            pair: pair.to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            price,
            volume,
            validate_only,
        }
    }
}

impl fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} @ {}",
            self.order_type, self.side, self.volume, self.pair, self.price
        )?;
        if self.validate_only {
            write!(f, " (validate only)")?;
        }
        Ok(())
    }
}

/// A withdrawal of the held asset to a pre-registered destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawalIntent {
    pub asset: String,
    /// Name of the withdrawal address as registered on the exchange.
    pub destination_key: String,
    pub amount: Decimal,
}

impl fmt::Display for WithdrawalIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "withdraw {} {} to '{}'", self.amount, self.asset, self.destination_key)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of a completed buy invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BuyOutcome {
    pub order: OrderIntent,
    /// Whether the volume was shrunk to the available fiat balance.
    pub adjusted: bool,
    /// Remote result echoed back from the exchange.
    pub result: serde_json::Value,
}

impl BuyOutcome {
    pub fn summary(&self) -> String {
        let mut msg = format!("Order placed successfully: {}", self.order);
        if self.adjusted {
            msg.push_str(" (volume adjusted to available balance)");
        }
        msg.push_str(&format!(". Result: {}", self.result));
        msg
    }
}

/// Result of a completed withdraw invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WithdrawOutcome {
    Withdrawn {
        withdrawal: WithdrawalIntent,
        result: serde_json::Value,
    },
    Skipped {
        reason: String,
    },
}

impl WithdrawOutcome {
    pub fn summary(&self) -> String {
        match self {
            WithdrawOutcome::Withdrawn { withdrawal, result } => {
                format!("Withdrawal initiated successfully: {withdrawal}. Result: {result}")
            }
            WithdrawOutcome::Skipped { reason } => {
                format!("No withdrawal initiated. {reason}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Error taxonomy for a single buy/withdraw invocation.
#[derive(Debug, thiserror::Error)]
pub enum HelperError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote call failed ({operation}): {message}")]
    RemoteCall { operation: String, message: String },

    #[error("Insufficient fiat for transaction. Tried to buy {volume} for {price} each, available balance {available}")]
    InsufficientFunds {
        volume: Decimal,
        price: Decimal,
        available: Decimal,
    },

    #[error("Invalid order volume: {0}")]
    InvalidVolume(String),

    #[error("Notification failed: {0}")]
    Notification(String),
}

impl HelperError {
    /// Wrap a gateway failure, keeping the full context chain in the message.
    pub fn remote(operation: &str, err: anyhow::Error) -> Self {
        HelperError::RemoteCall {
            operation: operation.to_string(),
            message: format!("{err:#}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
