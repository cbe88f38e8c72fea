//! Order sizing.
//!
//! Turns a fixed fiat budget, the live ask price and the available fiat
//! balance into a limit price and volume. When the account cannot cover the
//! full budget but still holds at least the adjustment floor, the whole
//! available balance is spent instead.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::types::HelperError;

// ---------------------------------------------------------------------------
// Configuration (defaults, overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SizingConfig {
    /// Added to the raw ask so the limit order crosses the book.
    pub buffer: Decimal,
    /// Below this fiat balance an underfunded order is rejected outright.
    pub min_balance_for_adjustment: Decimal,
    /// Decimal places accepted by the exchange for the limit price.
    pub price_decimals: u32,
    /// Decimal places for order volume (1 satoshi = 8).
    pub volume_decimals: u32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            buffer: dec!(20.00),
            min_balance_for_adjustment: dec!(4.00),
            price_decimals: 2,
            volume_decimals: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Limit price and volume for one buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizedOrder {
    pub price: Decimal,
    pub volume: Decimal,
    /// True when the volume was recomputed from the available balance.
    pub adjusted: bool,
}

pub struct SizingResolver {
    config: SizingConfig,
}

impl SizingResolver {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    /// Limit price for a raw ask: ask plus buffer, rounded half away from zero.
    pub fn effective_price(&self, raw_ask: Decimal) -> Result<Decimal, HelperError> {
        let price = raw_ask.checked_add(self.config.buffer).ok_or_else(|| {
            HelperError::InvalidVolume(format!(
                "ask {raw_ask} plus buffer {} overflows",
                self.config.buffer
            ))
        })?;
        Ok(price.round_dp_with_strategy(
            self.config.price_decimals,
            RoundingStrategy::MidpointAwayFromZero,
        ))
    }

    /// `amount / price`, truncated to the volume precision.
    fn volume_for(&self, amount: Decimal, price: Decimal) -> Result<Decimal, HelperError> {
        let raw = amount.checked_div(price).ok_or_else(|| {
            HelperError::InvalidVolume(format!("cannot divide {amount} by price {price}"))
        })?;
        Ok(raw.round_dp_with_strategy(self.config.volume_decimals, RoundingStrategy::ToZero))
    }

    /// Size a limit buy.
    ///
    /// All comparisons are made on the already-rounded price and volume, so
    /// the adjustment decision matches what is actually sent to the exchange.
    pub fn resolve(
        &self,
        budget: Decimal,
        raw_ask: Decimal,
        available: Decimal,
    ) -> Result<SizedOrder, HelperError> {
        let price = self.effective_price(raw_ask)?;
        if price <= Decimal::ZERO {
            return Err(HelperError::InvalidVolume(format!(
                "effective price {price} is not positive (ask {raw_ask})"
            )));
        }

        let mut volume = self.volume_for(budget, price)?;
        let mut adjusted = false;

        let cost = price.checked_mul(volume).ok_or_else(|| {
            HelperError::InvalidVolume(format!("cost of {volume} at {price} overflows"))
        })?;

        if available < cost {
            if available >= self.config.min_balance_for_adjustment {
                let shrunk = self.volume_for(available, price)?;
                debug!(
                    budget = %budget,
                    available = %available,
                    from = %volume,
                    to = %shrunk,
                    "Budget not covered, spending available balance instead"
                );
                volume = shrunk;
                adjusted = true;
            } else {
                return Err(HelperError::InsufficientFunds {
                    volume,
                    price,
                    available,
                });
            }
        }

        if volume <= Decimal::ZERO {
            return Err(HelperError::InvalidVolume(format!(
                "volume {volume} at price {price} rounds to nothing"
            )));
        }

        debug!(
            raw_ask = %raw_ask,
            price = %price,
            volume = %volume,
            adjusted,
            "Order sized"
        );

        Ok(SizedOrder { price, volume, adjusted })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
