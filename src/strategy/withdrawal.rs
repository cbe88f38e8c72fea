//! Threshold-gated withdrawal.
//!
//! Once the held balance reaches the threshold, the entire balance is
//! withdrawn, not just the threshold amount.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct WithdrawalPolicy {
    /// Minimum held amount (in asset units) before a withdrawal is due.
    pub threshold: Decimal,
}

impl Default for WithdrawalPolicy {
    fn default() -> Self {
        Self { threshold: dec!(0.002) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalDecision {
    Withdraw { amount: Decimal },
    NoOp { reason: String },
}

impl WithdrawalDecision {
    pub fn is_withdraw(&self) -> bool {
        matches!(self, WithdrawalDecision::Withdraw { .. })
    }
}

impl WithdrawalPolicy {
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold }
    }

    /// Inclusive: a balance exactly at the threshold is withdrawn.
    pub fn decide(&self, held: Decimal) -> WithdrawalDecision {
        if held >= self.threshold {
            debug!(held = %held, threshold = %self.threshold, "Withdrawal due");
            WithdrawalDecision::Withdraw { amount: held }
        } else {
            let shortfall = self.threshold - held;
            WithdrawalDecision::NoOp {
                reason: format!(
                    "Insufficient balance: holding {held}, threshold {}, short by {shortfall}",
                    self.threshold
                ),
            }
        }
    }
}
