//! Decision procedures — order sizing and withdrawal gating.
//!
//! Both are pure functions of their inputs; the engine feeds them the
//! price and balance snapshot fetched for the current invocation.

pub mod sizing;
pub mod withdrawal;

pub use sizing::{SizedOrder, SizingConfig, SizingResolver};
pub use withdrawal::{WithdrawalDecision, WithdrawalPolicy};
