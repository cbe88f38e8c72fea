//! Withdraw action: balance → threshold decision → withdraw if due → notify.

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::ActionContext;
use crate::notify::notify_best_effort;
use crate::strategy::WithdrawalDecision;
use crate::types::{HelperError, WithdrawOutcome, WithdrawalIntent};

/// Run one withdraw invocation and report its outcome.
///
/// A balance below the threshold is a successful no-op, not an error.
pub async fn execute_withdraw(ctx: &ActionContext) -> Result<WithdrawOutcome, HelperError> {
    let span = info_span!("withdraw", invocation = %Uuid::new_v4());

    async move {
        let outcome = run_withdraw(ctx).await;

        let message = match &outcome {
            Ok(o) => o.summary(),
            Err(e) => {
                warn!(error = %e, "Withdraw failed");
                format!("Error: {e}")
            }
        };
        match ctx.notifier.as_deref() {
            Some(notifier) => {
                notify_best_effort(notifier, &message).await;
            }
            None => warn!(message = %message, "No notifier configured, outcome not delivered"),
        }

        outcome
    }
    .instrument(span)
    .await
}

async fn run_withdraw(ctx: &ActionContext) -> Result<WithdrawOutcome, HelperError> {
    ctx.notifier()?;
    let gateway = ctx.gateway()?;
    let destination = ctx.destination_key()?;
    let settings = &ctx.withdraw;

    let balances = gateway
        .get_balances()
        .await
        .map_err(|e| HelperError::remote("Balance", e))?;
    let held = balances.get(&settings.balance_asset);

    match settings.policy.decide(held) {
        WithdrawalDecision::NoOp { reason } => {
            info!(held = %held, threshold = %settings.policy.threshold, "Withdrawal not due");
            Ok(WithdrawOutcome::Skipped { reason })
        }
        WithdrawalDecision::Withdraw { amount } => {
            let withdrawal = WithdrawalIntent {
                asset: settings.withdraw_asset.clone(),
                destination_key: destination.to_string(),
                amount,
            };

            info!(withdrawal = %withdrawal, "Submitting withdrawal");

            let result = gateway
                .submit_withdrawal(&withdrawal)
                .await
                .map_err(|e| HelperError::remote("Withdraw", e))?;

            Ok(WithdrawOutcome::Withdrawn { withdrawal, result })
        }
    }
}
