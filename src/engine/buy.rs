//! Buy action: ask price → balance → size → limit order → notify.

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::ActionContext;
use crate::notify::notify_best_effort;
use crate::strategy::SizingResolver;
use crate::types::{BuyOutcome, HelperError, OrderIntent};

/// Run one buy invocation and report its outcome.
///
/// The notification is sent whatever the result; its own failure is
/// swallowed and does not affect the returned value.
pub async fn execute_buy(ctx: &ActionContext) -> Result<BuyOutcome, HelperError> {
    let span = info_span!("buy", invocation = %Uuid::new_v4());

    async move {
        let outcome = run_buy(ctx).await;

        let message = match &outcome {
            Ok(o) => o.summary(),
            Err(e) => {
                warn!(error = %e, "Buy failed");
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

async fn run_buy(ctx: &ActionContext) -> Result<BuyOutcome, HelperError> {
    ctx.notifier()?;
    let gateway = ctx.gateway()?;
    let settings = &ctx.buy;

    let ask = gateway
        .get_ask_price(&settings.pair)
        .await
        .map_err(|e| HelperError::remote("Ticker", e))?;

    let balances = gateway
        .get_balances()
        .await
        .map_err(|e| HelperError::remote("Balance", e))?;
    let available = balances.get(&settings.fiat_asset);

    let sized = SizingResolver::new(settings.sizing.clone()).resolve(settings.budget, ask, available)?;

    let order = OrderIntent::limit_buy(
        &settings.pair,
        sized.price,
        sized.volume,
        settings.validate_only,
    );

    info!(
        order = %order,
        ask = %ask,
        available = %available,
        adjusted = sized.adjusted,
        "Submitting limit buy"
    );

    let result = gateway
        .submit_limit_buy(&order)
        .await
        .map_err(|e| HelperError::remote("AddOrder", e))?;

    Ok(BuyOutcome {
        order,
        adjusted: sized.adjusted,
        result,
    })
}
