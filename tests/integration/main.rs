//! End-to-end tests: HTTP trigger → action engine → mock exchange → notifier.

mod mock_exchange;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tower::ServiceExt;

use kraken_helper::config::AppConfig;
use kraken_helper::engine::{ActionContext, BuySettings, WithdrawSettings};
use kraken_helper::exchange::ExchangeGateway;
use kraken_helper::server::build_router;

use mock_exchange::{MockExchange, RecordingNotifier};

fn context(exchange: Option<&MockExchange>, notifier: &RecordingNotifier) -> ActionContext {
    ActionContext {
        gateway: exchange.map(|e| Arc::new(e.clone()) as Arc<dyn ExchangeGateway>),
        notifier: Some(Arc::new(notifier.clone())),
        buy: BuySettings::default(),
        withdraw: WithdrawSettings {
            destination_key: Some("cold-wallet".to_string()),
            ..WithdrawSettings::default()
        },
    }
}

async fn post(ctx: ActionContext, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = build_router(Arc::new(ctx))
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

// -- Buy --

#[tokio::test]
async fn test_buy_flow_places_order_and_notifies() {
    let exchange = MockExchange::new(dec!(100.00), &[("ZEUR", dec!(10.00))]);
    let notifier = RecordingNotifier::new();

    let (status, json) = post(context(Some(&exchange), &notifier), "/buy").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["details"]["adjusted"], false);
    assert_eq!(json["details"]["result"]["txid"][0], "MOCK-1");

    assert_eq!(exchange.calls(), vec!["Ticker", "Balance", "AddOrder"]);
    let orders = exchange.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].price, dec!(120.00));
    assert_eq!(orders[0].volume, dec!(0.04166666));

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Order placed successfully"));
}

#[tokio::test]
async fn test_buy_flow_spends_available_balance_when_budget_not_covered() {
    let exchange = MockExchange::new(dec!(100.00), &[("ZEUR", dec!(10.00))]);
    let notifier = RecordingNotifier::new();
    let mut ctx = context(Some(&exchange), &notifier);
    ctx.buy.budget = dec!(20.00);

    let (status, json) = post(ctx, "/buy").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["details"]["adjusted"], true);
    assert_eq!(json["details"]["order"]["volume"].as_f64(), Some(0.08333333));
    assert_eq!(exchange.orders()[0].volume, dec!(0.08333333));
}

#[tokio::test]
async fn test_buy_flow_insufficient_funds_is_500_and_reported() {
    let exchange = MockExchange::new(dec!(100.00), &[("ZEUR", dec!(3.00))]);
    let notifier = RecordingNotifier::new();

    let (status, json) = post(context(Some(&exchange), &notifier), "/buy").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("Insufficient fiat"));
    assert!(exchange.orders().is_empty());
    assert!(notifier.messages()[0].starts_with("Error:"));
}

#[tokio::test]
async fn test_buy_flow_notifier_failure_keeps_200() {
    let exchange = MockExchange::new(dec!(100.00), &[("ZEUR", dec!(10.00))]);
    let notifier = RecordingNotifier::failing();

    let (status, json) = post(context(Some(&exchange), &notifier), "/buy").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(notifier.messages().len(), 1);
}

#[tokio::test]
async fn test_buy_flow_remote_error_is_500() {
    let exchange = MockExchange::new(dec!(100.00), &[("ZEUR", dec!(10.00))]);
    exchange.set_error("EAPI:Invalid key");
    let notifier = RecordingNotifier::new();

    let (status, json) = post(context(Some(&exchange), &notifier), "/buy").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("Ticker"));
    assert!(message.contains("EAPI:Invalid key"));
    assert_eq!(exchange.calls(), vec!["Ticker"]);
}

#[tokio::test]
async fn test_buy_flow_without_credentials_makes_no_calls() {
    let notifier = RecordingNotifier::new();

    let (status, json) = post(context(None, &notifier), "/buy").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["message"].as_str().unwrap().starts_with("Configuration error"));
    assert_eq!(notifier.messages().len(), 1);
}

// -- Withdraw --

#[tokio::test]
async fn test_withdraw_flow_at_threshold_withdraws_everything() {
    let exchange = MockExchange::new(dec!(100.00), &[("XXBT", dec!(0.002)), ("ZEUR", dec!(1))]);
    let notifier = RecordingNotifier::new();

    let (status, json) = post(context(Some(&exchange), &notifier), "/withdraw").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["details"]["action"], "withdrawn");
    assert_eq!(json["details"]["result"]["refid"], "REF-1");

    let withdrawals = exchange.withdrawals();
    assert_eq!(withdrawals.len(), 1);
    assert_eq!(withdrawals[0].amount, dec!(0.002));
    assert_eq!(withdrawals[0].asset, "XBT");
    assert_eq!(withdrawals[0].destination_key, "cold-wallet");
    assert_eq!(exchange.calls(), vec!["Balance", "Withdraw"]);
    assert!(notifier.messages()[0].starts_with("Withdrawal initiated successfully"));
}

#[tokio::test]
async fn test_withdraw_flow_below_threshold_is_successful_noop() {
    let exchange = MockExchange::new(dec!(100.00), &[("XXBT", dec!(0.0019))]);
    let notifier = RecordingNotifier::new();

    let (status, json) = post(context(Some(&exchange), &notifier), "/withdraw").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["details"]["action"], "skipped");
    assert!(json["details"]["reason"].as_str().unwrap().contains("0.0001"));
    assert!(exchange.withdrawals().is_empty());
    assert!(notifier.messages()[0].starts_with("No withdrawal initiated."));
}

#[tokio::test]
async fn test_withdraw_flow_without_destination_makes_no_calls() {
    let exchange = MockExchange::new(dec!(100.00), &[("XXBT", dec!(1))]);
    let notifier = RecordingNotifier::new();
    let mut ctx = context(Some(&exchange), &notifier);
    ctx.withdraw.destination_key = None;

    let (status, json) = post(ctx, "/withdraw").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["message"].as_str().unwrap().contains("destination"));
    assert!(exchange.calls().is_empty());
}

// -- Missing webhook --

#[tokio::test]
async fn test_buy_without_webhook_is_500_with_no_exchange_calls() {
    let exchange = MockExchange::new(dec!(100.00), &[("ZEUR", dec!(10.00))]);
    let mut ctx = context(Some(&exchange), &RecordingNotifier::new());
    ctx.notifier = None;

    let (status, json) = post(ctx, "/buy").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], "error");
    assert_eq!(
        json["message"],
        "Configuration error: Slack webhook URL is not configured"
    );
    assert!(exchange.calls().is_empty());
    assert!(exchange.orders().is_empty());
}

#[tokio::test]
async fn test_withdraw_without_webhook_is_500_with_no_exchange_calls() {
    let exchange = MockExchange::new(dec!(100.00), &[("XXBT", dec!(1))]);
    let mut ctx = context(Some(&exchange), &RecordingNotifier::new());
    ctx.notifier = None;

    let (status, json) = post(ctx, "/withdraw").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["message"].as_str().unwrap().contains("webhook"));
    assert!(exchange.calls().is_empty());
    assert!(exchange.withdrawals().is_empty());
}

// -- Wiring from config --

#[tokio::test]
async fn test_context_built_from_config() {
    let cfg = AppConfig::parse(
        r#"
        [buy]
        budget = 20
        buffer = 0

        [withdraw]
        threshold = 0.5
        "#,
    )
    .unwrap();

    let exchange = MockExchange::new(dec!(120.00), &[("ZEUR", dec!(60.00)), ("XXBT", dec!(0.4))]);
    let notifier = RecordingNotifier::new();
    let ctx = ActionContext {
        gateway: Some(Arc::new(exchange.clone()) as Arc<dyn ExchangeGateway>),
        notifier: Some(Arc::new(notifier.clone())),
        buy: cfg.buy_settings(),
        withdraw: cfg.withdraw_settings(Some("vault".into())),
    };
    let ctx = Arc::new(ctx);

    let buy = build_router(ctx.clone())
        .oneshot(Request::builder().method(Method::POST).uri("/buy").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(buy.status(), StatusCode::OK);
    assert_eq!(exchange.orders()[0].price, dec!(120.00));
    assert_eq!(exchange.orders()[0].volume, dec!(0.16666666));

    let withdraw = build_router(ctx)
        .oneshot(Request::builder().method(Method::POST).uri("/withdraw").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(withdraw.status(), StatusCode::OK);
    assert!(exchange.withdrawals().is_empty());
}
