//! Kraken Helper — entry point.
//!
//! Loads configuration, initialises structured logging, builds the Kraken
//! and Slack clients once, and serves the trigger endpoints until shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use kraken_helper::config::AppConfig;
use kraken_helper::engine::ActionContext;
use kraken_helper::exchange::kraken::KrakenClient;
use kraken_helper::exchange::ExchangeGateway;
use kraken_helper::notify::slack::SlackNotifier;
use kraken_helper::notify::{LogNotifier, Notifier};
use kraken_helper::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cfg = AppConfig::load_or_default("config.toml")?;
    let secrets = cfg.resolve_secrets();

    info!(
        pair = %cfg.exchange.pair,
        budget = %cfg.buy.budget,
        buffer = %cfg.buy.buffer,
        withdraw_threshold = %cfg.withdraw.threshold,
        validate_only = cfg.exchange.validate_only,
        "Kraken Helper starting up"
    );

    // -- Exchange client --------------------------------------------------

    let gateway: Option<Arc<dyn ExchangeGateway>> = match (secrets.api_key, secrets.api_secret) {
        (Some(key), Some(secret)) => {
            let client = KrakenClient::new(key, secret)?;
            info!(exchange = client.name(), "Exchange client ready");
            Some(Arc::new(client))
        }
        _ => {
            warn!(
                key_env = %cfg.exchange.api_key_env,
                secret_env = %cfg.exchange.api_secret_env,
                "Exchange credentials not set, /buy and /withdraw will fail"
            );
            None
        }
    };

    if secrets.withdrawal_key.is_none() {
        warn!(
            env = %cfg.exchange.withdrawal_key_env,
            "Withdrawal destination not set, /withdraw will fail"
        );
    }

    // -- Notifier -----------------------------------------------------------

    let notifier: Option<Arc<dyn Notifier>> = match secrets.webhook_url {
        Some(url) => Some(Arc::new(SlackNotifier::new(url)?)),
        None if cfg.notify.log_only => {
            warn!(
                env = %cfg.notify.webhook_url_env,
                "No webhook configured, notifications go to the log only"
            );
            Some(Arc::new(LogNotifier))
        }
        None => {
            warn!(
                env = %cfg.notify.webhook_url_env,
                "No webhook configured, /buy and /withdraw will fail"
            );
            None
        }
    };

    let ctx = ActionContext {
        gateway,
        notifier,
        buy: cfg.buy_settings(),
        withdraw: cfg.withdraw_settings(secrets.withdrawal_key),
    };

    server::serve(Arc::new(ctx), cfg.server.port).await?;

    info!("Kraken Helper shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kraken_helper=info,tower_http=info"));

    let json_logging = std::env::var("KRAKEN_HELPER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
