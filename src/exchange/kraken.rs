//! Kraken spot REST integration.
//!
//! API docs: https://docs.kraken.com/api/
//! Base URL: https://api.kraken.com
//! Public endpoints: GET  /0/public/{method}
//! Private endpoints: POST /0/private/{method}, form-encoded, with a nonce
//!
//! Auth headers for private calls:
//! - `API-Key: {key}`
//! - `API-Sign: base64(HMAC-SHA512(base64decode(secret), path + SHA256(nonce + postdata)))`
//!
//! Every response is wrapped as `{"error": [...], "result": {...}}` and
//! numeric fields are sent as strings.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::{Digest, Sha256, Sha512};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use super::ExchangeGateway;
use crate::types::{Balances, OrderIntent, WithdrawalIntent};

type HmacSha512 = Hmac<Sha512>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://api.kraken.com";
const EXCHANGE_NAME: &str = "kraken";

// ---------------------------------------------------------------------------
// API response types (Kraken JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct KrakenResponse<T> {
    #[serde(default)]
    error: Vec<String>,
    result: Option<T>,
}

/// Ticker entry. Only the ask array is needed:
/// `a = [price, whole lot volume, lot volume]`.
#[derive(Debug, Deserialize)]
struct TickerInfo {
    a: Vec<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct KrakenClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
    api_secret: SecretString,
    /// Last nonce sent; private calls must use strictly increasing nonces.
    last_nonce: AtomicU64,
}

impl KrakenClient {
    /// Create a new Kraken client. The secret must be the base64 string
    /// shown by Kraken when the key was generated.
    pub fn new(api_key: SecretString, api_secret: SecretString) -> Result<Self> {
        STANDARD
            .decode(api_secret.expose_secret())
            .context("Kraken API secret is not valid base64")?;

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("kraken-helper/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for Kraken")?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            api_key,
            api_secret,
            last_nonce: AtomicU64::new(0),
        })
    }

    // -- Internal helpers ------------------------------------------------

    /// Microsecond timestamp, bumped if needed so it never repeats.
    fn next_nonce(&self) -> u64 {
        let now = Utc::now().timestamp_micros().max(0) as u64;
        let prev = self
            .last_nonce
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(prev + 1)
    }

    async fn public<T: DeserializeOwned>(&self, method: &str, query: &str) -> Result<T> {
        let url = format!("{}/0/public/{method}?{query}", self.base_url);
        debug!(url = %url, "Kraken public request");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Kraken {method} request failed"))?;

        Self::unwrap_response(method, resp).await
    }

    async fn private<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let path = format!("/0/private/{method}");
        let nonce = self.next_nonce().to_string();
        let postdata = encode_form(&nonce, params);
        let signature = sign(&path, &nonce, &postdata, self.api_secret.expose_secret())?;

        debug!(method, "Kraken private request");

        let resp = self
            .http
            .post(format!("{}{path}", self.base_url))
            .header("API-Key", self.api_key.expose_secret())
            .header("API-Sign", signature)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded; charset=utf-8",
            )
            .body(postdata)
            .send()
            .await
            .with_context(|| format!("Kraken {method} request failed"))?;

        Self::unwrap_response(method, resp).await
    }

    async fn unwrap_response<T: DeserializeOwned>(
        method: &str,
        resp: reqwest::Response,
    ) -> Result<T> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Kraken {method} HTTP error {status}: {body}");
        }

        let envelope: KrakenResponse<T> = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse Kraken {method} response"))?;

        into_result(method, envelope)
    }
}

/// Reject an envelope carrying exchange-level errors.
fn into_result<T>(method: &str, envelope: KrakenResponse<T>) -> Result<T> {
    if !envelope.error.is_empty() {
        anyhow::bail!("Kraken {method} returned errors: {}", envelope.error.join(", "));
    }
    envelope
        .result
        .with_context(|| format!("Kraken {method} response has no result"))
}

/// Form-encode a private request body. The nonce always goes first.
fn encode_form(nonce: &str, params: &[(&str, String)]) -> String {
    let mut body = format!("nonce={nonce}");
    for (key, value) in params {
        body.push('&');
        body.push_str(&urlencoding::encode(key));
        body.push('=');
        body.push_str(&urlencoding::encode(value));
    }
    body
}

/// `AddOrder` parameters. `validate` is only sent for validate-only orders.
fn add_order_params(order: &OrderIntent) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("pair", order.pair.clone()),
        ("type", order.side.as_str().to_string()),
        ("ordertype", order.order_type.as_str().to_string()),
        ("price", order.price.to_string()),
        ("volume", order.volume.to_string()),
    ];
    if order.validate_only {
        params.push(("validate", "true".to_string()));
    }
    params
}

fn withdraw_params(withdrawal: &WithdrawalIntent) -> Vec<(&'static str, String)> {
    vec![
        ("asset", withdrawal.asset.clone()),
        ("key", withdrawal.destination_key.clone()),
        ("amount", withdrawal.amount.to_string()),
    ]
}

/// Compute the `API-Sign` header for a private request.
fn sign(path: &str, nonce: &str, postdata: &str, secret_b64: &str) -> Result<String> {
    let secret = STANDARD
        .decode(secret_b64)
        .context("Kraken API secret is not valid base64")?;

    let mut sha = Sha256::new();
    sha.update(nonce.as_bytes());
    sha.update(postdata.as_bytes());
    let digest = sha.finalize();

    let mut mac = HmacSha512::new_from_slice(&secret).map_err(|e| anyhow!("HMAC key: {e}"))?;
    mac.update(path.as_bytes());
    mac.update(&digest);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Pick the ask price out of a Ticker result.
///
/// Kraken answers with its own pair name (`XXBTZEUR` for `XBTEUR`), so a
/// single-entry result is accepted regardless of its key.
fn ask_from_ticker(pair: &str, tickers: &HashMap<String, TickerInfo>) -> Result<Decimal> {
    let info = match tickers.get(pair) {
        Some(info) => info,
        None if tickers.len() == 1 => tickers.values().next().context("empty ticker result")?,
        None => anyhow::bail!("Kraken Ticker result has no entry for {pair}"),
    };
    let raw = info
        .a
        .first()
        .with_context(|| format!("Kraken Ticker for {pair} has no ask"))?;
    Decimal::from_str(raw).with_context(|| format!("Invalid ask price '{raw}' for {pair}"))
}

fn parse_balances(raw: HashMap<String, String>) -> Result<Balances> {
    raw.into_iter()
        .map(|(symbol, amount)| {
            let value = Decimal::from_str(&amount)
                .with_context(|| format!("Invalid balance '{amount}' for {symbol}"))?;
            Ok::<_, anyhow::Error>((symbol, value))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ExchangeGateway trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl ExchangeGateway for KrakenClient {
    async fn get_ask_price(&self, pair: &str) -> Result<Decimal> {
        let query = format!("pair={}", urlencoding::encode(pair));
        let tickers: HashMap<String, TickerInfo> = self.public("Ticker", &query).await?;
        let ask = ask_from_ticker(pair, &tickers)?;
        debug!(pair, ask = %ask, "Kraken ask price");
        Ok(ask)
    }

    async fn get_balances(&self) -> Result<Balances> {
        let raw: HashMap<String, String> = self.private("Balance", &[]).await?;
        debug!(assets = raw.len(), "Kraken balances fetched");
        let balances = parse_balances(raw)?;
        Ok(balances)
    }

    async fn submit_limit_buy(&self, order: &OrderIntent) -> Result<serde_json::Value> {
        let result: serde_json::Value =
            self.private("AddOrder", &add_order_params(order)).await?;
        let txid = result.get("txid").cloned().unwrap_or_default();

        info!(
            pair = %order.pair,
            price = %order.price,
            volume = %order.volume,
            validate_only = order.validate_only,
            txid = %txid,
            "Kraken order submitted"
        );

        Ok(result)
    }

    async fn submit_withdrawal(&self, withdrawal: &WithdrawalIntent) -> Result<serde_json::Value> {
        let result: serde_json::Value =
            self.private("Withdraw", &withdraw_params(withdrawal)).await?;
        let refid = result.get("refid").cloned().unwrap_or_default();

        info!(
            asset = %withdrawal.asset,
            amount = %withdrawal.amount,
            refid = %refid,
            "Kraken withdrawal submitted"
        );

        Ok(result)
    }

    fn name(&self) -> &'static str {
        EXCHANGE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
