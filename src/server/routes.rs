//! Trigger route handlers.
//!
//! Action endpoints answer 200 with `{"status": "success", ...}` or 500
//! with `{"status": "error", "message": ...}`. The context is shared via
//! `Arc<ActionContext>`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::engine::{self, ActionContext};
use crate::types::{BuyOutcome, HelperError, WithdrawOutcome};

pub type AppState = Arc<ActionContext>;

pub const STATUS_TEXT: &str = "Kraken Helper service is running and ready.";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse<T> {
    pub status: &'static str,
    pub message: String,
    pub details: T,
}

impl<T> ActionResponse<T> {
    fn success(message: String, details: T) -> Self {
        Self {
            status: "success",
            message,
            details,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

impl IntoResponse for HelperError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            status: "error",
            message: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /
pub async fn index() -> &'static str {
    STATUS_TEXT
}

/// POST /buy
pub async fn buy(
    State(ctx): State<AppState>,
) -> Result<Json<ActionResponse<BuyOutcome>>, HelperError> {
    info!("Received POST request to /buy");
    let outcome = engine::execute_buy(&ctx).await.map_err(|e| {
        error!(error = %e, "Buy action failed");
        e
    })?;
    Ok(Json(ActionResponse::success(outcome.summary(), outcome)))
}

/// POST /withdraw
pub async fn withdraw(
    State(ctx): State<AppState>,
) -> Result<Json<ActionResponse<WithdrawOutcome>>, HelperError> {
    info!("Received POST request to /withdraw");
    let outcome = engine::execute_withdraw(&ctx).await.map_err(|e| {
        error!(error = %e, "Withdraw action failed");
        e
    })?;
    Ok(Json(ActionResponse::success(outcome.summary(), outcome)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
