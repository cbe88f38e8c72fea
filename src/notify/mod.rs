//! Outcome notifications.
//!
//! Every invocation ends with one human-readable message. Delivery is
//! fire-and-forget: a failed webhook call is logged and dropped, it never
//! changes the outcome of the action that produced the message.

pub mod slack;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

/// Delivers a single outcome message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<()>;
}

/// Used when no webhook is configured; messages only reach the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        info!(message = %text, "Notification (no webhook configured)");
        Ok(())
    }
}

/// Send `text`, swallowing any delivery failure. Returns whether it was delivered.
pub async fn notify_best_effort(notifier: &dyn Notifier, text: &str) -> bool {
    match notifier.notify(text).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "Notification failed, continuing");
            false
        }
    }
}
