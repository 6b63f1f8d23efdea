//! Read-receipt side channel.

use async_trait::async_trait;

use crate::error::Result;

/// Notifies the backend that a voice message has been listened to.
///
/// Calls are fire-and-forget from the core's perspective: failures are logged
/// and otherwise ignored, so implementations should not retry aggressively.
#[async_trait]
pub trait ReadReceiptSink: Send + Sync {
    async fn mark_listened(&self, item_id: &str) -> Result<()>;
}
