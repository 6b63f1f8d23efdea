//! Read receipts over HTTP using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    receipts::ReadReceiptSink,
};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Placeholder replaced by the percent-encoded message id.
pub const ITEM_ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Serialize)]
struct ListenedBody<'a> {
    item_id: &'a str,
    listened_at: DateTime<Utc>,
}

/// Posts a "listened" receipt to the messaging backend.
///
/// The endpoint is a template such as
/// `https://api.example.com/messages/{id}/listened`.
pub struct HttpReadReceipts {
    client: Client,
    endpoint_template: String,
    bearer_token: Option<String>,
}

impl HttpReadReceipts {
    /// Create a receipt sink with a short request timeout
    pub fn new(endpoint_template: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .user_agent("eleven-playback-core/0.1.0")
            .build()
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, endpoint_template))
    }

    /// Create a receipt sink with a custom client
    pub fn with_client(client: Client, endpoint_template: impl Into<String>) -> Self {
        Self {
            client,
            endpoint_template: endpoint_template.into(),
            bearer_token: None,
        }
    }

    /// Authenticate requests with a bearer token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Endpoint for a given message id.
    pub fn endpoint_for(&self, item_id: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(item_id.as_bytes()).collect();
        self.endpoint_template.replace(ITEM_ID_PLACEHOLDER, &encoded)
    }
}

#[async_trait]
impl ReadReceiptSink for HttpReadReceipts {
    async fn mark_listened(&self, item_id: &str) -> Result<()> {
        let url = self.endpoint_for(item_id);
        let mut request = self.client.post(&url).json(&ListenedBody {
            item_id,
            listened_at: Utc::now(),
        });
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Read receipt request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Rejected(format!(
                "Read receipt rejected with HTTP {}",
                status.as_u16()
            )));
        }

        debug!(item_id = item_id, "Read receipt delivered");
        Ok(())
    }
}

impl std::fmt::Debug for HttpReadReceipts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpReadReceipts")
            .field("endpoint_template", &self.endpoint_template)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "***"))
            .finish()
    }
}
