use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::message::{Embed, EmbedPayload, TextPayload};

const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Fallback resume delay when a 429 body carries no retry_after hint.
pub const DEFAULT_RETRY_AFTER_MS: u64 = 2000;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Sink network error: {0}")]
    Network(String),
    /// Temporary rejection; the caller may retry after the advertised delay.
    #[error("Sink throttled, retry after {retry_after_ms}ms")]
    Throttled { retry_after_ms: u64 },
    /// Non-throttling rejection. Retrying an unauthorized or malformed
    /// request cannot succeed, so this is terminal.
    #[error("Sink rejected request with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl SinkError {
    pub fn is_throttled(&self) -> bool {
        matches!(self, SinkError::Throttled { .. })
    }
}

/// One notification delivery target. Implementations make exactly one
/// request attempt per call; retry policy lives in the dispatcher.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_embeds(&self, embeds: &[Embed]) -> Result<(), SinkError>;
    async fn send_text(&self, content: &str) -> Result<(), SinkError>;
}

/// Discord-style webhook endpoint.
pub struct WebhookSink {
    url: String,
    client: Client,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }

    async fn post<T: Serialize + Sync>(&self, payload: &T) -> Result<(), SinkError> {
        let resp = self
            .client
            .post(&self.url)
            .json(payload)
            .timeout(SEND_TIMEOUT)
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        if status.as_u16() == 429 {
            return Err(SinkError::Throttled {
                retry_after_ms: parse_retry_after_ms(&body),
            });
        }
        Err(SinkError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(300).collect(),
        })
    }
}

/// The 429 body advertises `retry_after` in seconds (possibly fractional).
fn parse_retry_after_ms(body: &str) -> u64 {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("retry_after").and_then(|r| r.as_f64()))
        .map(|secs| (secs * 1000.0).ceil() as u64)
        .unwrap_or(DEFAULT_RETRY_AFTER_MS)
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send_embeds(&self, embeds: &[Embed]) -> Result<(), SinkError> {
        self.post(&EmbedPayload::new(embeds.to_vec())).await
    }

    async fn send_text(&self, content: &str) -> Result<(), SinkError> {
        self.post(&TextPayload::new(content.to_string())).await
    }
}
