use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::config::SourceSettings;

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source fetch failed: {0}")]
    Network(String),
    #[error("Source returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Local HTML read failed for {path}: {source}")]
    LocalRead {
        path: String,
        source: std::io::Error,
    },
}

/// Provider of the raw screener markup: live HTTP fetch, or a local file
/// when the offline override is set. The scrape itself is never retried.
pub struct MarkupSource {
    settings: SourceSettings,
    client: Client,
}

impl MarkupSource {
    pub fn new(settings: SourceSettings) -> Self {
        Self {
            settings,
            client: Client::new(),
        }
    }

    pub async fn fetch(&self) -> Result<String, SourceError> {
        if let Some(path) = &self.settings.local_html {
            info!(path = %path, "Loading HTML from local file");
            return std::fs::read_to_string(path).map_err(|e| SourceError::LocalRead {
                path: path.clone(),
                source: e,
            });
        }

        info!(url = %self.settings.url, "Fetching screener page");
        let resp = self
            .client
            .get(&self.settings.url)
            .header("User-Agent", &self.settings.user_agent)
            .header("Accept", "text/html,application/xhtml+xml")
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(body)
    }
}
