use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, warn};

use crate::api::latency::LatencyStats;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::types::ApiEnvelope;

/// Query parameter carrying the pagination cursor.
pub const CURSOR_PARAM: &str = "next";

/// One page of the live listing, addressed by cursor (`""` = first page).
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, cursor: &str) -> Result<ApiEnvelope>;
}

/// Listing API client. One GET per call, no retries.
pub struct LiveApiClient {
    client: reqwest::Client,
    base_url: Url,
    client_id: String,
    client_secret: String,
    latency: Arc<LatencyStats>,
}

impl LiveApiClient {
    pub fn new(
        base_url: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
        latency: Arc<LatencyStats>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            AppError::Config(format!("listing URL {base_url:?} is not a valid absolute URL: {e}"))
        })?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            latency,
        })
    }

    pub fn from_config(cfg: &Config, latency: Arc<LatencyStats>) -> Result<Self> {
        Self::new(
            &cfg.live_api_url,
            cfg.client_id.clone(),
            cfg.client_secret.clone(),
            cfg.http_timeout,
            latency,
        )
    }
}

#[async_trait]
impl PageSource for LiveApiClient {
    async fn fetch_page(&self, cursor: &str) -> Result<ApiEnvelope> {
        let url = build_request_url(&self.base_url, cursor);
        let started = Instant::now();

        let resp = self
            .client
            .get(url.clone())
            .header("Client-Id", &self.client_id)
            .header("Client-Secret", &self.client_secret)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            self.latency.record(started.elapsed());
            return Err(AppError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.bytes().await?;
        self.latency.record(started.elapsed());

        let envelope: ApiEnvelope = serde_json::from_slice(&body)?;
        if envelope.code != 200 {
            warn!(
                code = envelope.code,
                message = envelope.message.as_deref().unwrap_or(""),
                "listing API returned non-200 envelope code"
            );
        }
        debug!(
            items = envelope.content.data.len(),
            next = %envelope.next_cursor(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched listing page"
        );

        Ok(envelope)
    }
}

/// Build the request URL for `cursor`. A non-empty cursor replaces any
/// `next` already present in `base`; an empty cursor leaves `base` untouched.
pub fn build_request_url(base: &Url, cursor: &str) -> Url {
    if cursor.is_empty() {
        return base.clone();
    }

    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(k, _)| k != CURSOR_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(CURSOR_PARAM, cursor);
    url
}
