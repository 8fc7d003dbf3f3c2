use std::time::Duration;

use async_trait::async_trait;
use orgsync_common::error::{OrgsyncError, OrgsyncResult};
use orgsync_config::env::get_var_or;
use reqwest::{Client, StatusCode};

use super::models::{EventPage, RawEventList, SourceEvent, EVENT_ALLOWLIST, PAGE_LIMIT};
use crate::window::FetchWindow;

const DEFAULT_BASE_URL: &str = "https://api.workos.com";
const MAX_RETRIES_LIMIT: u32 = 10;
const MAX_BACKOFF_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct WorkosClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl WorkosClientConfig {
    /// Load WorkOS config from environment. `WORKOS_API_KEY` is required.
    pub fn from_env() -> OrgsyncResult<Self> {
        let api_key = std::env::var("WORKOS_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| OrgsyncError::Config("WORKOS_API_KEY is required but not set".into()))?;
        let base_url = get_var_or("WORKOS_BASE_URL", DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let max_retries: u32 = parse_var("WORKOS_MAX_RETRIES", "3")?;
        if max_retries > MAX_RETRIES_LIMIT {
            return Err(OrgsyncError::Config(format!(
                "WORKOS_MAX_RETRIES must be at most {MAX_RETRIES_LIMIT}, got {max_retries}"
            )));
        }
        let timeout_secs: u64 = parse_var("WORKOS_TIMEOUT_SECS", "30")?;
        if timeout_secs == 0 {
            return Err(OrgsyncError::Config(
                "WORKOS_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            base_url,
            api_key,
            max_retries,
            timeout_secs,
        })
    }
}

fn parse_var<T>(key: &str, default: &str) -> OrgsyncResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_var_or(key, default)
        .trim()
        .parse()
        .map_err(|e| OrgsyncError::Config(format!("invalid {key}: {e}")))
}

/// Exponential backoff before retry `attempt`, capped at `MAX_BACKOFF_SECS`.
fn backoff_secs(attempt: u32) -> u64 {
    1u64.checked_shl(attempt)
        .unwrap_or(u64::MAX)
        .min(MAX_BACKOFF_SECS)
}

#[derive(Debug, thiserror::Error)]
pub enum EventSourceError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },

    #[error("invalid event record: {0}")]
    InvalidEvent(#[from] serde_json::Error),
}

/// Source of ordered change events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch one page of allow-listed events for `window`, oldest first.
    async fn fetch(&self, window: &FetchWindow) -> Result<EventPage, EventSourceError>;
}

#[derive(Clone)]
pub struct WorkosClient {
    client: Client,
    config: WorkosClientConfig,
}

impl WorkosClient {
    pub fn new(config: WorkosClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// For testing: create a client pointing at a specific base URL (e.g., wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    fn list_events_query(window: &FetchWindow) -> Vec<(&'static str, String)> {
        let mut query: Vec<(&'static str, String)> = EVENT_ALLOWLIST
            .iter()
            .map(|event| ("events", (*event).to_string()))
            .collect();
        query.push(("limit", PAGE_LIMIT.to_string()));
        query.extend(window.query_params());
        query
    }

    async fn request_with_retry(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<RawEventList, EventSourceError> {
        let mut last_error = String::new();
        let mut waited_retry_after = false;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 && !std::mem::take(&mut waited_retry_after) {
                let delay = backoff_secs(attempt);
                tracing::warn!(attempt, backoff_secs = delay, "retrying after backoff");
                tokio::time::sleep(Duration::from_secs(delay)).await;
            }

            let response = match self
                .client
                .get(url)
                .bearer_auth(&self.config.api_key)
                .query(query)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() || e.is_connect() {
                        continue;
                    }
                    return Err(EventSourceError::RequestError(e));
                }
            };

            let status = response.status();

            if status.is_success() {
                return response
                    .json::<RawEventList>()
                    .await
                    .map_err(EventSourceError::RequestError);
            }

            // Honor Retry-After header for 429
            if status == StatusCode::TOO_MANY_REQUESTS {
                if let Some(retry_after) = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                {
                    let wait = std::cmp::min(retry_after, 60);
                    tracing::warn!(wait, "rate-limited, waiting Retry-After");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                    waited_retry_after = true;
                }
                last_error = "429 Too Many Requests".to_string();
                continue;
            }

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = format!("{status}: {body}");
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(EventSourceError::HttpError { status, body });
        }

        Err(EventSourceError::MaxRetriesExceeded {
            attempts: self.config.max_retries + 1,
            last_error,
        })
    }
}

#[async_trait]
impl EventSource for WorkosClient {
    async fn fetch(&self, window: &FetchWindow) -> Result<EventPage, EventSourceError> {
        let url = format!("{}/events", self.config.base_url);
        let query = Self::list_events_query(window);
        tracing::debug!(?window, "listing events");

        let list = self.request_with_retry(&url, &query).await?;
        let data = list
            .data
            .into_iter()
            .map(SourceEvent::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EventPage {
            data,
            list_metadata: list.list_metadata,
        })
    }
}
