//! HTTP implementation of [`UptimeSource`].

use super::{FetchError, UptimeSource};
use crate::timeline::{BatchPayload, Period, Series, UptimePayload};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Fetches uptime data over HTTP.
///
/// Relative API URLs are resolved against `base`, the origin of the uptime
/// service.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base = Url::parse(base)
            .map_err(|e| FetchError::Transport(format!("invalid base URL {}: {}", base, e)))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client, base })
    }

    /// Resolve `api_url` and append query parameters.
    pub fn request_url(&self, api_url: &str, params: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut url = self
            .base
            .join(api_url)
            .map_err(|e| FetchError::Transport(format!("invalid URL {}: {}", api_url, e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET `url` and return the status and body text.
    async fn get(&self, url: Url) -> Result<(StatusCode, String), FetchError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok((status, body))
    }
}

/// Best message for a non-2xx response.
///
/// A JSON body yields its `error`, then its `message`, then `HTTP <status>`.
/// Any other body yields its trimmed text, or `HTTP <status>` when blank.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let fallback = || format!("HTTP {}", status.as_u16());

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        return ["error", "message"]
            .iter()
            .find_map(|key| value.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(fallback);
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_string()
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))
}

#[async_trait]
impl UptimeSource for HttpSource {
    async fn fetch_series(
        &self,
        api_url: &str,
        monitor_id: Option<&str>,
        period: Period,
    ) -> Result<Series, FetchError> {
        let mut params = Vec::with_capacity(2);
        if let Some(id) = monitor_id {
            params.push(("monitor_id", id));
        }
        params.push(("period", period.code()));

        let url = self.request_url(api_url, &params)?;
        let (status, body) = self.get(url).await?;

        if !status.is_success() {
            return Err(FetchError::Transport(error_message(status, &body)));
        }

        let series = decode::<UptimePayload>(&body)?.into_series();
        if series.is_empty() {
            return Err(FetchError::EmptyData);
        }
        Ok(series)
    }

    async fn fetch_batch(&self, batch_url: &str, period: Period) -> Result<BatchPayload, FetchError> {
        let url = self.request_url(batch_url, &[("period", period.code())])?;
        let (status, body) = self.get(url).await?;

        if !status.is_success() {
            return Err(FetchError::Transport(format!("HTTP {}", status.as_u16())));
        }

        decode(&body)
    }
}
