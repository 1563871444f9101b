//! Acquisition of uptime data from the remote service.
//!
//! The service itself is an external collaborator; this module only issues a
//! request and turns the response into a [`Series`] or a [`BatchPayload`].

mod http;

pub use http::*;

use crate::timeline::{BatchPayload, Period, Series};

use async_trait::async_trait;
use thiserror::Error;

/// Why a load attempt failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Non-2xx response or network failure, carrying the best message available.
    #[error("{0}")]
    Transport(String),
    /// The body was not valid JSON (or not the expected JSON).
    #[error("{0}")]
    Parse(String),
    /// The response parsed but held no samples.
    #[error("no data")]
    EmptyData,
}

impl FetchError {
    /// Text shown in place of the bar strip.
    pub fn display_message(&self) -> String {
        match self {
            FetchError::Transport(msg) | FetchError::Parse(msg) => {
                format!("Cannot load data: {}", msg)
            }
            FetchError::EmptyData => "No data".to_string(),
        }
    }
}

/// A source of uptime series.
#[async_trait]
pub trait UptimeSource: Send + Sync {
    /// Fetch one monitor's series from `api_url`.
    async fn fetch_series(
        &self,
        api_url: &str,
        monitor_id: Option<&str>,
        period: Period,
    ) -> Result<Series, FetchError>;

    /// Fetch every monitor under a batch endpoint in one round trip.
    async fn fetch_batch(&self, batch_url: &str, period: Period) -> Result<BatchPayload, FetchError>;
}

#[cfg(test)]
pub mod testing {
    //! In-memory source used by widget and batch tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays scripted responses and records every request.
    #[derive(Default)]
    pub struct ScriptedSource {
        series: Mutex<VecDeque<(Duration, Result<Series, FetchError>)>>,
        batches: Mutex<VecDeque<Result<BatchPayload, FetchError>>>,
        pub requests: Mutex<Vec<(String, Option<String>, Period)>>,
    }

    impl ScriptedSource {
        pub fn push_series(&self, result: Result<Series, FetchError>) {
            self.push_series_delayed(Duration::ZERO, result);
        }

        pub fn push_series_delayed(&self, delay: Duration, result: Result<Series, FetchError>) {
            self.series.lock().unwrap().push_back((delay, result));
        }

        pub fn push_batch(&self, result: Result<BatchPayload, FetchError>) {
            self.batches.lock().unwrap().push_back(result);
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl UptimeSource for ScriptedSource {
        async fn fetch_series(
            &self,
            api_url: &str,
            monitor_id: Option<&str>,
            period: Period,
        ) -> Result<Series, FetchError> {
            self.requests.lock().unwrap().push((
                api_url.to_string(),
                monitor_id.map(str::to_string),
                period,
            ));
            let next = self.series.lock().unwrap().pop_front();
            match next {
                Some((delay, result)) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    result
                }
                None => Err(FetchError::Transport("no scripted response".to_string())),
            }
        }

        async fn fetch_batch(&self, batch_url: &str, period: Period) -> Result<BatchPayload, FetchError> {
            self.requests
                .lock()
                .unwrap()
                .push((batch_url.to_string(), None, period));
            self.batches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Transport("no scripted response".to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages_are_distinct() {
        let transport = FetchError::Transport("HTTP 500".to_string()).display_message();
        let parse = FetchError::Parse("expected value at line 1".to_string()).display_message();
        let empty = FetchError::EmptyData.display_message();

        assert_eq!(transport, "Cannot load data: HTTP 500");
        assert!(parse.starts_with("Cannot load data: "));
        assert_eq!(empty, "No data");
        assert_ne!(empty, transport);
    }
}
