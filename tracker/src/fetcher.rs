//! Concurrent retrieval of the hourly snapshots.

use crate::config::SourceConfig;
use crate::metrics_defs::SOURCE_FETCH;
use crate::types::HourOffset;
use reqwest::StatusCode;
use serde_json::Value;
use shared::counter;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::timeout;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request to {0} timed out")]
    Timeout(String),
    #[error("request to {0} failed: {1}")]
    Transport(String, reqwest::Error),
    #[error("{0} returned status {1}")]
    Status(String, StatusCode),
    #[error("{0} returned invalid json: {1}")]
    InvalidJson(String, serde_json::Error),
}

impl FetchError {
    fn outcome(&self) -> &'static str {
        match self {
            FetchError::Timeout(_) => "timeout",
            FetchError::Transport(_, _) => "transport",
            FetchError::Status(_, _) => "status",
            FetchError::InvalidJson(_, _) => "invalid_json",
        }
    }
}

/// Decoded body of one hourly resource. `payload` is `None` when the source was
/// unavailable for any reason.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceSnapshot {
    pub offset: HourOffset,
    pub payload: Option<Value>,
}

impl SourceSnapshot {
    pub fn unavailable(offset: HourOffset) -> Self {
        SourceSnapshot {
            offset,
            payload: None,
        }
    }
}

#[derive(Clone)]
pub struct SourceFetcher {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl SourceFetcher {
    pub fn new(client: reqwest::Client, config: &SourceConfig) -> Self {
        SourceFetcher {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn url_for(&self, offset: HourOffset) -> String {
        format!("{}/{}", self.base_url, offset.file_name())
    }

    /// Fetches a single snapshot. The timeout covers the whole exchange
    /// including reading the body.
    pub async fn fetch_snapshot(&self, offset: HourOffset) -> Result<Value, FetchError> {
        let url = self.url_for(offset);

        let body = timeout(self.timeout, async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::Transport(url.clone(), e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(url.clone(), status));
            }

            response
                .bytes()
                .await
                .map_err(|e| FetchError::Transport(url.clone(), e))
        })
        .await
        .map_err(|_| FetchError::Timeout(url.clone()))??;

        serde_json::from_slice(&body).map_err(|e| FetchError::InvalidJson(url, e))
    }

    /// Fetches every hourly snapshot concurrently.
    ///
    /// Always returns one entry per hour, ordered by offset, whatever order the
    /// requests complete in. Failed sources come back as unavailable. Dropping
    /// the returned future aborts the requests still in flight.
    pub async fn fetch_all(&self) -> Vec<SourceSnapshot> {
        let mut snapshots: Vec<SourceSnapshot> =
            HourOffset::all().map(SourceSnapshot::unavailable).collect();

        let mut join_set = JoinSet::new();
        for offset in HourOffset::all() {
            let fetcher = self.clone();
            join_set.spawn(async move { (offset, fetcher.fetch_snapshot(offset).await) });
        }

        while let Some(join_result) = join_set.join_next().await {
            match join_result {
                Ok((offset, Ok(payload))) => {
                    counter!(SOURCE_FETCH, "outcome" => "ok").increment(1);
                    snapshots[usize::from(offset.hours())].payload = Some(payload);
                }
                Ok((offset, Err(e))) => {
                    counter!(SOURCE_FETCH, "outcome" => e.outcome()).increment(1);
                    tracing::warn!(offset = %offset, "Failed to fetch snapshot: {e}");
                }
                Err(e) => tracing::error!("Snapshot fetch task panicked: {e}"),
            }
        }

        snapshots
    }
}
