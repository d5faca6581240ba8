//! HTTP publish sink
//!
//! Two endpoints under the sink root:
//!
//! - `POST {root}/preflight` with `{"files": [{"path", "sha256"}]}` answers
//!   `{"changed": [path, ...]}`
//! - `POST {root}/commit` with `{"force", "files": [{"path", "contentType", "content"}]}`
//!
//! A `409 Conflict` on commit means the remote moved; it is retried with
//! backoff up to the configured limit.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::export::{FileDigest, PublishFile};
use crate::config::PublisherConfig;
use crate::utils::error::PublishError;
use crate::utils::retry::{with_retry_if, RetryConfig};
use crate::utils::truncate_text;

/// Destination for rendered exports
#[async_trait]
pub trait PublishSink: Send + Sync {
    /// Paths whose hash differs from what the sink holds
    async fn preflight(&self, files: &[FileDigest]) -> Result<Vec<String>, PublishError>;

    /// Write files in one commit
    async fn commit(&self, files: &[PublishFile], force: bool) -> Result<(), PublishError>;
}

#[derive(Serialize)]
struct PreflightBody<'a> {
    files: &'a [FileDigest],
}

#[derive(Deserialize)]
struct PreflightReply {
    #[serde(default)]
    changed: Vec<String>,
}

#[derive(Serialize)]
struct CommitBody<'a> {
    force: bool,
    files: &'a [PublishFile],
}

pub struct HttpPublishSink {
    client: Client,
    base_url: String,
    token: Option<String>,
    retry: RetryConfig,
}

impl HttpPublishSink {
    /// Create a sink client
    ///
    /// # Errors
    ///
    /// Returns `PublishError::Http` if the HTTP client cannot be created
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self, PublishError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            token,
            retry,
        })
    }

    /// Build a sink from publisher settings, `None` when no sink URL is set
    pub fn from_config(
        config: &PublisherConfig,
        timeout: Duration,
    ) -> Result<Option<Self>, PublishError> {
        let Some(url) = &config.sink_url else {
            return Ok(None);
        };

        let retry = RetryConfig::with_delays(
            config.max_conflict_retries,
            config.conflict_backoff_ms,
            config.conflict_backoff_ms.saturating_mul(8),
        );
        Self::new(url.clone(), config.sink_token.clone(), timeout, retry).map(Some)
    }

    async fn post<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Response, PublishError> {
        let mut request = self
            .client
            .post(format!("{}/{endpoint}", self.base_url))
            .json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::CONFLICT {
            return Err(PublishError::Conflict);
        }

        let body = response.text().await.unwrap_or_default();
        Err(PublishError::Status {
            status: status.as_u16(),
            body: truncate_text(&body, 200),
        })
    }

    async fn commit_once(&self, files: &[PublishFile], force: bool) -> Result<(), PublishError> {
        self.post("commit", &CommitBody { force, files }).await?;
        Ok(())
    }
}

#[async_trait]
impl PublishSink for HttpPublishSink {
    async fn preflight(&self, files: &[FileDigest]) -> Result<Vec<String>, PublishError> {
        let response = self.post("preflight", &PreflightBody { files }).await?;
        let reply: PreflightReply = response
            .json()
            .await
            .map_err(|e| PublishError::Decode(e.to_string()))?;
        Ok(reply.changed)
    }

    async fn commit(&self, files: &[PublishFile], force: bool) -> Result<(), PublishError> {
        let result = with_retry_if(
            &self.retry,
            || self.commit_once(files, force),
            |e| matches!(e, PublishError::Conflict),
        )
        .await;

        match result {
            Err(PublishError::Conflict) => Err(PublishError::ConflictRetriesExhausted(
                self.retry.max_retries + 1,
            )),
            other => other,
        }
    }
}
