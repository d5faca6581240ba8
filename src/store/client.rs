//! REST client for an Airtable-style record store
//!
//! Lists follow the `offset` cursor until the store stops returning one, a
//! fixed page size per round trip. Patches are sent in chunks capped by the
//! store's batch limit. Every request waits on a shared rate limiter and is
//! bounded by the client timeout. Failures are returned as-is without retry.

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use url::Url;

use super::RecordStore;
use crate::config::StoreConfig;
use crate::models::{Record, RecordPatch};
use crate::utils::error::StoreError;
use crate::utils::truncate_text;

/// One page of a list response
#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Serialize)]
struct PatchBody<'a> {
    records: &'a [RecordPatch],
}

/// Record store client
pub struct AirtableStore {
    /// HTTP client with configured timeout
    client: Client,

    /// API root
    base_url: Url,

    base_id: String,
    api_token: String,
    page_size: usize,
    batch_size: usize,

    /// Rate limiter to stay under the store's request quota
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl AirtableStore {
    /// Create a client from store settings
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidUrl` for a malformed base URL and
    /// `StoreError::Http` if the HTTP client cannot be created
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| StoreError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()?;

        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            base_url,
            base_id: config.base_id.clone(),
            api_token: config.api_token.clone(),
            page_size: config.page_size.max(1),
            batch_size: config.batch_size.max(1),
            rate_limiter,
        })
    }

    /// URL of a table, with the table name encoded as a path segment
    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(&self.base_id)
            .push(table);
        Ok(url)
    }

    /// Fetch a single page of records
    async fn fetch_page(
        &self,
        url: &Url,
        view: &str,
        offset: Option<&str>,
    ) -> Result<ListPage, StoreError> {
        self.rate_limiter.until_ready().await;

        let page_size = self.page_size.to_string();
        let mut request = self
            .client
            .get(url.clone())
            .bearer_auth(&self.api_token)
            .query(&[("view", view), ("pageSize", page_size.as_str())]);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        let response = request.send().await.map_err(StoreError::from_reqwest)?;
        let response = Self::check_status(response).await?;

        response.json().await.map_err(StoreError::from_reqwest)
    }

    /// Turn a non-success response into `StoreError::Status`
    async fn check_status(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body: truncate_text(&body, 200),
        })
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn list_records(&self, table: &str, view: &str) -> Result<Vec<Record>, StoreError> {
        let url = self.table_url(table)?;
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        let mut page = 1;

        loop {
            tracing::debug!(table, view, page, "Fetching record page");

            let ListPage {
                records: batch,
                offset: next,
            } = self.fetch_page(&url, view, offset.as_deref()).await?;
            records.extend(batch);

            match next {
                Some(next) if !next.is_empty() => {
                    offset = Some(next);
                    page += 1;
                }
                _ => break,
            }
        }

        tracing::info!(table, view, pages = page, records = records.len(), "Listed records");
        Ok(records)
    }

    async fn patch_records(
        &self,
        table: &str,
        patches: &[RecordPatch],
    ) -> Result<usize, StoreError> {
        if patches.is_empty() {
            return Ok(0);
        }

        let url = self.table_url(table)?;
        let mut written = 0;

        for chunk in patches.chunks(self.batch_size) {
            self.rate_limiter.until_ready().await;

            let response = self
                .client
                .patch(url.clone())
                .bearer_auth(&self.api_token)
                .json(&PatchBody { records: chunk })
                .send()
                .await
                .map_err(StoreError::from_reqwest)?;
            Self::check_status(response).await?;

            written += chunk.len();
            tracing::debug!(table, batch = chunk.len(), written, "Patched record batch");
        }

        tracing::info!(table, records = written, "Patched records");
        Ok(written)
    }
}
