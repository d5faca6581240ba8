//! Server clock sources
//!
//! Each tagging pass takes one [`ClockSnapshot`] and threads it through every
//! computation. Snapshots are never cached across passes.
//!
//! The HTTP clock accepts two body shapes:
//!
//! - a bare integer: epoch milliseconds, offset 0
//! - JSON with an ISO-8601 timestamp (`now`, `iso` or `datetime`) and an
//!   optional offset in minutes (`tzOffsetMinutes`, `tz_offset_minutes` or
//!   `offset`); without an explicit offset the timestamp's own offset is used
//!
//! A successful response in any other shape falls back to the local clock.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::ClockConfig;
use crate::models::ClockSnapshot;
use crate::utils::error::ClockError;

const TIMESTAMP_KEYS: &[&str] = &["now", "iso", "datetime"];
const OFFSET_KEYS: &[&str] = &["tzOffsetMinutes", "tz_offset_minutes", "offset"];

/// Source of the current time for a pass
#[async_trait]
pub trait ClockSource: Send + Sync {
    async fn snapshot(&self) -> Result<ClockSnapshot, ClockError>;
}

/// Local process clock with zero offset
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl ClockSource for SystemClock {
    async fn snapshot(&self) -> Result<ClockSnapshot, ClockError> {
        Ok(ClockSnapshot::local())
    }
}

/// Clock read from an HTTP endpoint
pub struct HttpClock {
    client: Client,
    url: String,
}

impl HttpClock {
    /// Create a clock client
    ///
    /// # Errors
    ///
    /// Returns `ClockError::Http` if the HTTP client cannot be created
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ClockError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ClockSource for HttpClock {
    async fn snapshot(&self) -> Result<ClockSnapshot, ClockError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                ClockError::Timeout
            } else {
                ClockError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClockError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        match parse_clock_body(&body) {
            Some(snapshot) => {
                tracing::debug!(
                    now_epoch = snapshot.now_epoch,
                    tz_offset_minutes = snapshot.tz_offset_minutes,
                    "Fetched server clock"
                );
                Ok(snapshot)
            }
            None => {
                tracing::warn!(
                    body = %crate::utils::truncate_text(&body, 80),
                    "Unrecognized clock response, using local clock"
                );
                Ok(ClockSnapshot::local())
            }
        }
    }
}

/// Build the configured clock source
///
/// # Errors
///
/// Returns `ClockError::MissingSource` when a clock is required but no URL is set
pub fn from_config(
    config: &ClockConfig,
    timeout: Duration,
) -> Result<Box<dyn ClockSource>, ClockError> {
    match &config.url {
        Some(url) => Ok(Box::new(HttpClock::new(url.clone(), timeout)?)),
        None if config.required => Err(ClockError::MissingSource),
        None => {
            tracing::warn!("No clock URL configured, using local clock");
            Ok(Box::new(SystemClock))
        }
    }
}

/// Parse a clock response body
pub fn parse_clock_body(body: &str) -> Option<ClockSnapshot> {
    let body = body.trim();

    if let Ok(millis) = body.parse::<i64>() {
        return Some(ClockSnapshot::new(millis.div_euclid(1000), 0));
    }

    match serde_json::from_str::<Value>(body).ok()? {
        Value::Number(n) => n
            .as_i64()
            .map(|millis| ClockSnapshot::new(millis.div_euclid(1000), 0)),
        Value::Object(map) => {
            let timestamp = TIMESTAMP_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))?;
            let parsed = DateTime::parse_from_rfc3339(timestamp).ok()?;

            let offset = OFFSET_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(offset_minutes))
                .unwrap_or(parsed.offset().local_minus_utc() / 60);

            Some(ClockSnapshot::new(parsed.timestamp(), offset))
        }
        _ => None,
    }
}

fn offset_minutes(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
