//! Configuration management for ticktag jobs
//!
//! This module handles loading and validating configuration from environment variables,
//! TOML files, and command-line overrides. The resulting [`Config`] is built once at
//! startup and passed by reference into every job.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Largest batch the record store accepts in one PATCH
pub const MAX_BATCH_SIZE: usize = 10;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record store connection
    pub store: StoreConfig,

    /// Server clock source
    pub clock: ClockConfig,

    /// Tables and views read by the tagger
    pub tables: TablesConfig,

    /// Field name mappings
    pub fields: FieldsConfig,

    /// Tagger job settings
    pub tagger: TaggerConfig,

    /// Washer job settings
    pub washer: WasherConfig,

    /// Publisher job settings
    pub publisher: PublisherConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Record store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// API root, e.g. `https://api.airtable.com/v0`
    pub base_url: String,

    /// Base (database) identifier
    pub base_id: String,

    /// Bearer token
    #[serde(skip_serializing)]
    pub api_token: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Records per list page
    pub page_size: usize,

    /// Records per PATCH request
    pub batch_size: usize,

    /// Request rate limit
    pub requests_per_second: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://api.airtable.com/v0"),
            base_id: String::new(),
            api_token: String::new(),
            timeout_secs: 20,
            page_size: 100,
            batch_size: MAX_BATCH_SIZE,
            requests_per_second: 5,
        }
    }
}

/// Clock source settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Clock endpoint; the local clock is used when absent
    pub url: Option<String>,

    /// Refuse to start without a clock endpoint
    pub required: bool,
}

/// A table and one of its views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub table: String,
    pub view: String,
}

impl TableView {
    pub fn new(table: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            view: view.into(),
        }
    }
}

/// Tables read by the tagger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    pub schedules: TableView,
    pub trips: TableView,
    pub shows: TableView,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            schedules: TableView::new("Schedules", "Watch"),
            trips: TableView::new("Trips", "Watch"),
            shows: TableView::new("Shows", "Grid view"),
        }
    }
}

/// Field name mappings for every record kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldsConfig {
    pub schedule: ScheduleFields,
    pub trip: TripFields,
    pub show: ShowFields,
    pub output: OutputFields,
}

/// Input fields of schedule records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleFields {
    pub status: String,
    pub date: String,
    pub latest_estimate: String,
    pub base_estimate: String,
}

impl Default for ScheduleFields {
    fn default() -> Self {
        Self {
            status: String::from("Status"),
            date: String::from("Date"),
            latest_estimate: String::from("Latest ETA"),
            base_estimate: String::from("ETA"),
        }
    }
}

/// Input fields of trip records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TripFields {
    pub status: String,
    pub live: String,
    pub date: String,
    pub latest_go: String,
    pub base_go: String,
    pub start: String,
}

impl Default for TripFields {
    fn default() -> Self {
        Self {
            status: String::from("Status"),
            live: String::from("Gone In"),
            date: String::from("Date"),
            latest_go: String::from("Latest Go Time"),
            base_go: String::from("Go Time"),
            start: String::from("Start Time"),
        }
    }
}

/// Fields of the show record that carries the operating mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowFields {
    pub mode: String,
}

impl Default for ShowFields {
    fn default() -> Self {
        Self {
            mode: String::from("Mode"),
        }
    }
}

/// Output fields written by the tagger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFields {
    pub now_epoch: String,
    pub temp: String,
    pub bucket: String,
    pub next_due: String,
}

impl Default for OutputFields {
    fn default() -> Self {
        Self {
            now_epoch: String::from("Now Epoch"),
            temp: String::from("Temp"),
            bucket: String::from("Bucket"),
            next_due: String::from("Next Due Epoch"),
        }
    }
}

/// Tagger job settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Mode that takes precedence over the show record
    pub mode_override: Option<String>,

    /// Delay between the two DAY passes, in seconds
    pub pass_delay_secs: u64,

    /// Log patches instead of writing them
    pub dry_run: bool,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            mode_override: None,
            pass_delay_secs: 180,
            dry_run: false,
        }
    }
}

/// Washer job settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WasherConfig {
    pub target: TableView,

    /// Checkbox marking a record as locked
    pub lock_field: String,

    pub relock: bool,
    pub reschedule: bool,

    /// Number of detection rounds
    pub iterations: u32,

    /// Seconds between rounds
    pub interval_secs: u64,

    pub dry_run: bool,
}

impl Default for WasherConfig {
    fn default() -> Self {
        Self {
            target: TableView::new("Schedules", "Due"),
            lock_field: String::from("Locked"),
            relock: false,
            reschedule: false,
            iterations: 1,
            interval_secs: 60,
            dry_run: false,
        }
    }
}

/// A table view exported to one JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTarget {
    pub table: String,
    pub view: String,
    pub path: String,
}

impl FromStr for ExportTarget {
    type Err = anyhow::Error;

    /// Parse `table:view:path`
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':').map(str::trim);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(table), Some(view), Some(path))
                if !table.is_empty() && !view.is_empty() && !path.is_empty() =>
            {
                Ok(Self {
                    table: table.to_string(),
                    view: view.to_string(),
                    path: path.to_string(),
                })
            }
            _ => anyhow::bail!("Invalid export '{s}'. Expected table:view:path"),
        }
    }
}

/// Publisher job settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Publish endpoint root
    pub sink_url: Option<String>,

    #[serde(skip_serializing)]
    pub sink_token: Option<String>,

    /// Checkbox marking records changed since the last publish
    pub dirty_field: Option<String>,

    /// Retries on a commit conflict
    pub max_conflict_retries: u32,

    /// Base backoff delay for conflict retries, in milliseconds
    pub conflict_backoff_ms: u64,

    pub exports: Vec<ExportTarget>,

    pub dry_run: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            sink_url: None,
            sink_token: None,
            dirty_field: Some(String::from("Dirty")),
            max_conflict_retries: 3,
            conflict_backoff_ms: 1000,
            exports: Vec::new(),
            dry_run: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl LoggingConfig {
    /// Apply command-line overrides; `-v` forces debug
    pub fn with_overrides(mut self, format: Option<&str>, verbose: bool) -> Self {
        if let Some(format) = format {
            self.format = format.to_string();
        }
        if verbose {
            self.level = String::from("debug");
        }
        self
    }

    /// Filter directive for the crate's own events; dependencies stay at warn
    pub fn filter_directive(&self) -> String {
        let level = self.level.trim().to_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => format!("ticktag={level},warn"),
            _ => String::from("ticktag=info,warn"),
        }
    }

    pub fn is_json(&self) -> bool {
        self.format.trim().eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        let store = &mut config.store;
        set_string(&mut store.base_url, "TICKTAG_STORE_URL");
        if let Some(base_id) = env_string("TICKTAG_BASE_ID") {
            store.base_id = base_id;
        }
        if let Some(token) =
            env_string("TICKTAG_API_TOKEN").or_else(|| env_string("AIRTABLE_API_KEY"))
        {
            store.api_token = token;
        }
        set_parsed(&mut store.timeout_secs, "TICKTAG_TIMEOUT")?;
        set_parsed(&mut store.page_size, "TICKTAG_PAGE_SIZE")?;
        set_parsed(&mut store.batch_size, "TICKTAG_BATCH_SIZE")?;
        set_parsed(&mut store.requests_per_second, "TICKTAG_RATE_LIMIT")?;

        config.clock.url = env_string("TICKTAG_CLOCK_URL");
        set_parsed(&mut config.clock.required, "TICKTAG_CLOCK_REQUIRED")?;

        let tables = &mut config.tables;
        set_string(&mut tables.schedules.table, "TICKTAG_SCHEDULES_TABLE");
        set_string(&mut tables.schedules.view, "TICKTAG_SCHEDULES_VIEW");
        set_string(&mut tables.trips.table, "TICKTAG_TRIPS_TABLE");
        set_string(&mut tables.trips.view, "TICKTAG_TRIPS_VIEW");
        set_string(&mut tables.shows.table, "TICKTAG_SHOWS_TABLE");
        set_string(&mut tables.shows.view, "TICKTAG_SHOWS_VIEW");

        let schedule = &mut config.fields.schedule;
        set_string(&mut schedule.status, "TICKTAG_FIELD_SCHEDULE_STATUS");
        set_string(&mut schedule.date, "TICKTAG_FIELD_SCHEDULE_DATE");
        set_string(&mut schedule.latest_estimate, "TICKTAG_FIELD_SCHEDULE_LATEST_ETA");
        set_string(&mut schedule.base_estimate, "TICKTAG_FIELD_SCHEDULE_ETA");

        let trip = &mut config.fields.trip;
        set_string(&mut trip.status, "TICKTAG_FIELD_TRIP_STATUS");
        set_string(&mut trip.live, "TICKTAG_FIELD_TRIP_LIVE");
        set_string(&mut trip.date, "TICKTAG_FIELD_TRIP_DATE");
        set_string(&mut trip.latest_go, "TICKTAG_FIELD_TRIP_LATEST_GO");
        set_string(&mut trip.base_go, "TICKTAG_FIELD_TRIP_GO");
        set_string(&mut trip.start, "TICKTAG_FIELD_TRIP_START");

        set_string(&mut config.fields.show.mode, "TICKTAG_FIELD_SHOW_MODE");

        let output = &mut config.fields.output;
        set_string(&mut output.now_epoch, "TICKTAG_FIELD_NOW_EPOCH");
        set_string(&mut output.temp, "TICKTAG_FIELD_TEMP");
        set_string(&mut output.bucket, "TICKTAG_FIELD_BUCKET");
        set_string(&mut output.next_due, "TICKTAG_FIELD_NEXT_DUE");

        config.tagger.mode_override = env_string("TICKTAG_MODE");
        set_parsed(&mut config.tagger.pass_delay_secs, "TICKTAG_PASS_DELAY")?;
        set_parsed(&mut config.tagger.dry_run, "TICKTAG_DRY_RUN")?;

        let washer = &mut config.washer;
        set_string(&mut washer.target.table, "TICKTAG_WASH_TABLE");
        set_string(&mut washer.target.view, "TICKTAG_WASH_VIEW");
        set_string(&mut washer.lock_field, "TICKTAG_FIELD_LOCK");
        set_parsed(&mut washer.relock, "TICKTAG_WASH_RELOCK")?;
        set_parsed(&mut washer.reschedule, "TICKTAG_WASH_RESCHEDULE")?;
        set_parsed(&mut washer.iterations, "TICKTAG_WASH_ITERATIONS")?;
        set_parsed(&mut washer.interval_secs, "TICKTAG_WASH_INTERVAL")?;
        washer.dry_run = config.tagger.dry_run;

        let publisher = &mut config.publisher;
        publisher.sink_url = env_string("TICKTAG_PUBLISH_URL");
        publisher.sink_token = env_string("TICKTAG_PUBLISH_TOKEN");
        if let Some(field) = env_string("TICKTAG_FIELD_DIRTY") {
            publisher.dirty_field = (!field.eq_ignore_ascii_case("none")).then_some(field);
        }
        set_parsed(&mut publisher.max_conflict_retries, "TICKTAG_PUBLISH_RETRIES")?;
        if let Some(exports) = env_string("TICKTAG_PUBLISH_EXPORTS") {
            publisher.exports = exports
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(ExportTarget::from_str)
                .collect::<Result<_>>()
                .context("Failed to parse TICKTAG_PUBLISH_EXPORTS")?;
        }
        publisher.dry_run = config.tagger.dry_run;

        set_string(&mut config.logging.level, "TICKTAG_LOG_LEVEL");
        set_string(&mut config.logging.format, "TICKTAG_LOG_FORMAT");

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from a file when given, otherwise from the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }

    /// Validate settings shared by every job
    pub fn validate(&self) -> Result<()> {
        if self.store.base_id.trim().is_empty() {
            anyhow::bail!("store.base_id must be set");
        }

        if self.store.api_token.trim().is_empty() {
            anyhow::bail!("store.api_token must be set");
        }

        if self.store.page_size == 0 {
            anyhow::bail!("page_size must be greater than 0");
        }

        if !(1..=MAX_BATCH_SIZE).contains(&self.store.batch_size) {
            anyhow::bail!("batch_size must be between 1 and {MAX_BATCH_SIZE}");
        }

        if self.store.requests_per_second == 0 {
            anyhow::bail!("requests_per_second must be greater than 0");
        }

        if self.clock.required && self.clock.url.is_none() {
            anyhow::bail!("clock.url is required but not configured");
        }

        for tv in [&self.tables.schedules, &self.tables.trips, &self.tables.shows] {
            if tv.table.trim().is_empty() {
                anyhow::bail!("table names must not be empty");
            }
        }

        Ok(())
    }

    /// Validate publisher settings
    pub fn validate_publisher(&self) -> Result<()> {
        if self.publisher.sink_url.is_none() {
            anyhow::bail!("publisher.sink_url must be set");
        }

        if self.publisher.exports.is_empty() {
            anyhow::bail!("publisher.exports must list at least one table");
        }

        if self.publisher.exports.iter().any(|e| e.path.trim().is_empty()) {
            anyhow::bail!("publisher export paths must not be empty");
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.store.timeout_secs)
    }

    /// Get the DAY inter-pass delay as Duration
    #[must_use]
    pub fn pass_delay(&self) -> Duration {
        Duration::from_secs(self.tagger.pass_delay_secs)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn set_string(target: &mut String, key: &str) {
    if let Some(value) = env_string(key) {
        *target = value;
    }
}

fn set_parsed<T>(target: &mut T, key: &str) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = env_string(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {key}: {e}"))?;
    }
    Ok(())
}
