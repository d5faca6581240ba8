// Core data structures for ticktag jobs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Field name to value map as returned by the record store
pub type FieldMap = serde_json::Map<String, Value>;

/// A record listed from a table view
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Record {
    pub id: String,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default)]
    pub fields: FieldMap,
}

impl Record {
    /// Create a record with the given id and fields
    pub fn new(id: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            id: id.into(),
            created_time: None,
            fields,
        }
    }

    /// Text value of a field, see [`field_text`]
    pub fn text(&self, name: &str) -> Option<String> {
        field_text(&self.fields, name)
    }

    /// Whether a field holds a truthy flag, see [`is_truthy`]
    pub fn flag(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(is_truthy)
    }

    /// Epoch seconds stored in a field, see [`field_epoch`]
    pub fn epoch(&self, name: &str) -> Option<i64> {
        field_epoch(&self.fields, name)
    }

    /// Parsed creation timestamp
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Partial update for a single record
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RecordPatch {
    pub id: String,
    pub fields: FieldMap,
}

impl RecordPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: FieldMap::new(),
        }
    }

    /// Set a field, returning self for chaining
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Extract text from a field value.
///
/// Strings are trimmed, numbers are rendered, and lookup arrays yield their
/// first element. Blank text counts as absent.
pub fn field_text(fields: &FieldMap, name: &str) -> Option<String> {
    fields.get(name).and_then(value_text)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.first().and_then(value_text),
        _ => None,
    }
}

/// A flag is truthy when it is boolean `true` or numeric `1`
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::Array(items) => items.first().is_some_and(is_truthy),
        _ => false,
    }
}

/// Read an epoch-seconds field (number or numeric text)
pub fn field_epoch(fields: &FieldMap, name: &str) -> Option<i64> {
    match fields.get(name)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Urgency classification of a record, stored as "temp" and "bucket"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bucket {
    Done,
    Live,
    Hot,
    Warm,
    Cold,
}

impl Bucket {
    /// Get string representation as stored in the table
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "DONE",
            Self::Live => "LIVE",
            Self::Hot => "HOT",
            Self::Warm => "WARM",
            Self::Cold => "COLD",
        }
    }

    /// Parse a stored label (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DONE" => Some(Self::Done),
            "LIVE" => Some(Self::Live),
            "HOT" => Some(Self::Hot),
            "WARM" => Some(Self::Warm),
            "COLD" => Some(Self::Cold),
            _ => None,
        }
    }

    /// Get all buckets
    pub fn all() -> [Self; 5] {
        [Self::Done, Self::Live, Self::Hot, Self::Warm, Self::Cold]
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global cadence regime for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Day,
    Night,
    Holdover,
}

impl Mode {
    /// Normalize a raw mode value. Blank or unrecognized input is HOLDOVER.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_uppercase()).as_deref() {
            Some("DAY") => Self::Day,
            Some("NIGHT") => Self::Night,
            _ => Self::Holdover,
        }
    }

    /// Whether a raw value names a known mode
    pub fn is_known(raw: &str) -> bool {
        matches!(raw.trim().to_uppercase().as_str(), "DAY" | "NIGHT" | "HOLDOVER")
    }

    /// Number of tagging passes per run
    pub fn pass_count(&self) -> usize {
        match self {
            Self::Day => 2,
            Self::Night => 1,
            Self::Holdover => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "DAY",
            Self::Night => "NIGHT",
            Self::Holdover => "HOLDOVER",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record status after normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Completed,
    Underway,
    Other,
}

impl RecordStatus {
    /// Compare ignoring case and whitespace
    pub fn parse(raw: Option<&str>) -> Self {
        let normalized: String = raw
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "completed" => Self::Completed,
            "underway" => Self::Underway,
            _ => Self::Other,
        }
    }
}

/// Server time as seen by one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    /// Current time in epoch seconds
    pub now_epoch: i64,
    /// Local offset from UTC in minutes (e.g. -300 for UTC-5)
    pub tz_offset_minutes: i32,
}

impl ClockSnapshot {
    pub fn new(now_epoch: i64, tz_offset_minutes: i32) -> Self {
        Self {
            now_epoch,
            tz_offset_minutes,
        }
    }

    /// Snapshot of the local process clock with zero offset
    pub fn local() -> Self {
        Self::new(Utc::now().timestamp(), 0)
    }
}
