//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use ticktag::clock::ClockSource;
use ticktag::config::Config;
use ticktag::models::{ClockSnapshot, Record, RecordPatch};
use ticktag::store::RecordStore;
use ticktag::utils::error::{ClockError, StoreError};

/// 2024-03-10T19:00:00Z
pub const NOW: i64 = 1_710_097_200;

/// Build a record from a JSON object of fields
pub fn record(id: &str, fields: Value) -> Record {
    Record::new(id, fields.as_object().cloned().unwrap_or_default())
}

/// Build a record with a creation timestamp
pub fn record_created(id: &str, created: &str, fields: Value) -> Record {
    Record {
        created_time: Some(created.to_string()),
        ..record(id, fields)
    }
}

/// Configuration with placeholder credentials and no inter-pass delay
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.store.base_id = "appTest".to_string();
    config.store.api_token = "token".to_string();
    config.tagger.pass_delay_secs = 0;
    config.washer.interval_secs = 0;
    config
}

/// In-memory record store that applies and remembers every patch
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    writes: Mutex<Vec<(String, Vec<RecordPatch>)>>,
    failing: Mutex<HashSet<String>>,
    lists: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: &str, records: Vec<Record>) -> Self {
        self.tables
            .lock()
            .unwrap()
            .insert(table.to_string(), records);
        self
    }

    /// Make every list and patch on `table` fail
    pub fn fail_table(&self, table: &str) {
        self.failing.lock().unwrap().insert(table.to_string());
    }

    pub fn records(&self, table: &str) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn record(&self, table: &str, id: &str) -> Option<Record> {
        self.records(table).into_iter().find(|r| r.id == id)
    }

    /// Patch calls in order, one entry per `patch_records` call
    pub fn writes(&self) -> Vec<(String, Vec<RecordPatch>)> {
        self.writes.lock().unwrap().clone()
    }

    /// Tables listed, in order
    pub fn lists(&self) -> Vec<String> {
        self.lists.lock().unwrap().clone()
    }

    fn check(&self, table: &str) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().contains(table) {
            return Err(StoreError::Status {
                status: 503,
                body: format!("{table} unavailable"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_records(&self, table: &str, _view: &str) -> Result<Vec<Record>, StoreError> {
        self.check(table)?;
        self.lists.lock().unwrap().push(table.to_string());
        Ok(self.records(table))
    }

    async fn patch_records(
        &self,
        table: &str,
        patches: &[RecordPatch],
    ) -> Result<usize, StoreError> {
        self.check(table)?;
        if patches.is_empty() {
            return Ok(0);
        }

        let mut tables = self.tables.lock().unwrap();
        let records = tables.entry(table.to_string()).or_default();
        for patch in patches {
            if let Some(record) = records.iter_mut().find(|r| r.id == patch.id) {
                for (name, value) in &patch.fields {
                    record.fields.insert(name.clone(), value.clone());
                }
            }
        }

        self.writes
            .lock()
            .unwrap()
            .push((table.to_string(), patches.to_vec()));
        Ok(patches.len())
    }
}

/// Clock returning queued snapshots, repeating the last one
pub struct SequenceClock {
    snapshots: Mutex<VecDeque<ClockSnapshot>>,
    last: Mutex<ClockSnapshot>,
    calls: Mutex<usize>,
}

impl SequenceClock {
    pub fn new(snapshots: Vec<ClockSnapshot>) -> Self {
        let last = snapshots.first().copied().unwrap_or(ClockSnapshot::new(NOW, 0));
        Self {
            snapshots: Mutex::new(snapshots.into()),
            last: Mutex::new(last),
            calls: Mutex::new(0),
        }
    }

    pub fn fixed(now_epoch: i64, tz_offset_minutes: i32) -> Self {
        Self::new(vec![ClockSnapshot::new(now_epoch, tz_offset_minutes)])
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ClockSource for SequenceClock {
    async fn snapshot(&self) -> Result<ClockSnapshot, ClockError> {
        *self.calls.lock().unwrap() += 1;
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.snapshots.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(*last)
    }
}

/// Clock that always fails
pub struct BrokenClock;

#[async_trait]
impl ClockSource for BrokenClock {
    async fn snapshot(&self) -> Result<ClockSnapshot, ClockError> {
        Err(ClockError::Status(502))
    }
}
