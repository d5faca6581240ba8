//! Due-record washer
//!
//! A demonstration loop over one view: find records whose next-due time has
//! passed and that are not locked, then optionally lock them and push their
//! next-due time forward by the cadence for their stored temp.

use serde::Serialize;
use serde_json::Value;

use crate::clock::ClockSource;
use crate::config::Config;
use crate::error::Result;
use crate::models::{ClockSnapshot, Mode, Record, RecordPatch};
use crate::store::RecordStore;
use crate::tagging::cadence::interval_for_label;
use crate::tagging::orchestrator::resolve_mode;

/// Result of one detection round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WashRound {
    pub clock: ClockSnapshot,
    /// Ids of due, unlocked records
    pub due: Vec<String>,
    pub patches: Vec<RecordPatch>,
    pub written: usize,
}

/// Result of a washer run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WashReport {
    pub mode: Mode,
    pub rounds: Vec<WashRound>,
}

pub struct Washer<'a> {
    store: &'a dyn RecordStore,
    clock: &'a dyn ClockSource,
    config: &'a Config,
}

impl<'a> Washer<'a> {
    pub fn new(store: &'a dyn RecordStore, clock: &'a dyn ClockSource, config: &'a Config) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub async fn run(&self) -> Result<WashReport> {
        let mode = resolve_mode(
            self.store,
            &self.config.tables.shows,
            &self.config.fields.show.mode,
            self.config.tagger.mode_override.as_deref(),
        )
        .await?;

        let settings = &self.config.washer;
        let mut rounds = Vec::new();

        for round in 0..settings.iterations {
            if round > 0 {
                tokio::time::sleep(std::time::Duration::from_secs(settings.interval_secs)).await;
            }
            rounds.push(self.run_round(mode).await?);
        }

        Ok(WashReport { mode, rounds })
    }

    pub async fn run_round(&self, mode: Mode) -> Result<WashRound> {
        let settings = &self.config.washer;
        let next_due_field = &self.config.fields.output.next_due;
        let clock = self.clock.snapshot().await?;

        let records = self
            .store
            .list_records(&settings.target.table, &settings.target.view)
            .await?;

        let due: Vec<&Record> = records
            .iter()
            .filter(|r| is_due(r, next_due_field, &settings.lock_field, clock.now_epoch))
            .collect();

        for record in &due {
            tracing::info!(
                record = %record.id,
                next_due = ?record.epoch(next_due_field),
                "Record is due"
            );
        }

        let patches: Vec<RecordPatch> = due
            .iter()
            .map(|record| self.patch_for(record, mode, clock.now_epoch))
            .filter(|patch| !patch.is_empty())
            .collect();

        let written = if settings.dry_run {
            for patch in &patches {
                tracing::info!(record = %patch.id, "Dry run, washer patch not written");
            }
            0
        } else {
            self.store
                .patch_records(&settings.target.table, &patches)
                .await?
        };

        tracing::info!(
            listed = records.len(),
            due = due.len(),
            written,
            "Wash round complete"
        );

        Ok(WashRound {
            clock,
            due: due.iter().map(|r| r.id.clone()).collect(),
            patches,
            written,
        })
    }

    fn patch_for(&self, record: &Record, mode: Mode, now_epoch: i64) -> RecordPatch {
        let settings = &self.config.washer;
        let outputs = &self.config.fields.output;
        let mut patch = RecordPatch::new(record.id.clone());

        if settings.relock {
            patch = patch.with(settings.lock_field.as_str(), true);
        }

        if settings.reschedule {
            let temp = record.text(&outputs.temp);
            let next_due = interval_for_label(mode, temp.as_deref())
                .map_or(Value::Null, |interval| Value::from(now_epoch + interval));
            patch = patch.with(outputs.next_due.as_str(), next_due);
        }

        patch
    }
}

/// A record is due when its next-due epoch has passed and it is not locked
pub fn is_due(record: &Record, next_due_field: &str, lock_field: &str, now_epoch: i64) -> bool {
    !record.flag(lock_field)
        && record
            .epoch(next_due_field)
            .is_some_and(|next_due| next_due <= now_epoch)
}
