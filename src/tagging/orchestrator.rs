//! Tagging passes over schedule and trip records
//!
//! A run resolves the operating mode once and then performs its passes:
//!
//! ```text
//! determine-mode ─┬─ HOLDOVER ─> done (no passes)
//!                 ├─ NIGHT ────> pass
//!                 └─ DAY ──────> pass ─> wait ─> pass
//! ```
//!
//! A pass fetches a fresh clock snapshot, lists schedules and trips, builds a
//! patch per record, then submits one batched write per table. Any fetch or
//! write failure aborts the run.

use serde::Serialize;

use crate::clock::ClockSource;
use crate::config::{Config, TableView};
use crate::error::Result;
use crate::models::{Bucket, ClockSnapshot, Mode, Record, RecordPatch};
use crate::store::RecordStore;
use crate::tagging::bucket::{classify_schedule, classify_trip, ScheduleInput, TripInput};
use crate::tagging::patch::build_patch;

/// Result of one pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassOutcome {
    pub clock: ClockSnapshot,
    pub schedule_patches: Vec<RecordPatch>,
    pub trip_patches: Vec<RecordPatch>,
    /// Records written to the store (0 in dry-run)
    pub written: usize,
}

/// Result of a full run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub mode: Mode,
    pub passes: Vec<PassOutcome>,
}

/// Drives tagging passes against a record store
pub struct Tagger<'a> {
    store: &'a dyn RecordStore,
    clock: &'a dyn ClockSource,
    config: &'a Config,
}

impl<'a> Tagger<'a> {
    pub fn new(store: &'a dyn RecordStore, clock: &'a dyn ClockSource, config: &'a Config) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Resolve the mode and run the passes it calls for
    pub async fn run(&self) -> Result<RunReport> {
        let mode = resolve_mode(
            self.store,
            &self.config.tables.shows,
            &self.config.fields.show.mode,
            self.config.tagger.mode_override.as_deref(),
        )
        .await?;

        let pass_count = mode.pass_count();
        tracing::info!(mode = %mode, passes = pass_count, "Resolved operating mode");

        let mut passes = Vec::with_capacity(pass_count);
        for pass in 0..pass_count {
            if pass > 0 {
                let delay = self.config.pass_delay();
                tracing::info!(delay_secs = delay.as_secs(), "Waiting before next pass");
                tokio::time::sleep(delay).await;
            }

            let outcome = self.run_pass(mode, pass + 1).await?;
            passes.push(outcome);
        }

        if passes.is_empty() {
            tracing::info!("Holdover mode, nothing to tag");
        }

        Ok(RunReport { mode, passes })
    }

    /// Run a single fetch-classify-patch pass
    pub async fn run_pass(&self, mode: Mode, pass: usize) -> Result<PassOutcome> {
        let clock = self.clock.snapshot().await?;
        tracing::info!(
            pass,
            now_epoch = clock.now_epoch,
            tz_offset_minutes = clock.tz_offset_minutes,
            "Starting pass"
        );

        let tables = &self.config.tables;
        let fields = &self.config.fields;

        let schedules = self
            .store
            .list_records(&tables.schedules.table, &tables.schedules.view)
            .await?;
        let schedule_patches: Vec<RecordPatch> = schedules
            .iter()
            .map(|record| {
                let input = ScheduleInput::from_record(record, &fields.schedule);
                let bucket = classify_schedule(&input, &clock);
                self.patch_for(record, bucket, mode, &clock)
            })
            .collect();

        let trips = self
            .store
            .list_records(&tables.trips.table, &tables.trips.view)
            .await?;
        let trip_patches: Vec<RecordPatch> = trips
            .iter()
            .map(|record| {
                let bucket = classify_trip(&TripInput::from_record(record, &fields.trip), &clock);
                self.patch_for(record, bucket, mode, &clock)
            })
            .collect();

        let written = self.submit(&tables.schedules, &schedule_patches).await?
            + self.submit(&tables.trips, &trip_patches).await?;

        tracing::info!(
            pass,
            schedules = schedule_patches.len(),
            trips = trip_patches.len(),
            written,
            "Pass complete"
        );

        Ok(PassOutcome {
            clock,
            schedule_patches,
            trip_patches,
            written,
        })
    }

    fn patch_for(
        &self,
        record: &Record,
        bucket: Bucket,
        mode: Mode,
        clock: &ClockSnapshot,
    ) -> RecordPatch {
        tracing::debug!(record = %record.id, bucket = %bucket, "Classified record");
        build_patch(
            &record.id,
            &record.fields,
            clock.now_epoch,
            bucket,
            mode,
            &self.config.fields.output,
        )
    }

    async fn submit(&self, target: &TableView, patches: &[RecordPatch]) -> Result<usize> {
        if self.config.tagger.dry_run {
            for patch in patches {
                tracing::info!(
                    table = %target.table,
                    record = %patch.id,
                    fields = %serde_json::Value::Object(patch.fields.clone()),
                    "Dry run, patch not written"
                );
            }
            return Ok(0);
        }

        Ok(self.store.patch_records(&target.table, patches).await?)
    }
}

/// Determine the operating mode for a run.
///
/// An override wins without touching the store. Otherwise the newest show
/// record (by creation time) supplies the mode. Unknown or missing values
/// normalize to HOLDOVER.
pub async fn resolve_mode(
    store: &dyn RecordStore,
    shows: &TableView,
    mode_field: &str,
    mode_override: Option<&str>,
) -> Result<Mode> {
    if let Some(raw) = mode_override {
        warn_unknown_mode(raw);
        return Ok(Mode::normalize(Some(raw)));
    }

    let records = store.list_records(&shows.table, &shows.view).await?;
    let raw = newest_record(&records).and_then(|record| record.text(mode_field));

    match raw.as_deref() {
        Some(raw) => warn_unknown_mode(raw),
        None => tracing::warn!(table = %shows.table, "No mode found on show records"),
    }

    Ok(Mode::normalize(raw.as_deref()))
}

fn warn_unknown_mode(raw: &str) {
    if !Mode::is_known(raw) {
        tracing::warn!(value = raw, "Unknown mode, treating as HOLDOVER");
    }
}

/// Most recently created record; ties and missing timestamps favor list order
fn newest_record(records: &[Record]) -> Option<&Record> {
    records
        .iter()
        .enumerate()
        .max_by_key(|(index, record)| (record.created_at(), *index))
        .map(|(_, record)| record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(id: &str, created: Option<&str>) -> Record {
        Record {
            id: id.to_string(),
            created_time: created.map(String::from),
            fields: Default::default(),
        }
    }

    #[test]
    fn test_newest_record_by_created_time() {
        let records = vec![
            show("old", Some("2024-03-01T00:00:00.000Z")),
            show("new", Some("2024-03-09T00:00:00.000Z")),
            show("mid", Some("2024-03-05T00:00:00.000Z")),
        ];
        assert_eq!(newest_record(&records).unwrap().id, "new");
    }

    #[test]
    fn test_newest_record_without_timestamps() {
        let records = vec![show("first", None), show("second", None)];
        assert_eq!(newest_record(&records).unwrap().id, "second");

        let records = vec![show("dated", Some("2024-03-01T00:00:00Z")), show("undated", None)];
        assert_eq!(newest_record(&records).unwrap().id, "dated");

        assert!(newest_record(&[]).is_none());
    }
}
