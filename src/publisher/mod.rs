//! Static JSON publisher
//!
//! Exports configured table views as JSON files and commits the ones that
//! changed. Records carry a dirty checkbox; only exports with dirty records
//! are considered unless the run is forced, and flags are cleared once the
//! sink holds the current content.

pub mod export;
pub mod sink;

use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::models::RecordPatch;
use crate::store::RecordStore;

pub use export::{render_export, FileDigest, PublishFile, RenderedExport};
pub use sink::{HttpPublishSink, PublishSink};

/// Result of a publisher run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PublishReport {
    /// Every rendered export
    pub rendered: Vec<FileDigest>,
    /// Paths considered for commit
    pub candidates: Vec<String>,
    /// Paths sent in the commit
    pub committed: Vec<String>,
    /// Records whose dirty flag was cleared
    pub cleared: usize,
}

pub struct Publisher<'a> {
    store: &'a dyn RecordStore,
    sink: &'a dyn PublishSink,
    config: &'a Config,
}

impl<'a> Publisher<'a> {
    pub fn new(store: &'a dyn RecordStore, sink: &'a dyn PublishSink, config: &'a Config) -> Self {
        Self {
            store,
            sink,
            config,
        }
    }

    pub async fn run(&self, force: bool) -> Result<PublishReport> {
        let settings = &self.config.publisher;
        let dirty_field = settings.dirty_field.as_deref();

        let mut rendered = Vec::with_capacity(settings.exports.len());
        for target in &settings.exports {
            let records = self.store.list_records(&target.table, &target.view).await?;
            let export = render_export(target, &records, dirty_field)?;
            tracing::info!(
                table = %target.table,
                view = %target.view,
                path = %target.path,
                records = records.len(),
                dirty = export.dirty_ids.len(),
                sha256 = %export.sha256,
                "Rendered export"
            );
            rendered.push(export);
        }

        let candidates: Vec<&RenderedExport> = rendered
            .iter()
            .filter(|export| force || dirty_field.is_none() || export.is_dirty())
            .collect();

        let mut report = PublishReport {
            rendered: rendered.iter().map(RenderedExport::digest).collect(),
            candidates: candidates.iter().map(|e| e.target.path.clone()).collect(),
            ..Default::default()
        };

        if candidates.is_empty() {
            tracing::info!("No dirty exports, nothing to publish");
            return Ok(report);
        }

        let changed = if force {
            report.candidates.clone()
        } else {
            let digests: Vec<FileDigest> = candidates.iter().map(|e| e.digest()).collect();
            self.sink.preflight(&digests).await?
        };

        let files: Vec<PublishFile> = candidates
            .iter()
            .filter(|export| changed.contains(&export.target.path))
            .map(|export| export.to_file())
            .collect();

        if settings.dry_run {
            for file in &files {
                tracing::info!(path = %file.path, "Dry run, file not committed");
            }
            return Ok(report);
        }

        if files.is_empty() {
            tracing::info!("Sink already holds every candidate");
        } else {
            self.sink.commit(&files, force).await?;
            report.committed = files.into_iter().map(|f| f.path).collect();
            tracing::info!(files = report.committed.len(), force, "Committed exports");
        }

        if let Some(field) = dirty_field {
            for export in &candidates {
                report.cleared += self.clear_dirty(export, field).await?;
            }
        }

        Ok(report)
    }

    async fn clear_dirty(&self, export: &RenderedExport, field: &str) -> Result<usize> {
        if export.dirty_ids.is_empty() {
            return Ok(0);
        }

        let patches: Vec<RecordPatch> = export
            .dirty_ids
            .iter()
            .map(|id| RecordPatch::new(id.clone()).with(field, false))
            .collect();

        let cleared = self
            .store
            .patch_records(&export.target.table, &patches)
            .await?;
        tracing::debug!(table = %export.target.table, cleared, "Cleared dirty flags");
        Ok(cleared)
    }
}
