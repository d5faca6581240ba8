//! Record store access
//!
//! The tabular store is the single source of truth. Jobs only list records
//! through a view and patch fields on existing records; nothing here creates
//! or deletes rows.
//!
//! - [`RecordStore`] - the seam every job is written against
//! - [`AirtableStore`] - REST implementation with paging, batching and rate limiting

pub mod client;

use async_trait::async_trait;

use crate::models::{Record, RecordPatch};
use crate::utils::error::StoreError;

pub use client::AirtableStore;

/// Read and patch access to a tabular record store
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List every record visible through `view`, following pagination
    async fn list_records(&self, table: &str, view: &str) -> Result<Vec<Record>, StoreError>;

    /// Apply patches to records of `table`, returning the number written
    async fn patch_records(
        &self,
        table: &str,
        patches: &[RecordPatch],
    ) -> Result<usize, StoreError>;
}
