//! ticktag - scheduled jobs for a hosted tabular database
//!
//! Keeps schedule and trip records tagged with how soon their next event is
//! and when they should be re-checked, and publishes table views as static
//! JSON files.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Records, patches, buckets, modes and clock snapshots
//! - [`tagging`] - Time parsing, bucket classification, cadence and passes
//! - [`store`] - Record store trait and REST client
//! - [`clock`] - Server clock sources
//! - [`washer`] - Due-record detection loop
//! - [`publisher`] - JSON export and publish sink
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use ticktag::clock;
//! use ticktag::config::Config;
//! use ticktag::store::AirtableStore;
//! use ticktag::tagging::Tagger;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = AirtableStore::new(&config.store)?;
//!     let clock = clock::from_config(&config.clock, config.request_timeout())?;
//!     let report = Tagger::new(&store, clock.as_ref(), &config).run().await?;
//!     println!("{} passes in {} mode", report.passes.len(), report.mode);
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod publisher;
pub mod store;
pub mod tagging;
pub mod utils;
pub mod washer;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{ClockSource, HttpClock, SystemClock};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, JobErrorTrait, Result};
    pub use crate::models::{Bucket, ClockSnapshot, Mode, Record, RecordPatch};
    pub use crate::publisher::{HttpPublishSink, PublishSink, Publisher};
    pub use crate::store::{AirtableStore, RecordStore};
    pub use crate::tagging::Tagger;
    pub use crate::washer::Washer;
}

// Direct re-exports for convenience
pub use models::{Bucket, ClockSnapshot, Mode, Record, RecordPatch};
