//! Temperature tagging of schedule and trip records
//!
//! Every tagging pass recomputes, from scratch, how close each record is to
//! its next event and when it should be looked at again. Output fields are
//! never read back as inputs, so a pass is a pure function of the store's
//! input fields, the clock snapshot and the operating mode.
//!
//! # Modules
//!
//! - [`timeparse`] - date/time text to epoch, with hour-24 rollover
//! - [`bucket`] - DONE/LIVE/HOT/WARM/COLD classification
//! - [`cadence`] - re-check interval per mode and bucket
//! - [`patch`] - change-suppressed output patches
//! - [`orchestrator`] - mode resolution and pass scheduling
//!
//! # Example
//!
//! ```
//! use ticktag::config::OutputFields;
//! use ticktag::models::{ClockSnapshot, FieldMap, Mode};
//! use ticktag::tagging::bucket::{classify_schedule, ScheduleInput};
//! use ticktag::tagging::patch::build_patch;
//!
//! let clock = ClockSnapshot::new(1_710_000_000, 0);
//! let input = ScheduleInput {
//!     status: Some("Underway".to_string()),
//!     ..Default::default()
//! };
//!
//! let bucket = classify_schedule(&input, &clock);
//! let patch = build_patch(
//!     "rec1",
//!     &FieldMap::new(),
//!     clock.now_epoch,
//!     bucket,
//!     Mode::Day,
//!     &OutputFields::default(),
//! );
//! assert_eq!(patch.fields["Next Due Epoch"], serde_json::json!(1_710_000_180));
//! ```

pub mod bucket;
pub mod cadence;
pub mod orchestrator;
pub mod patch;
pub mod timeparse;

pub use bucket::{classify_schedule, classify_trip, ScheduleInput, TripInput};
pub use cadence::{interval_for_label, interval_seconds};
pub use orchestrator::{resolve_mode, PassOutcome, RunReport, Tagger};
pub use patch::build_patch;
pub use timeparse::resolve_target_epoch;
