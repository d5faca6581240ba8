//! Record patches for tagging output fields

use serde_json::Value;

use crate::config::OutputFields;
use crate::models::{field_epoch, field_text, Bucket, FieldMap, Mode, RecordPatch};
use crate::tagging::cadence;

/// Build the output patch for one record.
///
/// The now-epoch stamp is always written. Temp, bucket and next-due are only
/// written when they differ from what the record already holds, including
/// transitions into and out of an empty next-due.
pub fn build_patch(
    record_id: &str,
    existing: &FieldMap,
    now_epoch: i64,
    bucket: Bucket,
    mode: Mode,
    outputs: &OutputFields,
) -> RecordPatch {
    let mut patch = RecordPatch::new(record_id).with(outputs.now_epoch.as_str(), now_epoch);

    let label = bucket.as_str();
    if field_text(existing, &outputs.temp).as_deref() != Some(label) {
        patch = patch.with(outputs.temp.as_str(), label);
    }
    if field_text(existing, &outputs.bucket).as_deref() != Some(label) {
        patch = patch.with(outputs.bucket.as_str(), label);
    }

    let next_due = cadence::next_due(mode, bucket, now_epoch);
    if field_epoch(existing, &outputs.next_due) != next_due {
        let value = next_due.map_or(Value::Null, Value::from);
        patch = patch.with(outputs.next_due.as_str(), value);
    }

    patch
}
