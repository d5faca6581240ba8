//! Rendering table views into JSON documents

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::ExportTarget;
use crate::models::Record;
use crate::utils::sha256_hex;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A rendered export ready for diffing and commit
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedExport {
    pub target: ExportTarget,
    pub bytes: Vec<u8>,
    pub sha256: String,
    /// Records carrying a truthy dirty flag
    pub dirty_ids: Vec<String>,
}

/// File entry sent to the publish sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishFile {
    pub path: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    /// Base64-encoded file body
    pub content: String,
}

/// Path and hash sent in a preflight diff
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDigest {
    pub path: String,
    pub sha256: String,
}

impl RenderedExport {
    pub fn is_dirty(&self) -> bool {
        !self.dirty_ids.is_empty()
    }

    pub fn digest(&self) -> FileDigest {
        FileDigest {
            path: self.target.path.clone(),
            sha256: self.sha256.clone(),
        }
    }

    pub fn to_file(&self) -> PublishFile {
        PublishFile {
            path: self.target.path.clone(),
            content_type: JSON_CONTENT_TYPE.to_string(),
            content: STANDARD.encode(&self.bytes),
        }
    }
}

/// Render records of one view as a pretty JSON array.
///
/// Each element holds the record id and its fields with sorted keys. The
/// dirty flag is bookkeeping and is left out of the document.
pub fn render_export(
    target: &ExportTarget,
    records: &[Record],
    dirty_field: Option<&str>,
) -> Result<RenderedExport, serde_json::Error> {
    let mut dirty_ids = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        if dirty_field.is_some_and(|field| record.flag(field)) {
            dirty_ids.push(record.id.clone());
        }

        let mut row: BTreeMap<String, Value> = record
            .fields
            .iter()
            .filter(|(name, _)| Some(name.as_str()) != dirty_field)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        row.insert("id".to_string(), Value::String(record.id.clone()));
        rows.push(row);
    }

    let bytes = serde_json::to_vec_pretty(&rows)?;
    let sha256 = sha256_hex(&bytes);

    Ok(RenderedExport {
        target: target.clone(),
        bytes,
        sha256,
        dirty_ids,
    })
}
