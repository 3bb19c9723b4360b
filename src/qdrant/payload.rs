//! Helpers for constructing and hashing Qdrant payloads.

use crate::document::DocumentMetadata;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// Build the payload object stored alongside each indexed chunk.
///
/// Carries the full document metadata so every chunk remains traceable to the
/// store entry it came from.
pub(crate) fn build_payload(
    text: &str,
    timestamp_rfc3339: &str,
    chunk_hash: &str,
    metadata: &DocumentMetadata,
) -> Value {
    let mut payload = Map::new();
    payload.insert(
        "file_path".into(),
        Value::String(metadata.file_path.clone()),
    );
    payload.insert(
        "file_name".into(),
        Value::String(metadata.file_name.clone()),
    );
    payload.insert(
        "data_source_id".into(),
        Value::String(metadata.data_source_id.clone()),
    );
    payload.insert(
        "last_modified".into(),
        Value::String(metadata.last_modified.clone()),
    );
    if !metadata.file_type.is_empty() {
        payload.insert(
            "file_type".into(),
            Value::String(metadata.file_type.clone()),
        );
    }
    if !metadata.file_extension.is_empty() {
        payload.insert(
            "file_extension".into(),
            Value::String(metadata.file_extension.clone()),
        );
    }
    payload.insert(
        "timestamp".into(),
        Value::String(timestamp_rfc3339.to_string()),
    );
    payload.insert("chunk_hash".into(), Value::String(chunk_hash.to_string()));
    payload.insert("text".into(), Value::String(text.to_string()));

    Value::Object(payload)
}

/// Compute a deterministic SHA-256 hash for the chunk text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Current timestamp formatted for payload storage.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Construct an identifier suitable for Qdrant points.
pub(crate) fn generate_point_id() -> String {
    Uuid::new_v4().to_string()
}
