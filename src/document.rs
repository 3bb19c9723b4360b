//! Document construction and metadata normalization.
//!
//! A [`Document`] is the uniform representation of one store entry: the key,
//! the serialized text of its value, and a fixed set of metadata fields. The
//! [`normalize`] constructor is a pure function so that the same inputs always
//! yield an identical document.

use serde::Serialize;

/// Sentinel recorded in `last_modified` when a key has no usable expiry.
///
/// A non-positive time-to-live is treated the same as a missing expiry; the
/// two cases are deliberately not distinguished.
pub const NO_EXPIRY: &str = "no_expiry";

/// Metadata attached to every document. Serialization preserves declaration
/// order, so consumers see a stable field ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    /// The store key, used as the path-like identifier for rule matching.
    pub file_path: String,
    /// Last `/`-separated segment of the key, or the key itself.
    pub file_name: String,
    /// Reserved for future use; always empty.
    pub file_extension: String,
    /// Remaining time-to-live in seconds when positive, else [`NO_EXPIRY`].
    pub last_modified: String,
    /// Identifier of the ingestion run or source that produced the document.
    pub data_source_id: String,
    /// Lower-cased suffix of `file_name` after its final `.`, possibly empty.
    pub file_type: String,
}

/// Uniform text + metadata representation of one store entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Unique key of the originating store entry.
    pub key: String,
    /// Serialized textual rendering of the entry's value.
    pub text: String,
    /// Derived metadata for filtering and payload storage.
    pub metadata: DocumentMetadata,
}

/// Build a document from a key, its serialized value, its remaining
/// time-to-live, and the identifier of the current run.
///
/// Pure and deterministic: no I/O, and identical inputs always produce an
/// identical document.
pub fn normalize(key: &str, text: String, ttl: i64, data_source_id: &str) -> Document {
    let file_name = key.rsplit('/').next().unwrap_or(key).to_string();
    let file_type = match file_name.rfind('.') {
        Some(index) => file_name[index + 1..].to_lowercase(),
        None => String::new(),
    };
    let last_modified = if ttl > 0 {
        ttl.to_string()
    } else {
        NO_EXPIRY.to_string()
    };

    Document {
        key: key.to_string(),
        text,
        metadata: DocumentMetadata {
            file_path: key.to_string(),
            file_name,
            file_extension: String::new(),
            last_modified,
            data_source_id: data_source_id.to_string(),
            file_type,
        },
    }
}
