//! Shared types for the store integration: errors, storage shapes, and the
//! value union with its deterministic text rendering.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned while talking to the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The REST endpoint answered with an unexpected status code.
    #[error("Unexpected store response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the endpoint.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// The store reported a command-level error.
    #[error("Store command failed: {0}")]
    Command(String),
    /// A command succeeded but its result had an unusable shape.
    #[error("Malformed result for {command}: {detail}")]
    MalformedResult {
        /// Command whose reply could not be interpreted.
        command: String,
        /// Description of the offending reply.
        detail: String,
    },
}

/// Storage shape reported by the store for a key.
///
/// The supported set is closed; anything else is carried as
/// [`ValueKind::Unsupported`] so callers can skip it as data rather than
/// handle an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// Plain string value.
    Scalar,
    /// Field/value hash.
    Map,
    /// Ordered list.
    Sequence,
    /// Unordered member set.
    Set,
    /// Score-ordered member set.
    OrderedSet,
    /// Any wire kind outside the supported closed set (streams, etc.).
    Unsupported(String),
}

impl ValueKind {
    /// Map the store's `TYPE` reply onto the closed shape set.
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "string" => Self::Scalar,
            "hash" => Self::Map,
            "list" => Self::Sequence,
            "set" => Self::Set,
            "zset" => Self::OrderedSet,
            other => Self::Unsupported(other.to_string()),
        }
    }
}

/// A key's value as a closed tagged union over the supported shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreValue {
    /// Plain string value.
    Scalar(String),
    /// Field/value pairs of a hash, in reply order.
    Map(Vec<(String, String)>),
    /// List elements in list order.
    Sequence(Vec<String>),
    /// Set members in reply order (rendering sorts them).
    Set(Vec<String>),
    /// Sorted-set members in score order.
    OrderedSet(Vec<String>),
}

impl StoreValue {
    /// Serialize the value to text.
    ///
    /// Deterministic for a given value: map fields sort by name and set
    /// members sort lexicographically before rendering, while sequences and
    /// ordered sets keep their inherent order.
    pub fn render(&self) -> String {
        match self {
            Self::Scalar(value) => value.clone(),
            Self::Map(fields) => {
                let mut fields = fields.clone();
                fields.sort();
                fields
                    .iter()
                    .map(|(field, value)| format!("{field}: {value}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Self::Sequence(items) | Self::OrderedSet(items) => items.join("\n"),
            Self::Set(members) => {
                let mut members = members.clone();
                members.sort();
                members.join("\n")
            }
        }
    }
}

/// Wire shape of a single command reply: `{"result": …}` or `{"error": …}`.
#[derive(Deserialize)]
pub(crate) struct CommandResponse {
    #[serde(default)]
    pub(crate) result: Option<serde_json::Value>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_kinds_map_onto_the_closed_shape_set() {
        assert_eq!(ValueKind::from_wire("string"), ValueKind::Scalar);
        assert_eq!(ValueKind::from_wire("hash"), ValueKind::Map);
        assert_eq!(ValueKind::from_wire("list"), ValueKind::Sequence);
        assert_eq!(ValueKind::from_wire("set"), ValueKind::Set);
        assert_eq!(ValueKind::from_wire("zset"), ValueKind::OrderedSet);
        assert_eq!(
            ValueKind::from_wire("stream"),
            ValueKind::Unsupported("stream".to_string())
        );
    }

    #[test]
    fn scalar_renders_verbatim() {
        assert_eq!(StoreValue::Scalar("hello".into()).render(), "hello");
        assert_eq!(StoreValue::Scalar(String::new()).render(), "");
    }

    #[test]
    fn map_renders_sorted_by_field() {
        let value = StoreValue::Map(vec![
            ("name".into(), "Ada".into()),
            ("email".into(), "ada@example.com".into()),
        ]);
        assert_eq!(value.render(), "email: ada@example.com\nname: Ada");
    }

    #[test]
    fn sequence_keeps_list_order() {
        let value = StoreValue::Sequence(vec!["second".into(), "first".into()]);
        assert_eq!(value.render(), "second\nfirst");
    }

    #[test]
    fn set_renders_sorted_regardless_of_reply_order() {
        let a = StoreValue::Set(vec!["b".into(), "a".into(), "c".into()]);
        let b = StoreValue::Set(vec!["c".into(), "b".into(), "a".into()]);
        assert_eq!(a.render(), "a\nb\nc");
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn ordered_set_keeps_score_order() {
        let value = StoreValue::OrderedSet(vec!["user3".into(), "user2".into(), "user1".into()]);
        assert_eq!(value.render(), "user3\nuser2\nuser1");
    }

    #[test]
    fn rendering_is_deterministic() {
        let value = StoreValue::Map(vec![
            ("b".into(), "2".into()),
            ("a".into(), "1".into()),
        ]);
        assert_eq!(value.render(), value.render());
    }
}
