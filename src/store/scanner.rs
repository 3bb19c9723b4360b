//! Full-store scan producing normalized documents.
//!
//! The scanner walks every key one at a time: shape lookup, value read, TTL
//! read. Per-key failures and unsupported shapes become skip records instead
//! of aborting the scan; only a failure to enumerate keys at all ends a scan,
//! and even that yields an empty report rather than an error.

use crate::document::{self, Document};
use crate::store::client::RedisRestClient;
use crate::store::types::{StoreError, ValueKind};

/// Result of folding one key during a scan.
#[derive(Debug)]
enum KeyOutcome {
    /// The key produced a fully constructed document.
    Document(Document),
    /// The key was dropped; the reason travels with it.
    Skipped { key: String, reason: SkipReason },
}

/// Why a key was dropped from the scan.
#[derive(Debug)]
enum SkipReason {
    /// The store reported a shape outside the supported set.
    UnsupportedKind(String),
    /// A read against the key failed.
    Read(StoreError),
}

/// Outcome of one complete scan pass.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Documents produced from readable, supported entries, in key order.
    pub documents: Vec<Document>,
    /// Number of keys dropped due to per-key failures or unsupported shapes.
    pub skipped_keys: usize,
    /// Set when the store could not be reached at all; the document list is
    /// empty in that case.
    pub connection_error: Option<String>,
}

/// Enumerates store entries and serializes each into a document.
pub struct StoreScanner {
    client: RedisRestClient,
}

impl StoreScanner {
    /// Wrap a connected store client. The client is owned exclusively by the
    /// scanner for the duration of a run.
    pub fn new(client: RedisRestClient) -> Self {
        Self { client }
    }

    /// Enumerate every key and produce a document per readable, supported
    /// entry. Read-only with respect to the store.
    pub async fn scan(&self, data_source_id: &str) -> ScanReport {
        let keys = match self.client.keys("*").await {
            Ok(keys) => keys,
            Err(error) => {
                tracing::error!(error = %error, "Store unreachable; scan produced no documents");
                return ScanReport {
                    connection_error: Some(error.to_string()),
                    ..ScanReport::default()
                };
            }
        };

        let mut report = ScanReport::default();
        for key in keys {
            match self.scan_key(key, data_source_id).await {
                KeyOutcome::Document(document) => report.documents.push(document),
                KeyOutcome::Skipped { key, reason } => {
                    match &reason {
                        SkipReason::UnsupportedKind(kind) => tracing::warn!(
                            key = %key,
                            kind = %kind,
                            "Skipping key with unsupported storage shape"
                        ),
                        SkipReason::Read(error) => tracing::warn!(
                            key = %key,
                            error = %error,
                            "Skipping key that failed to read"
                        ),
                    }
                    report.skipped_keys += 1;
                }
            }
        }

        tracing::info!(
            documents = report.documents.len(),
            skipped = report.skipped_keys,
            "Store scan complete"
        );
        report
    }

    async fn scan_key(&self, key: String, data_source_id: &str) -> KeyOutcome {
        let kind = match self.client.value_kind(&key).await {
            Ok(kind) => kind,
            Err(error) => {
                return KeyOutcome::Skipped {
                    key,
                    reason: SkipReason::Read(error),
                };
            }
        };

        if let ValueKind::Unsupported(wire) = kind {
            return KeyOutcome::Skipped {
                key,
                reason: SkipReason::UnsupportedKind(wire),
            };
        }

        let value = match self.client.fetch_value(&key, &kind).await {
            Ok(value) => value,
            Err(error) => {
                return KeyOutcome::Skipped {
                    key,
                    reason: SkipReason::Read(error),
                };
            }
        };

        let ttl = match self.client.ttl(&key).await {
            Ok(ttl) => ttl,
            Err(error) => {
                return KeyOutcome::Skipped {
                    key,
                    reason: SkipReason::Read(error),
                };
            }
        };

        KeyOutcome::Document(document::normalize(&key, value.render(), ttl, data_source_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NO_EXPIRY;
    use httpmock::{Method::POST, MockServer};
    use reqwest::Client;
    use serde_json::json;

    fn scanner_for(server: &MockServer) -> StoreScanner {
        StoreScanner::new(RedisRestClient {
            client: Client::builder()
                .user_agent("redindex-test")
                .build()
                .expect("client"),
            base_url: server.base_url(),
            password: None,
            database: None,
        })
    }

    async fn mock_command(server: &MockServer, command: serde_json::Value, result: serde_json::Value) {
        server
            .mock_async(move |when, then| {
                when.method(POST).path("/").json_body(command);
                then.status(200).json_body(json!({ "result": result }));
            })
            .await;
    }

    #[tokio::test]
    async fn scan_serializes_each_supported_shape() {
        let server = MockServer::start_async().await;
        mock_command(
            &server,
            json!(["KEYS", "*"]),
            json!(["note", "user:1:profile", "chat:1:messages", "tags:popular", "leaderboard"]),
        )
        .await;

        mock_command(&server, json!(["TYPE", "note"]), json!("string")).await;
        mock_command(&server, json!(["GET", "note"]), json!("plain text")).await;
        mock_command(&server, json!(["TTL", "note"]), json!(-1)).await;

        mock_command(&server, json!(["TYPE", "user:1:profile"]), json!("hash")).await;
        mock_command(
            &server,
            json!(["HGETALL", "user:1:profile"]),
            json!(["name", "Ada", "email", "ada@example.com"]),
        )
        .await;
        mock_command(&server, json!(["TTL", "user:1:profile"]), json!(-1)).await;

        mock_command(&server, json!(["TYPE", "chat:1:messages"]), json!("list")).await;
        mock_command(
            &server,
            json!(["LRANGE", "chat:1:messages", "0", "-1"]),
            json!(["hello", "goodbye"]),
        )
        .await;
        mock_command(&server, json!(["TTL", "chat:1:messages"]), json!(3600)).await;

        mock_command(&server, json!(["TYPE", "tags:popular"]), json!("set")).await;
        mock_command(
            &server,
            json!(["SMEMBERS", "tags:popular"]),
            json!(["zeta", "alpha"]),
        )
        .await;
        mock_command(&server, json!(["TTL", "tags:popular"]), json!(-1)).await;

        mock_command(&server, json!(["TYPE", "leaderboard"]), json!("zset")).await;
        mock_command(
            &server,
            json!(["ZRANGE", "leaderboard", "0", "-1"]),
            json!(["user3", "user2", "user1"]),
        )
        .await;
        mock_command(&server, json!(["TTL", "leaderboard"]), json!(-1)).await;

        let report = scanner_for(&server).scan("run-1").await;

        assert_eq!(report.skipped_keys, 0);
        assert!(report.connection_error.is_none());
        let by_key: Vec<(&str, &str)> = report
            .documents
            .iter()
            .map(|doc| (doc.key.as_str(), doc.text.as_str()))
            .collect();
        assert_eq!(
            by_key,
            vec![
                ("note", "plain text"),
                ("user:1:profile", "email: ada@example.com\nname: Ada"),
                ("chat:1:messages", "hello\ngoodbye"),
                ("tags:popular", "alpha\nzeta"),
                ("leaderboard", "user3\nuser2\nuser1"),
            ]
        );
        assert_eq!(report.documents[2].metadata.last_modified, "3600");
        assert_eq!(report.documents[0].metadata.last_modified, NO_EXPIRY);
    }

    #[tokio::test]
    async fn unsupported_and_failing_keys_are_skipped_not_fatal() {
        let server = MockServer::start_async().await;
        mock_command(
            &server,
            json!(["KEYS", "*"]),
            json!(["good", "events", "broken"]),
        )
        .await;

        mock_command(&server, json!(["TYPE", "good"]), json!("string")).await;
        mock_command(&server, json!(["GET", "good"]), json!("ok")).await;
        mock_command(&server, json!(["TTL", "good"]), json!(-1)).await;

        mock_command(&server, json!(["TYPE", "events"]), json!("stream")).await;

        mock_command(&server, json!(["TYPE", "broken"]), json!("string")).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/").json_body(json!(["GET", "broken"]));
                then.status(500).body("boom");
            })
            .await;

        let report = scanner_for(&server).scan("run-1").await;

        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.documents[0].key, "good");
        assert_eq!(report.skipped_keys, 2);
        assert!(report.connection_error.is_none());
    }

    #[tokio::test]
    async fn one_unsupported_key_among_ten_yields_nine_documents() {
        let server = MockServer::start_async().await;
        let mut keys: Vec<String> = (0..9).map(|i| format!("note:{i}")).collect();
        keys.push("stream:events".to_string());
        mock_command(&server, json!(["KEYS", "*"]), json!(keys)).await;

        for i in 0..9 {
            let key = format!("note:{i}");
            mock_command(&server, json!(["TYPE", &key]), json!("string")).await;
            mock_command(&server, json!(["GET", &key]), json!(format!("body {i}"))).await;
            mock_command(&server, json!(["TTL", &key]), json!(-1)).await;
        }
        mock_command(&server, json!(["TYPE", "stream:events"]), json!("stream")).await;

        let report = scanner_for(&server).scan("run-1").await;

        assert_eq!(report.documents.len(), 9);
        assert_eq!(report.skipped_keys, 1);
        assert!(report.connection_error.is_none());
    }

    #[tokio::test]
    async fn connection_failure_yields_empty_report() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/").json_body(json!(["KEYS", "*"]));
                then.status(503).body("unavailable");
            })
            .await;

        let report = scanner_for(&server).scan("run-1").await;

        assert!(report.documents.is_empty());
        assert_eq!(report.skipped_keys, 0);
        assert!(report.connection_error.is_some());
    }
}
