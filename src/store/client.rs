//! HTTP client for the Upstash-style Redis REST protocol.
//!
//! Each command is a JSON array POSTed to the endpoint root and answered with
//! `{"result": …}` (or `{"error": …}`). When a logical database index is
//! configured, commands are prefixed with a `SELECT` through the `/pipeline`
//! endpoint, since the REST transport is stateless per request.

use crate::config::get_config;
use crate::store::types::{CommandResponse, StoreError, StoreValue, ValueKind};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

/// Lightweight HTTP client for store commands.
pub struct RedisRestClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) password: Option<String>,
    pub(crate) database: Option<u32>,
}

impl RedisRestClient {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, StoreError> {
        let config = get_config();
        let client = Client::builder()
            .user_agent("redindex/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()?;

        let scheme = if config.redis_tls { "https" } else { "http" };
        let base_url = format!("{scheme}://{}:{}", config.redis_host, config.redis_port);
        tracing::debug!(
            url = %base_url,
            database = ?config.redis_database,
            has_password = config
                .redis_password
                .as_deref()
                .map(|value| !value.is_empty())
                .unwrap_or(false),
            "Initialized store REST client"
        );

        Ok(Self {
            client,
            base_url,
            password: config.redis_password.clone(),
            database: config.redis_database,
        })
    }

    /// Enumerate keys matching the given pattern.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let result = self.execute(&["KEYS", pattern]).await?;
        string_items("KEYS", &result)
    }

    /// Report the storage shape of a key.
    pub async fn value_kind(&self, key: &str) -> Result<ValueKind, StoreError> {
        let result = self.execute(&["TYPE", key]).await?;
        Ok(ValueKind::from_wire(&string_item("TYPE", &result)?))
    }

    /// Remaining time-to-live of a key in seconds; negative when the key has
    /// no expiry or is missing.
    pub async fn ttl(&self, key: &str) -> Result<i64, StoreError> {
        let result = self.execute(&["TTL", key]).await?;
        integer_item("TTL", &result)
    }

    /// Read a key's value using the command appropriate for its shape.
    ///
    /// Total over [`ValueKind`]: the unsupported branch is an explicit error
    /// so callers decide how to skip, and a `nil` scalar reply (key deleted
    /// between enumeration and read) is reported the same way.
    pub async fn fetch_value(
        &self,
        key: &str,
        kind: &ValueKind,
    ) -> Result<StoreValue, StoreError> {
        let value = match kind {
            ValueKind::Scalar => {
                let result = self.execute(&["GET", key]).await?;
                if result.is_null() {
                    return Err(StoreError::MalformedResult {
                        command: "GET".to_string(),
                        detail: "nil reply".to_string(),
                    });
                }
                StoreValue::Scalar(string_item("GET", &result)?)
            }
            ValueKind::Map => {
                let result = self.execute(&["HGETALL", key]).await?;
                StoreValue::Map(field_pairs("HGETALL", &result)?)
            }
            ValueKind::Sequence => {
                let result = self.execute(&["LRANGE", key, "0", "-1"]).await?;
                StoreValue::Sequence(string_items("LRANGE", &result)?)
            }
            ValueKind::Set => {
                let result = self.execute(&["SMEMBERS", key]).await?;
                StoreValue::Set(string_items("SMEMBERS", &result)?)
            }
            ValueKind::OrderedSet => {
                let result = self.execute(&["ZRANGE", key, "0", "-1"]).await?;
                StoreValue::OrderedSet(string_items("ZRANGE", &result)?)
            }
            ValueKind::Unsupported(wire) => {
                return Err(StoreError::MalformedResult {
                    command: "TYPE".to_string(),
                    detail: format!("unsupported storage shape '{wire}'"),
                });
            }
        };
        Ok(value)
    }

    /// Execute one command, routing through `/pipeline` with a `SELECT`
    /// prefix when a logical database is configured.
    async fn execute(&self, command: &[&str]) -> Result<Value, StoreError> {
        match self.database {
            Some(database) => {
                let body = json!([["SELECT", database.to_string()], command]);
                let payload = self.send("/pipeline", &body).await?;
                let mut responses: Vec<CommandResponse> = serde_json::from_value(payload)
                    .map_err(|err| StoreError::MalformedResult {
                        command: join_command(command),
                        detail: err.to_string(),
                    })?;
                if responses.len() != 2 {
                    return Err(StoreError::MalformedResult {
                        command: join_command(command),
                        detail: format!("pipeline returned {} replies", responses.len()),
                    });
                }
                let reply = responses.remove(1);
                let select = responses.remove(0);
                if let Some(error) = select.error {
                    return Err(StoreError::Command(error));
                }
                unwrap_reply(reply)
            }
            None => {
                let body = json!(command);
                let payload = self.send("/", &body).await?;
                let reply: CommandResponse = serde_json::from_value(payload).map_err(|err| {
                    StoreError::MalformedResult {
                        command: join_command(command),
                        detail: err.to_string(),
                    }
                })?;
                unwrap_reply(reply)
            }
        }
    }

    async fn send(&self, path: &str, body: &Value) -> Result<Value, StoreError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let mut request = self.client.post(url).json(body);
        if let Some(password) = &self.password
            && !password.is_empty()
        {
            request = request.bearer_auth(password);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(reply) = serde_json::from_str::<CommandResponse>(&body)
                && let Some(error) = reply.error
            {
                return Err(StoreError::Command(error));
            }
            return Err(StoreError::UnexpectedStatus { status, body });
        }

        Ok(response.json().await?)
    }
}

fn unwrap_reply(reply: CommandResponse) -> Result<Value, StoreError> {
    if let Some(error) = reply.error {
        return Err(StoreError::Command(error));
    }
    Ok(reply.result.unwrap_or(Value::Null))
}

fn join_command(command: &[&str]) -> String {
    command.join(" ")
}

fn text_item(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn string_item(command: &str, value: &Value) -> Result<String, StoreError> {
    text_item(value).ok_or_else(|| malformed(command, value))
}

fn string_items(command: &str, value: &Value) -> Result<Vec<String>, StoreError> {
    let items = value.as_array().ok_or_else(|| malformed(command, value))?;
    items
        .iter()
        .map(|item| text_item(item).ok_or_else(|| malformed(command, item)))
        .collect()
}

fn integer_item(command: &str, value: &Value) -> Result<i64, StoreError> {
    value.as_i64().ok_or_else(|| malformed(command, value))
}

fn field_pairs(command: &str, value: &Value) -> Result<Vec<(String, String)>, StoreError> {
    let flat = string_items(command, value)?;
    if flat.len() % 2 != 0 {
        return Err(StoreError::MalformedResult {
            command: command.to_string(),
            detail: format!("odd number of hash items ({})", flat.len()),
        });
    }
    Ok(flat
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect())
}

fn malformed(command: &str, value: &Value) -> StoreError {
    StoreError::MalformedResult {
        command: command.to_string(),
        detail: value.to_string(),
    }
}
