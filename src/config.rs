use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the redindex pipeline.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Hostname of the Redis-compatible store.
    pub redis_host: String,
    /// Port of the store's REST endpoint.
    pub redis_port: u16,
    /// Optional bearer token used to authenticate against the store.
    pub redis_password: Option<String>,
    /// Optional logical database index selected before every command.
    pub redis_database: Option<u32>,
    /// Whether the store connection uses TLS.
    pub redis_tls: bool,
    /// Base URL of the Qdrant instance that stores embeddings.
    pub qdrant_url: String,
    /// Name of the Qdrant collection that receives indexed chunks.
    pub qdrant_collection_name: String,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Optional override for the automatic chunk size selection.
    pub chunk_size: Option<usize>,
    /// Optional token overlap between adjacent chunks.
    pub chunk_overlap: Option<usize>,
    /// Default identifier recorded on documents produced by a run.
    pub data_source_id: Option<String>,
}

/// Supported embedding backends for the processing pipeline.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Hosted OpenAI embeddings API.
    OpenAI,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            redis_host: load_env("REDIS_HOST")?,
            redis_port: load_env("REDIS_PORT")?
                .parse()
                .map_err(|_| ConfigError::InvalidValue("REDIS_PORT".to_string()))?,
            redis_password: load_env_optional("REDIS_PASSWORD"),
            redis_database: load_env_optional("REDIS_DATABASE")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("REDIS_DATABASE".to_string()))
                })
                .transpose()?,
            redis_tls: load_env_optional("REDIS_TLS")
                .map(|value| parse_bool(&value, "REDIS_TLS"))
                .transpose()?
                .unwrap_or(false),
            qdrant_url: load_env("QDRANT_URL")?,
            qdrant_collection_name: load_env("QDRANT_COLLECTION_NAME")?,
            qdrant_api_key: load_env_optional("QDRANT_API_KEY"),
            embedding_provider: load_env("EMBEDDING_PROVIDER")?.parse().map_err(|()| {
                ConfigError::InvalidValue("EMBEDDING_PROVIDER".to_string())
            })?,
            embedding_model: load_env("EMBEDDING_MODEL")?,
            embedding_dimension: load_env("EMBEDDING_DIMENSION")?.parse().map_err(|_| {
                ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string())
            })?,
            chunk_size: load_env_optional("TEXT_SPLITTER_CHUNK_SIZE")
                .map(|value| parse_positive(&value, "TEXT_SPLITTER_CHUNK_SIZE"))
                .transpose()?,
            chunk_overlap: load_env_optional("TEXT_SPLITTER_CHUNK_OVERLAP")
                .map(|value| {
                    value.parse().map_err(|_| {
                        ConfigError::InvalidValue("TEXT_SPLITTER_CHUNK_OVERLAP".to_string())
                    })
                })
                .transpose()?,
            data_source_id: load_env_optional("DATA_SOURCE_ID"),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

fn parse_positive(value: &str, key: &str) -> Result<usize, ConfigError> {
    let parsed: usize = value
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))?;
    if parsed == 0 {
        return Err(ConfigError::InvalidValue(key.to_string()));
    }
    Ok(parsed)
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        redis_host = %config.redis_host,
        redis_port = config.redis_port,
        redis_tls = config.redis_tls,
        qdrant_url = %config.qdrant_url,
        collection = %config.qdrant_collection_name,
        embedding_provider = ?config.embedding_provider,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
