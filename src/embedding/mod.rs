//! Embedding client abstraction and adapters.

use crate::config::get_config;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient {
    /// Produce a fixed-dimension embedding vector for each supplied text.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError>;
}

/// Deterministic embedding client that folds bytes into a normalized vector.
///
/// Stands in for a hosted model: the same text always maps to the same
/// vector, which keeps repeated ingestion runs reproducible.
pub struct DeterministicClient;

impl DeterministicClient {
    /// Construct a new deterministic embedding client instance.
    pub const fn new() -> Self {
        Self
    }

    fn encode(text: &str, dimension: usize) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; dimension];
        if text.is_empty() {
            return embedding;
        }

        for (index, byte) in text.bytes().enumerate() {
            let slot = index % dimension;
            embedding[slot] += f32::from(byte) / 255.0;
        }

        let norm = embedding
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt();
        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }
}

impl Default for DeterministicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingClient for DeterministicClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        let config = get_config();
        let dimension = config.embedding_dimension;

        tracing::debug!(
            provider = ?config.embedding_provider,
            model = %config.embedding_model,
            dimension,
            count = texts.len(),
            "Generating embeddings"
        );

        if dimension == 0 {
            return Err(EmbeddingClientError::GenerationFailed(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        if texts.is_empty() {
            return Err(EmbeddingClientError::GenerationFailed(
                "no texts provided".to_string(),
            ));
        }

        Ok(texts
            .into_iter()
            .map(|text| Self::encode(&text, dimension))
            .collect())
    }
}

/// Build an embedding client suitable for the current configuration.
pub fn get_embedding_client() -> Box<dyn EmbeddingClient + Send + Sync> {
    Box::new(DeterministicClient::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_deterministic_and_normalized() {
        let a = DeterministicClient::encode("chat message", 8);
        let b = DeterministicClient::encode("chat message", 8);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_encodes_to_the_zero_vector() {
        let vector = DeterministicClient::encode("", 4);
        assert_eq!(vector, vec![0.0; 4]);
    }

    #[test]
    fn different_texts_produce_different_vectors() {
        let a = DeterministicClient::encode("alpha", 8);
        let b = DeterministicClient::encode("omega", 8);
        assert_ne!(a, b);
    }
}
