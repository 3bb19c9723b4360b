//! Core data types and error definitions for the ingestion pipeline.

use crate::embedding::EmbeddingClientError;
use crate::qdrant::QdrantError;
use crate::store::StoreError;
use anyhow::Error as TokenizerError;
use thiserror::Error;

/// Errors produced while turning document text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Ingestion configured an impossible token budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Tokenizer resources were unavailable for the configured model.
    #[error("failed to initialize tokenizer for model '{model}': {source}")]
    Tokenizer {
        /// Embedding model we attempted to load.
        model: String,
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: TokenizerError,
    },
}

/// Errors emitted by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Store client could not be constructed.
    #[error("Store client error: {0}")]
    Store(#[from] StoreError),
    /// Chunking step failed to segment a document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Embedding provider failed to produce vectors for the input text.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Qdrant interaction failed during collection setup or indexing.
    #[error("Qdrant request failed: {0}")]
    Qdrant(#[from] QdrantError),
}

/// Configuration surface of one ingestion run.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Target Qdrant collection.
    pub collection: String,
    /// Identifier recorded on every document produced by this run.
    pub data_source_id: String,
    /// Inclusion rule patterns; empty means include everything not excluded.
    pub inclusion_rules: Vec<String>,
    /// Exclusion rule patterns; matches are dropped unconditionally.
    pub exclusion_rules: Vec<String>,
}

/// Summary of a completed ingestion run.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    /// Documents produced by the store scan.
    pub documents_loaded: usize,
    /// Documents that survived rule filtering and were handed to ingestion.
    pub documents_kept: usize,
    /// Documents dropped by inclusion/exclusion rules.
    pub documents_dropped: usize,
    /// Store keys skipped during the scan (unreadable or unsupported shape).
    pub keys_skipped: usize,
    /// Chunks indexed into the vector store.
    pub chunks_indexed: usize,
    /// Chunks skipped within the run due to duplicate `chunk_hash`.
    pub skipped_duplicate_chunks: usize,
    /// Chunk size used during processing.
    pub chunk_size: usize,
    /// Whether the store could not be reached (the run then indexes nothing).
    pub store_unreachable: bool,
}
