//! Chunk-size heuristics and semantic chunking helpers.
//!
//! Chunk boundaries come from a semantic splitter driven by a token counter:
//! `tiktoken` encodings where the model is known, a whitespace counter
//! otherwise. When no explicit chunk size is configured, a budget is derived
//! from the embedding model's context window and clamped to a conservative
//! range. An optional sliding token overlap keeps spans around boundaries
//! visible to retrieval without exceeding the budget.

use crate::config::EmbeddingProvider;
use crate::pipeline::types::ChunkingError;
use crate::qdrant::compute_chunk_hash;
use anyhow::Error as TokenizerError;
use semchunk_rs::Chunker;
use std::collections::HashSet;
use std::sync::Arc;
use tiktoken_rs::{CoreBPE, cl100k_base, get_bpe_from_model, model::get_context_size};

type TokenCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

const MIN_AUTOMATIC_CHUNK_SIZE: usize = 256;
const MAX_AUTOMATIC_CHUNK_SIZE: usize = 1024;

/// Chunk text with associated hash ready for ingestion.
#[derive(Debug, Clone)]
pub(crate) struct PreparedChunk {
    /// Chunk text content.
    pub(crate) text: String,
    /// Stable digest used for dedupe.
    pub(crate) chunk_hash: String,
}

/// Determine the chunk size for a run.
///
/// An explicit override wins and is clamped at `>= 1`; otherwise a quarter of
/// the provider/model context window, clamped into `[256, 1024]`.
pub(crate) fn determine_chunk_size(
    override_size: Option<usize>,
    provider: EmbeddingProvider,
    model: &str,
) -> usize {
    if let Some(explicit) = override_size {
        return explicit.max(1);
    }

    let window = embedding_context_window(provider, model);
    (window / 4)
        .max(1)
        .clamp(MIN_AUTOMATIC_CHUNK_SIZE, MAX_AUTOMATIC_CHUNK_SIZE)
}

fn embedding_context_window(provider: EmbeddingProvider, model: &str) -> usize {
    match provider {
        EmbeddingProvider::OpenAI => {
            if model.starts_with("text-embedding-3") || model.starts_with("text-embedding-ada-002")
            {
                8192
            } else {
                get_context_size(model)
            }
        }
        EmbeddingProvider::Ollama => {
            let normalized = model.to_lowercase();
            match normalized.as_str() {
                "nomic-embed-text" | "mxbai-embed-large" | "mxbai-embed-large-v1" => 8192,
                value if value.contains("all-minilm") => 512,
                value if value.contains("e5-large") => 4096,
                _ => {
                    tracing::trace!(model, "Using default context window estimate");
                    4096
                }
            }
        }
    }
}

/// Chunk text into semantic segments not exceeding `chunk_size` tokens, with
/// an optional sliding token overlap between adjacent segments.
///
/// Returns an empty vector when the input text is all whitespace.
pub(crate) fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    provider: EmbeddingProvider,
    model: &str,
) -> Result<Vec<String>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let token_counter = build_token_counter(provider, model)?;
    Ok(chunk_text_with_counter(
        text,
        chunk_size,
        overlap,
        token_counter,
    ))
}

/// Remove duplicate chunks within a document, keeping the first occurrence.
pub(crate) fn dedupe_chunks(chunks: Vec<String>) -> (Vec<PreparedChunk>, usize) {
    let mut seen = HashSet::new();
    let mut prepared = Vec::new();
    let mut skipped = 0;

    for text in chunks {
        if text.trim().is_empty() {
            continue;
        }
        let hash = compute_chunk_hash(&text);
        if seen.insert(hash.clone()) {
            prepared.push(PreparedChunk {
                text,
                chunk_hash: hash,
            });
        } else {
            skipped += 1;
        }
    }

    (prepared, skipped)
}

/// Build a token counter for the given provider/model.
///
/// OpenAI models must resolve to a `tiktoken` encoding; unknown local models
/// fall back to whitespace counting with a logged warning so ingestion keeps
/// flowing.
fn build_token_counter(
    provider: EmbeddingProvider,
    model: &str,
) -> Result<TokenCounter, ChunkingError> {
    match provider {
        EmbeddingProvider::OpenAI => build_tiktoken_counter(model),
        EmbeddingProvider::Ollama => match build_tiktoken_counter(model) {
            Ok(counter) => Ok(counter),
            Err(error) => {
                tracing::warn!(
                    model,
                    error = %error,
                    "Tokenizer unavailable for model; falling back to whitespace counter"
                );
                Ok(whitespace_token_counter())
            }
        },
    }
}

fn build_tiktoken_counter(model: &str) -> Result<TokenCounter, ChunkingError> {
    let target = {
        let trimmed = model.trim();
        if trimmed.is_empty() { "cl100k_base" } else { trimmed }
    };
    let encoding = resolve_encoding(target).map_err(|source| ChunkingError::Tokenizer {
        model: target.to_string(),
        source,
    })?;
    let encoding = Arc::new(encoding);

    Ok(Arc::new(move |segment: &str| {
        encoding.encode_ordinary(segment).len()
    }))
}

fn resolve_encoding(model: &str) -> Result<CoreBPE, TokenizerError> {
    match get_bpe_from_model(model) {
        Ok(encoding) => Ok(encoding),
        Err(model_err) => {
            tracing::debug!(
                model,
                error = %model_err,
                "Tokenizer model lookup failed; using 'cl100k_base' encoding"
            );
            cl100k_base()
        }
    }
}

fn whitespace_token_counter() -> TokenCounter {
    Arc::new(|segment: &str| {
        let tokens = segment.split_whitespace().count();
        if tokens == 0 && !segment.is_empty() {
            1
        } else {
            tokens
        }
    })
}

fn chunk_text_with_counter(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    token_counter: TokenCounter,
) -> Vec<String> {
    let counter_for_chunker = token_counter.clone();
    let chunker = Chunker::new(
        chunk_size,
        Box::new(move |segment: &str| counter_for_chunker.as_ref()(segment)),
    );
    let base_chunks = chunker.chunk(text);
    apply_overlap(base_chunks, chunk_size, overlap, &token_counter)
}

/// Prepend a token-limited tail of each previous chunk to the next one,
/// trimming from the front so the result never exceeds `chunk_size`.
fn apply_overlap(
    chunks: Vec<String>,
    chunk_size: usize,
    overlap: usize,
    token_counter: &TokenCounter,
) -> Vec<String> {
    let effective_overlap = overlap.min(chunk_size.saturating_sub(1));
    if effective_overlap == 0 || chunks.len() < 2 {
        return chunks;
    }

    let mut overlapped = Vec::with_capacity(chunks.len());
    overlapped.push(chunks[0].clone());

    for window in chunks.windows(2) {
        let tail = token_tail(&window[0], effective_overlap, token_counter);
        let combined = if tail.is_empty() {
            window[1].clone()
        } else {
            format!("{tail} {}", window[1])
        };
        overlapped.push(shrink_to_budget(combined, chunk_size, token_counter));
    }

    overlapped
}

/// Longest suffix of `text` (on whitespace boundaries) within `limit` tokens.
fn token_tail<'a>(text: &'a str, limit: usize, token_counter: &TokenCounter) -> &'a str {
    if limit == 0 {
        return "";
    }

    let mut candidate = text.trim();
    while !candidate.is_empty() && token_counter.as_ref()(candidate) > limit {
        candidate = match candidate.split_once(char::is_whitespace) {
            Some((_, rest)) => rest.trim_start(),
            None => "",
        };
    }
    candidate
}

fn shrink_to_budget(text: String, budget: usize, token_counter: &TokenCounter) -> String {
    if token_counter.as_ref()(&text) <= budget {
        return text;
    }
    token_tail(&text, budget, token_counter).to_string()
}
