//! Ingestion pipeline: scan, filter, chunk, embed, index.

pub mod chunking;
mod service;
pub mod types;

pub use service::IngestionService;
pub use types::{ChunkingError, PipelineError, RunOutcome, RunParams};
