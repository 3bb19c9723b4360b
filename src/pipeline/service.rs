//! Ingestion service sequencing scan, filter, chunk, embed, and index.

use crate::{
    config::get_config,
    document::DocumentMetadata,
    embedding::{EmbeddingClient, get_embedding_client},
    filter,
    metrics::{IngestMetrics, MetricsSnapshot},
    pipeline::{
        chunking::{chunk_text, dedupe_chunks, determine_chunk_size},
        types::{PipelineError, RunOutcome, RunParams},
    },
    qdrant::{PointInsert, QdrantService},
    store::{RedisRestClient, StoreScanner},
};
use std::sync::Arc;

struct PendingChunk {
    text: String,
    chunk_hash: String,
    metadata: DocumentMetadata,
}

/// Coordinates one ingestion run end to end.
///
/// Owns long-lived handles to the store scanner, the embedding client, and
/// the Qdrant transport. The scan is read-only with respect to the store, and
/// a run with identical store contents and rules hands an identical document
/// batch to the ingestion steps, so repeated runs are safe.
pub struct IngestionService {
    scanner: StoreScanner,
    embedding_client: Box<dyn EmbeddingClient + Send + Sync>,
    qdrant_service: QdrantService,
    metrics: Arc<IngestMetrics>,
}

impl IngestionService {
    /// Build a new ingestion service from the process configuration.
    pub fn new() -> Result<Self, PipelineError> {
        let scanner = StoreScanner::new(RedisRestClient::new()?);
        tracing::info!("Initializing embedding client");
        let embedding_client = get_embedding_client();
        let qdrant_service = QdrantService::new()?;

        Ok(Self {
            scanner,
            embedding_client,
            qdrant_service,
            metrics: Arc::new(IngestMetrics::new()),
        })
    }

    /// Run the full pipeline: scan the store, filter documents, and index the
    /// surviving batch.
    ///
    /// An unreachable store produces an empty run rather than an error; a
    /// failure in chunking, embedding, or the vector store write is logged
    /// and returned to the caller with no partial rollback.
    pub async fn run(&self, params: RunParams) -> Result<RunOutcome, PipelineError> {
        let config = get_config();
        tracing::info!(
            collection = %params.collection,
            data_source_id = %params.data_source_id,
            inclusion_rules = params.inclusion_rules.len(),
            exclusion_rules = params.exclusion_rules.len(),
            "Starting ingestion run"
        );

        let report = self.scanner.scan(&params.data_source_id).await;
        let store_unreachable = report.connection_error.is_some();
        let documents_loaded = report.documents.len();
        self.metrics
            .record_scan(documents_loaded as u64, report.skipped_keys as u64);

        let documents = filter::apply_rules(
            report.documents,
            &params.inclusion_rules,
            &params.exclusion_rules,
        );
        let documents_kept = documents.len();
        let documents_dropped = documents_loaded - documents_kept;
        self.metrics.record_dropped(documents_dropped as u64);

        let chunk_size = determine_chunk_size(
            config.chunk_size,
            config.embedding_provider,
            &config.embedding_model,
        );
        let overlap = config.chunk_overlap.unwrap_or(0);
        tracing::debug!(
            chunk_size,
            overlap,
            provider = ?config.embedding_provider,
            model = %config.embedding_model,
            "Derived chunk configuration"
        );

        self.qdrant_service
            .create_collection_if_not_exists(&params.collection, config.embedding_dimension as u64)
            .await?;
        self.qdrant_service
            .ensure_payload_indexes(&params.collection)
            .await?;

        let mut pending: Vec<PendingChunk> = Vec::new();
        let mut skipped_duplicate_chunks = 0;
        for document in &documents {
            let chunks = chunk_text(
                &document.text,
                chunk_size,
                overlap,
                config.embedding_provider,
                &config.embedding_model,
            )?;
            let (prepared, skipped) = dedupe_chunks(chunks);
            skipped_duplicate_chunks += skipped;
            for chunk in prepared {
                pending.push(PendingChunk {
                    text: chunk.text,
                    chunk_hash: chunk.chunk_hash,
                    metadata: document.metadata.clone(),
                });
            }
        }

        let texts: Vec<String> = pending.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedding_client
                .generate_embeddings(texts)
                .await
                .inspect_err(|error| {
                    tracing::error!(error = %error, "Embedding failed; aborting run");
                })?
        };

        debug_assert_eq!(pending.len(), embeddings.len());

        let points: Vec<PointInsert> = pending
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, vector)| PointInsert {
                text: chunk.text,
                chunk_hash: chunk.chunk_hash,
                vector,
                metadata: chunk.metadata,
            })
            .collect();

        let chunks_indexed = self
            .qdrant_service
            .index_points(&params.collection, points)
            .await
            .inspect_err(|error| {
                tracing::error!(
                    collection = %params.collection,
                    error = %error,
                    "Vector store write failed; aborting run"
                );
            })?;

        self.metrics
            .record_indexed(documents_kept as u64, chunks_indexed as u64);
        tracing::info!(
            collection = %params.collection,
            documents_loaded,
            documents_kept,
            documents_dropped,
            keys_skipped = report.skipped_keys,
            chunks_indexed,
            skipped_duplicate_chunks,
            chunk_size,
            "Ingestion run complete"
        );

        Ok(RunOutcome {
            documents_loaded,
            documents_kept,
            documents_dropped,
            keys_skipped: report.skipped_keys,
            chunks_indexed,
            skipped_duplicate_chunks,
            chunk_size,
            store_unreachable,
        })
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
