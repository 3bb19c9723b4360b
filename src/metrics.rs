//! Ingestion run metrics helpers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct IngestMetrics {
    documents_loaded: AtomicU64,
    keys_skipped: AtomicU64,
    documents_dropped: AtomicU64,
    documents_indexed: AtomicU64,
    chunks_indexed: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a store scan.
    pub fn record_scan(&self, loaded: u64, skipped: u64) {
        self.documents_loaded.fetch_add(loaded, Ordering::Relaxed);
        self.keys_skipped.fetch_add(skipped, Ordering::Relaxed);
    }

    /// Record documents dropped by filter rules.
    pub fn record_dropped(&self, dropped: u64) {
        self.documents_dropped.fetch_add(dropped, Ordering::Relaxed);
    }

    /// Record documents and chunks indexed into the vector store.
    pub fn record_indexed(&self, documents: u64, chunks: u64) {
        self.documents_indexed
            .fetch_add(documents, Ordering::Relaxed);
        self.chunks_indexed.fetch_add(chunks, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_loaded: self.documents_loaded.load(Ordering::Relaxed),
            keys_skipped: self.keys_skipped.load(Ordering::Relaxed),
            documents_dropped: self.documents_dropped.load(Ordering::Relaxed),
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents produced by store scans since startup.
    pub documents_loaded: u64,
    /// Store keys skipped during scans.
    pub keys_skipped: u64,
    /// Documents dropped by filter rules.
    pub documents_dropped: u64,
    /// Documents handed to the ingestion pipeline.
    pub documents_indexed: u64,
    /// Total chunk count indexed across all runs.
    pub chunks_indexed: u64,
}
