#![deny(missing_docs)]

//! Core library for the redindex ingestion tool.
//!
//! The pipeline scans every entry in a Redis-compatible store, serializes each
//! value to text, normalizes it into a [`document::Document`], filters the
//! documents through regex inclusion/exclusion rules, and indexes the
//! survivors into a Qdrant collection as embedded chunks.

/// Environment-driven configuration management.
pub mod config;
/// Document entity and metadata normalization.
pub mod document;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Regex rule engine deciding which documents get ingested.
pub mod filter;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion run metrics helpers.
pub mod metrics;
/// Pipeline orchestration: scan, filter, chunk, embed, index.
pub mod pipeline;
/// Qdrant vector store integration.
pub mod qdrant;
/// Key-value store integration: REST client, value model, scanner.
pub mod store;
