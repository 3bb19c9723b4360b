//! Key-value store integration.
//!
//! The store is reached over the Upstash-style Redis REST protocol; the
//! scanner turns every readable entry into a normalized document.

pub mod client;
pub mod scanner;
pub mod types;

pub use client::RedisRestClient;
pub use scanner::{ScanReport, StoreScanner};
pub use types::{StoreError, StoreValue, ValueKind};
