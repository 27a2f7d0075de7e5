//! Vectorshelf
//!
//! PDF ingestion pipeline for a local vector store:
//! - Per-page text extraction from PDF files
//! - Recursive separator-priority chunking with optional overlap
//! - Embedding generation through pluggable providers
//! - Append-only persistence with (document, page) provenance

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod pdf;
pub mod pipeline;
pub mod splitter;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::{create_embedder, Embedder};
pub use errors::{IngestError, Result};
pub use pipeline::{IngestReport, IngestionPipeline};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
