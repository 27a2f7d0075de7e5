//! Ingestion error types

use thiserror::Error;

/// Result type alias using IngestError
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("PDF parse error for {path}: {message}")]
    PdfParse { path: String, message: String },

    #[error("invalid separator pattern '{pattern}': {message}")]
    SeparatorPattern { pattern: String, message: String },

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("store error at {path}: {message}")]
    Store { path: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
