//! On-disk vector store
//!
//! Append-only store rooted at a persist directory:
//! - `meta.json` pins the embedding model and dimension for the store
//! - `records.jsonl` holds one embedding record per line
//!
//! Appends never consult existing records, so re-ingesting the same inputs
//! duplicates them. Writes are not transactional; a run killed mid-append
//! leaves whatever lines already reached disk.

use crate::errors::{IngestError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

const META_FILE: &str = "meta.json";
const RECORDS_FILE: &str = "records.jsonl";

/// A persisted (chunk, embedding) pair with source provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: Uuid,
    /// Originating document identifier
    pub document: String,
    /// Zero-based page index within the document
    pub page: u32,
    /// Chunk position within the document (page order, then split order)
    pub chunk_index: usize,
    /// Chunk text content
    pub text: String,
    /// Embedding vector
    pub embedding: Vec<f32>,
    /// Model that produced the vector
    pub model: String,
    pub created_at: DateTime<Utc>,
}

/// Store-level metadata, fixed at creation
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreMeta {
    model: String,
    dimension: usize,
    created_at: DateTime<Utc>,
}

/// Append-only vector store at a persist directory
#[derive(Debug)]
pub struct VectorStore {
    dir: PathBuf,
    meta: StoreMeta,
}

impl VectorStore {
    /// Open the store at `dir`, creating the directory and metadata on
    /// first use. Reopening validates that model and dimension match what
    /// the store was created with.
    pub fn open(dir: &Path, model: &str, dimension: usize) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| store_error(dir, &e.to_string()))?;

        let meta_path = dir.join(META_FILE);
        let meta = if meta_path.is_file() {
            let file = File::open(&meta_path).map_err(|e| store_error(dir, &e.to_string()))?;
            let meta: StoreMeta = serde_json::from_reader(BufReader::new(file))
                .map_err(|e| store_error(dir, &format!("Invalid {}: {}", META_FILE, e)))?;

            if meta.model != model {
                return Err(store_error(
                    dir,
                    &format!(
                        "Store was created with model '{}', configured model is '{}'",
                        meta.model, model
                    ),
                ));
            }
            if meta.dimension != dimension {
                return Err(store_error(
                    dir,
                    &format!(
                        "Store dimension is {}, configured dimension is {}",
                        meta.dimension, dimension
                    ),
                ));
            }

            debug!(dir = %dir.display(), "Opened existing vector store");
            meta
        } else {
            let meta = StoreMeta {
                model: model.to_string(),
                dimension,
                created_at: Utc::now(),
            };
            let json = serde_json::to_vec_pretty(&meta)
                .map_err(|e| store_error(dir, &e.to_string()))?;
            std::fs::write(&meta_path, json).map_err(|e| store_error(dir, &e.to_string()))?;

            info!(dir = %dir.display(), model, dimension, "Created vector store");
            meta
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            meta,
        })
    }

    /// Bulk-append records. Every vector is dimension-checked before any
    /// line is written; the file is flushed and synced before returning.
    pub fn append(&self, records: &[EmbeddingRecord]) -> Result<usize> {
        for record in records {
            if record.embedding.len() != self.meta.dimension {
                return Err(store_error(
                    &self.dir,
                    &format!(
                        "Record {} has dimension {}, store expects {}",
                        record.id,
                        record.embedding.len(),
                        self.meta.dimension
                    ),
                ));
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.records_path())
            .map_err(|e| store_error(&self.dir, &e.to_string()))?;
        let mut writer = BufWriter::new(file);

        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|e| store_error(&self.dir, &e.to_string()))?;
            writer
                .write_all(line.as_bytes())
                .and_then(|_| writer.write_all(b"\n"))
                .map_err(|e| store_error(&self.dir, &e.to_string()))?;
        }

        writer
            .flush()
            .map_err(|e| store_error(&self.dir, &e.to_string()))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| store_error(&self.dir, &e.to_string()))?;

        debug!(count = records.len(), dir = %self.dir.display(), "Records appended");
        Ok(records.len())
    }

    /// Number of persisted records
    pub fn record_count(&self) -> Result<usize> {
        let path = self.records_path();
        if !path.is_file() {
            return Ok(0);
        }
        let file = File::open(&path).map_err(|e| store_error(&self.dir, &e.to_string()))?;
        let mut count = 0;
        for line in BufReader::new(file).lines() {
            line.map_err(|e| store_error(&self.dir, &e.to_string()))?;
            count += 1;
        }
        Ok(count)
    }

    pub fn model(&self) -> &str {
        &self.meta.model
    }

    pub fn dimension(&self) -> usize {
        self.meta.dimension
    }

    fn records_path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE)
    }
}

fn store_error(dir: &Path, message: &str) -> IngestError {
    IngestError::Store {
        path: dir.display().to_string(),
        message: message.to_string(),
    }
}
