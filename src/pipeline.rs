//! Ingestion pipeline
//!
//! Orchestrates the run: load every configured document, split all page
//! text into chunks, embed every chunk, then persist the records in one
//! bulk append. Phases are strictly sequential and any failure aborts the
//! whole run; records already appended stay in the store (no rollback).

use crate::config::AppConfig;
use crate::embeddings::Embedder;
use crate::errors::{IngestError, Result};
use crate::pdf::{extract_pages, PageText};
use crate::splitter::RecursiveSplitter;
use crate::store::{EmbeddingRecord, VectorStore};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// A chunk of document text with its source provenance
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    /// Originating document identifier
    pub document: String,
    /// Zero-based page index the text came from
    pub page: u32,
    /// Chunk position within the document
    pub chunk_index: usize,
    /// Chunk text content, never empty
    pub text: String,
}

/// Summary of a completed ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub pages: usize,
    pub chunks: usize,
    pub records_written: usize,
}

/// Document ingestion pipeline
pub struct IngestionPipeline {
    config: AppConfig,
    splitter: RecursiveSplitter,
    embedder: Arc<dyn Embedder>,
    store: VectorStore,
}

impl IngestionPipeline {
    /// Build the pipeline: compiles the splitter and opens the store,
    /// pinning it to the embedder's model and dimension.
    pub fn new(config: AppConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let splitter = RecursiveSplitter::new(config.splitter.to_splitter_config())?;
        let store = VectorStore::open(
            &config.persist_dir,
            embedder.model_name(),
            embedder.dimension(),
        )?;

        Ok(Self {
            config,
            splitter,
            embedder,
            store,
        })
    }

    /// Run the full ingestion: load, split, embed, persist.
    #[instrument(skip(self), fields(documents = self.config.documents.len()))]
    pub async fn run(&self) -> Result<IngestReport> {
        info!("Starting ingestion run");

        // Load
        let mut loaded: Vec<(String, Vec<PageText>)> =
            Vec::with_capacity(self.config.documents.len());
        for id in &self.config.documents {
            let path = self.resolve_document(id);
            info!(document = %id, path = %path.display(), "Loading document");
            let pages = extract_pages(&path)?;
            loaded.push((id.clone(), pages));
        }
        let page_count: usize = loaded.iter().map(|(_, pages)| pages.len()).sum();

        // Split
        let mut chunks = Vec::new();
        for (id, pages) in &loaded {
            let mut chunk_index = 0;
            for page in pages {
                if page.text.is_empty() {
                    debug!(document = %id, page = page.index, "Skipping empty page");
                    continue;
                }
                for text in self.splitter.split(&page.text) {
                    chunks.push(DocumentChunk {
                        document: id.clone(),
                        page: page.index,
                        chunk_index,
                        text,
                    });
                    chunk_index += 1;
                }
            }
            if chunk_index == 0 {
                warn!(document = %id, "Document produced no chunks");
            }
        }

        info!(
            documents = loaded.len(),
            pages = page_count,
            chunks = chunks.len(),
            "Documents loaded and split"
        );

        if chunks.is_empty() {
            return Ok(IngestReport {
                documents: loaded.len(),
                pages: page_count,
                chunks: 0,
                records_written: 0,
            });
        }

        // Embed
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(IngestError::Embedding(format!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        info!(
            count = embeddings.len(),
            model = self.embedder.model_name(),
            "Embeddings generated"
        );

        // Persist
        let now = Utc::now();
        let records: Vec<EmbeddingRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddingRecord {
                id: Uuid::new_v4(),
                document: chunk.document.clone(),
                page: chunk.page,
                chunk_index: chunk.chunk_index,
                text: chunk.text.clone(),
                embedding,
                model: self.embedder.model_name().to_string(),
                created_at: now,
            })
            .collect();

        let records_written = self.store.append(&records)?;

        info!(
            records_written,
            store = %self.config.persist_dir.display(),
            "Ingestion run complete"
        );

        Ok(IngestReport {
            documents: loaded.len(),
            pages: page_count,
            chunks: chunks.len(),
            records_written,
        })
    }

    /// Total records currently in the store
    pub fn stored_records(&self) -> Result<usize> {
        self.store.record_count()
    }

    fn resolve_document(&self, id: &str) -> PathBuf {
        let path = PathBuf::from(id);
        if path.is_absolute() {
            path
        } else {
            self.config.base_dir.join(path)
        }
    }
}
