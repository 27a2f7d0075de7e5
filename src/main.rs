//! Vectorshelf ingestion binary
//!
//! Runs one ingestion pass over the configured document list:
//! 1. Extracts page text from each PDF
//! 2. Splits pages into bounded chunks
//! 3. Embeds every chunk
//! 4. Appends the records to the persist directory

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vectorshelf::{create_embedder, AppConfig, IngestionPipeline, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting vectorshelf v{}", VERSION);

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    if config.documents.is_empty() {
        info!("No documents configured, nothing to ingest");
        return Ok(());
    }

    let embedder = create_embedder(&config.embedding)?;
    info!(
        model = embedder.model_name(),
        dimension = embedder.dimension(),
        provider = %config.embedding.provider,
        "Embedder initialized"
    );

    let pipeline = IngestionPipeline::new(config, embedder)?;
    let report = pipeline.run().await?;

    info!(
        documents = report.documents,
        pages = report.pages,
        chunks = report.chunks,
        records_written = report.records_written,
        "Ingestion finished"
    );

    Ok(())
}
