//! Document ingestion command

use crate::app::{IngestArgs, OutputFormat};
use crate::output;
use anyhow::{Context, Result};
use ragserve_core::{
    ingest, load_documents, Config, Database, DefaultProviderFactory, IngestOptions,
    ProviderFactory, RagError,
};

pub async fn run(
    args: IngestArgs,
    db: &Database,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let documents = load_documents(&args.path)
        .with_context(|| format!("loading {}", args.path.display()))?;
    if documents.is_empty() {
        return Err(RagError::InvalidInput(format!(
            "no documents found in {}",
            args.path.display()
        ))
        .into());
    }

    let embedder = DefaultProviderFactory.embedder(&config.providers.embedding)?;
    let options = IngestOptions {
        chunk_words: args.chunk_words,
        overlap_words: args.overlap,
        policy: args.policy.into(),
        ..IngestOptions::default()
    };

    let report = ingest(db, &args.collection, &documents, embedder.as_ref(), &options).await?;
    print!("{}", output::format_ingest_report(&report, format));
    Ok(())
}
