//! Ingestion pipeline
//!
//! Loads source documents, cleans and chunks them, embeds the chunks in
//! batches and writes passages into a collection.

mod chunker;
mod loader;
mod parser;

pub use chunker::{chunk_words, clean_text, Chunk, CHUNK_OVERLAP_WORDS, CHUNK_WORDS};
pub use loader::{load_documents, Document, SourceFormat};
pub use parser::extract_title;

use crate::db::{Database, NewPassage, WritePolicy};
use crate::error::{RagError, Result};
use crate::llm::Embedder;
use serde::Serialize;

const BATCH_SIZE: usize = 32;

/// Ingestion settings
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub chunk_words: usize,
    pub overlap_words: usize,
    pub policy: WritePolicy,
    pub batch_size: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            chunk_words: CHUNK_WORDS,
            overlap_words: CHUNK_OVERLAP_WORDS,
            policy: WritePolicy::default(),
            batch_size: BATCH_SIZE,
        }
    }
}

/// Ingestion outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub collection: String,
    pub created: bool,
    pub documents: usize,
    pub chunks: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub skipped: usize,
}

/// Chunk, embed and store documents in `collection`.
///
/// The collection is created on first use and bound to the embedder's model
/// and dimensions; later ingests must use a matching embedder.
pub async fn ingest(
    db: &Database,
    collection: &str,
    documents: &[Document],
    embedder: &dyn Embedder,
    options: &IngestOptions,
) -> Result<IngestReport> {
    let collection = collection.trim();
    if collection.is_empty() {
        return Err(RagError::InvalidInput(
            "collection name must not be empty".into(),
        ));
    }

    let created =
        db.create_collection(collection, embedder.model_name(), embedder.dimensions())?;
    let mut report = IngestReport {
        collection: collection.to_string(),
        created,
        documents: documents.len(),
        ..Default::default()
    };

    let mut passages = Vec::new();
    for document in documents {
        let cleaned = clean_text(&document.content);
        for chunk in chunk_words(&cleaned, options.chunk_words, options.overlap_words)? {
            passages.push(NewPassage {
                source: format!("{}#{}", document.source, chunk.seq),
                title: document.title.clone(),
                body: chunk.text,
            });
        }
    }
    report.chunks = passages.len();

    for batch in passages.chunks(options.batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|p| p.body.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        if embeddings.len() != batch.len() {
            return Err(RagError::Provider(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                batch.len()
            )));
        }

        let rows: Vec<(NewPassage, Vec<f32>)> =
            batch.iter().cloned().zip(embeddings).collect();
        let stats = db.write_passages(collection, &rows, options.policy)?;
        report.inserted += stats.inserted;
        report.replaced += stats.replaced;
        report.skipped += stats.skipped;

        tracing::debug!(
            collection,
            written = report.inserted + report.replaced + report.skipped,
            total = report.chunks,
            "ingest progress"
        );
    }

    db.touch_collection(collection)?;
    tracing::info!(
        collection,
        documents = report.documents,
        chunks = report.chunks,
        inserted = report.inserted,
        replaced = report.replaced,
        skipped = report.skipped,
        "ingest finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LocalEmbedder;

    fn documents() -> Vec<Document> {
        vec![
            Document {
                source: "guide/ownership.md".into(),
                title: "Ownership".into(),
                content: "Each value has exactly one owner. ".repeat(30),
            },
            Document {
                source: "guide/async.md".into(),
                title: "Async".into(),
                content: "Futures do nothing unless polled.".into(),
            },
        ]
    }

    fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    #[tokio::test]
    async fn test_ingest_creates_collection_and_passages() {
        let db = db();
        let embedder = LocalEmbedder::new("hash-64", 64).unwrap();
        let options = IngestOptions {
            chunk_words: 50,
            overlap_words: 10,
            ..Default::default()
        };

        let report = ingest(&db, "guide", &documents(), &embedder, &options)
            .await
            .unwrap();
        assert!(report.created);
        assert_eq!(report.documents, 2);
        // 180 words -> windows at 0, 40, 80, 120, 160 plus the short document
        assert_eq!(report.chunks, 6);
        assert_eq!(report.inserted, 6);
        assert_eq!(db.passage_count("guide").unwrap(), 6);

        let info = db.get_collection("guide").unwrap().unwrap();
        assert_eq!(info.dimensions, 64);
        assert_eq!(info.embedding_model, "hash-64");
    }

    #[tokio::test]
    async fn test_reingest_respects_policy() {
        let db = db();
        let embedder = LocalEmbedder::new("hash-64", 64).unwrap();
        ingest(&db, "guide", &documents(), &embedder, &IngestOptions::default())
            .await
            .unwrap();

        let skip = IngestOptions {
            policy: WritePolicy::Skip,
            ..Default::default()
        };
        let report = ingest(&db, "guide", &documents(), &embedder, &skip)
            .await
            .unwrap();
        assert!(!report.created);
        assert_eq!(report.inserted, 0);
        assert_eq!(report.skipped, report.chunks);

        let report = ingest(&db, "guide", &documents(), &embedder, &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(report.replaced, report.chunks);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let db = db();
        let small = LocalEmbedder::new("hash-64", 64).unwrap();
        ingest(&db, "guide", &documents(), &small, &IngestOptions::default())
            .await
            .unwrap();

        let large = LocalEmbedder::new("hash-128", 128).unwrap();
        let err = ingest(&db, "guide", &documents(), &large, &IngestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::InvalidInput(_)));
    }
}
