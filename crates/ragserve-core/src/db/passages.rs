//! Passage storage

use super::vectors::embedding_to_bytes;
use super::{hash_content, Database};
use crate::error::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

/// Passage to be written
#[derive(Debug, Clone)]
pub struct NewPassage {
    /// Unique reference within the collection (e.g. `url#2`)
    pub source: String,
    pub title: String,
    pub body: String,
}

/// What to do when a passage with the same source already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritePolicy {
    /// Replace the stored passage
    #[default]
    Overwrite,
    /// Keep the stored passage
    Skip,
}

/// Write outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteStats {
    pub inserted: usize,
    pub replaced: usize,
    pub skipped: usize,
}

impl Database {
    /// Write passages with their embeddings in one transaction
    pub fn write_passages(
        &self,
        collection: &str,
        passages: &[(NewPassage, Vec<f32>)],
        policy: WritePolicy,
    ) -> Result<WriteStats> {
        let now = Utc::now().to_rfc3339();
        let mut stats = WriteStats::default();
        let tx = self.conn.unchecked_transaction()?;

        for (passage, embedding) in passages {
            let hash = hash_content(&passage.body);
            let existing: Option<(i64, String)> = tx
                .query_row(
                    "SELECT id, hash FROM passages WHERE collection = ?1 AND source = ?2",
                    params![collection, passage.source],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let passage_id = match (existing, policy) {
                (Some(_), WritePolicy::Skip) => {
                    stats.skipped += 1;
                    continue;
                }
                (Some((id, _)), WritePolicy::Overwrite) => {
                    tx.execute(
                        "UPDATE passages SET title = ?2, body = ?3, hash = ?4, created_at = ?5
                         WHERE id = ?1",
                        params![id, passage.title, passage.body, hash, now],
                    )?;
                    stats.replaced += 1;
                    id
                }
                (None, _) => {
                    tx.execute(
                        "INSERT INTO passages (collection, source, title, body, hash, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![collection, passage.source, passage.title, passage.body, hash, now],
                    )?;
                    stats.inserted += 1;
                    tx.last_insert_rowid()
                }
            };

            tx.execute(
                "INSERT OR REPLACE INTO passage_vectors (passage_id, embedding) VALUES (?1, ?2)",
                params![passage_id, embedding_to_bytes(embedding)],
            )?;
        }

        tx.commit()?;
        Ok(stats)
    }

    /// Insert or replace a single passage
    pub fn upsert_passage(
        &self,
        collection: &str,
        passage: NewPassage,
        embedding: Vec<f32>,
    ) -> Result<WriteStats> {
        self.write_passages(collection, &[(passage, embedding)], WritePolicy::Overwrite)
    }

    /// Count passages in a collection
    pub fn passage_count(&self, collection: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM passages WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
