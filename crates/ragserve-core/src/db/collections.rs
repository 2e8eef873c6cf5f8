//! Collection operations

use super::Database;
use crate::error::{RagError, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

/// Collection info
#[derive(Debug, Clone, serde::Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub embedding_model: String,
    pub dimensions: usize,
    pub passage_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

impl Database {
    /// Create a collection; returns false if it already exists.
    ///
    /// An existing collection built with a different embedding model or
    /// dimension is rejected, since its vectors would not be comparable.
    pub fn create_collection(
        &self,
        name: &str,
        embedding_model: &str,
        dimensions: usize,
    ) -> Result<bool> {
        if let Some(existing) = self.get_collection(name)? {
            if existing.embedding_model != embedding_model || existing.dimensions != dimensions {
                return Err(RagError::InvalidInput(format!(
                    "collection '{}' was indexed with {} ({} dims), not {} ({} dims)",
                    name, existing.embedding_model, existing.dimensions, embedding_model, dimensions
                )));
            }
            return Ok(false);
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO collections (name, embedding_model, dimensions, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![name, embedding_model, dimensions as i64, now],
        )?;
        Ok(true)
    }

    /// Look up a single collection
    pub fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>> {
        let info = self
            .conn
            .query_row(
                "SELECT c.name, c.embedding_model, c.dimensions,
                        (SELECT COUNT(*) FROM passages p WHERE p.collection = c.name),
                        c.created_at, c.updated_at
                 FROM collections c WHERE c.name = ?1",
                params![name],
                row_to_info,
            )
            .optional()?;
        Ok(info)
    }

    /// Check whether a collection exists
    pub fn collection_exists(&self, name: &str) -> Result<bool> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM collections WHERE name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }

    /// List all collections with passage counts
    pub fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.name, c.embedding_model, c.dimensions,
                    (SELECT COUNT(*) FROM passages p WHERE p.collection = c.name),
                    c.created_at, c.updated_at
             FROM collections c ORDER BY c.name",
        )?;
        let rows = stmt.query_map([], row_to_info)?;
        let mut collections = Vec::new();
        for row in rows {
            collections.push(row?);
        }
        Ok(collections)
    }

    /// Remove a collection and all of its passages
    pub fn remove_collection(&self, name: &str) -> Result<bool> {
        self.conn
            .execute("DELETE FROM passages WHERE collection = ?1", params![name])?;
        let rows = self
            .conn
            .execute("DELETE FROM collections WHERE name = ?1", params![name])?;
        Ok(rows > 0)
    }

    /// Mark a collection as updated
    pub fn touch_collection(&self, name: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE collections SET updated_at = ?2 WHERE name = ?1",
            params![name, now],
        )?;
        Ok(())
    }
}

fn row_to_info(row: &rusqlite::Row<'_>) -> rusqlite::Result<CollectionInfo> {
    Ok(CollectionInfo {
        name: row.get(0)?,
        embedding_model: row.get(1)?,
        dimensions: row.get::<_, i64>(2)? as usize,
        passage_count: row.get::<_, i64>(3)? as usize,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    #[test]
    fn test_create_and_list() {
        let db = db();
        assert!(db.create_collection("docs_v1", "all-MiniLM-L6-v2", 384).unwrap());
        assert!(!db.create_collection("docs_v1", "all-MiniLM-L6-v2", 384).unwrap());
        assert!(db.create_collection("faq", "all-MiniLM-L6-v2", 384).unwrap());

        let names: Vec<String> = db
            .list_collections()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["docs_v1", "faq"]);
        assert!(db.collection_exists("faq").unwrap());
        assert!(!db.collection_exists("ghost_collection").unwrap());
    }

    #[test]
    fn test_model_mismatch_rejected() {
        let db = db();
        db.create_collection("docs", "all-MiniLM-L6-v2", 384).unwrap();
        let err = db
            .create_collection("docs", "text-embedding-3-small", 1536)
            .unwrap_err();
        assert!(matches!(err, RagError::InvalidInput(_)));
    }

    #[test]
    fn test_remove_collection() {
        let db = db();
        db.create_collection("docs", "m", 8).unwrap();
        assert!(db.remove_collection("docs").unwrap());
        assert!(!db.remove_collection("docs").unwrap());
        assert!(db.get_collection("docs").unwrap().is_none());
    }
}
