//! Database layer for ragserve
//!
//! Provides SQLite-based storage with:
//! - FTS5 full-text search
//! - Dense vector storage
//! - Per-collection passages

mod collections;
mod content;
mod passages;
mod schema;
pub mod vectors;

pub use collections::CollectionInfo;
pub use content::hash_content;
pub use passages::{NewPassage, WritePolicy, WriteStats};
pub use schema::Database;
pub use vectors::cosine_similarity;
use std::path::PathBuf;

impl Database {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CACHE_DIR_NAME)
            .join("index.sqlite")
    }
}
