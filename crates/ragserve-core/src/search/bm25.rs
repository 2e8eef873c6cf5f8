//! BM25 full-text search via FTS5

use super::RetrievedPassage;
use crate::db::Database;
use crate::error::{RagError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::params;

lazy_static! {
    static ref TERM_RE: Regex = Regex::new(r"[\p{L}\p{N}_]+").unwrap();
}

/// Common English stop words to remove from natural language queries
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from",
    "has", "have", "he", "in", "is", "it", "its", "of", "on", "that",
    "the", "to", "was", "will", "with", "does", "do", "did", "can",
    "could", "should", "would", "what", "where", "when", "why", "how",
    "who", "which", "this", "these", "those", "there", "here",
];

/// Build an FTS5 MATCH expression from a natural language question.
///
/// Terms are quoted (no FTS5 operator can leak through) and OR-joined so a
/// passage matching any term is a candidate; BM25 ranks passages matching
/// more terms higher. Returns an empty string when nothing searchable remains.
pub fn build_fts_query(query: &str) -> String {
    let lowered = query.to_lowercase();
    let mut terms: Vec<&str> = Vec::new();
    for m in TERM_RE.find_iter(&lowered) {
        let term = m.as_str();
        if !STOP_WORDS.contains(&term) && !terms.contains(&term) {
            terms.push(term);
        }
    }

    terms
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Map a raw (negative) bm25 value into [0, 1)
fn normalize_bm25(raw: f64) -> f64 {
    let s = (-raw).max(0.0);
    s / (1.0 + s)
}

impl Database {
    /// Perform BM25 full-text search within one collection
    pub fn search_keywords(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        if !self.collection_exists(collection)? {
            return Err(RagError::UnknownCollection(collection.to_string()));
        }

        let fts_query = build_fts_query(query);
        if fts_query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            "SELECT p.source, p.title, p.body, bm25(passages_fts) AS raw
             FROM passages_fts
             JOIN passages p ON p.id = passages_fts.rowid
             WHERE passages_fts MATCH ?1 AND p.collection = ?2
             ORDER BY raw, p.id
             LIMIT ?3",
        )?;

        let results = stmt
            .query_map(params![fts_query, collection, limit as i64], |row| {
                let raw: f64 = row.get(3)?;
                Ok(RetrievedPassage {
                    source: row.get(0)?,
                    title: row.get(1)?,
                    text: row.get(2)?,
                    score: normalize_bm25(raw),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(results)
    }
}
