//! Document cleaning and word-window chunking

use crate::error::{RagError, Result};
use lazy_static::lazy_static;
use regex::Regex;

/// Words per chunk
pub const CHUNK_WORDS: usize = 200;
/// Words shared by consecutive chunks
pub const CHUNK_OVERLAP_WORDS: usize = 20;

lazy_static! {
    static ref INLINE_SPACE_RE: Regex = Regex::new(r"[ \t\x{a0}]+").unwrap();
    static ref BLANK_LINES_RE: Regex = Regex::new(r"\n\s*\n+").unwrap();
}

/// Document chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Index of the chunk within its document
    pub seq: usize,
    /// Index of the first word within the document
    pub first_word: usize,
}

/// Collapse runs of spaces, trim lines and drop repeated blank lines
pub fn clean_text(content: &str) -> String {
    let content = content.replace("\r\n", "\n");
    let lines: Vec<String> = content
        .lines()
        .map(|line| INLINE_SPACE_RE.replace_all(line.trim(), " ").into_owned())
        .collect();
    BLANK_LINES_RE
        .replace_all(lines.join("\n").trim(), "\n\n")
        .into_owned()
}

/// Split text into windows of `size` words, each sharing `overlap` words
/// with the previous one.
pub fn chunk_words(content: &str, size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    if size == 0 {
        return Err(RagError::InvalidInput("chunk size must be > 0".into()));
    }
    if overlap >= size {
        return Err(RagError::InvalidInput(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, size
        )));
    }

    let words: Vec<&str> = content.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let step = size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + size).min(words.len());
        chunks.push(Chunk {
            text: words[start..end].join(" "),
            seq: chunks.len(),
            first_word: start,
        });
        if end == words.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_chunk_small_content() {
        let chunks = chunk_words("Small content.", 200, 20).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Small content.");
    }

    #[test]
    fn test_chunk_windows_overlap() {
        let chunks = chunk_words(&words(25), 10, 2).unwrap();
        let starts: Vec<usize> = chunks.iter().map(|c| c.first_word).collect();
        assert_eq!(starts, vec![0, 8, 16]);
        assert!(chunks[1].text.starts_with("w8 w9"));
        assert!(chunks[2].text.ends_with("w24"));
        assert_eq!(chunks[2].seq, 2);
    }

    #[test]
    fn test_exact_fit_has_no_tail_chunk() {
        let chunks = chunk_words(&words(10), 10, 2).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_invalid_overlap() {
        assert!(chunk_words("a b c", 5, 5).is_err());
        assert!(chunk_words("a b c", 0, 0).is_err());
    }

    #[test]
    fn test_empty_content() {
        assert!(chunk_words("  \n ", 10, 2).unwrap().is_empty());
    }

    #[test]
    fn test_clean_text() {
        let cleaned = clean_text("  Title \r\n\r\n\r\n  body   text\t here  \n\n\n\nend ");
        assert_eq!(cleaned, "Title\n\nbody text here\n\nend");
    }
}
