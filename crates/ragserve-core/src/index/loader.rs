//! Source document loaders
//!
//! The input format is chosen from the shape of the path:
//! - a directory holding `dataset.jsonl` (scraper output) or a `.jsonl` file
//! - a `.csv` file of question/answer rows
//! - any other directory: every `.md` / `.txt` file below it

use super::parser::extract_title;
use crate::error::{RagError, Result};
use serde::Deserialize;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const SCRAPER_DATASET: &str = "dataset.jsonl";
const TEXT_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// A loaded document before chunking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Stable reference (URL, CSV source or relative path)
    pub source: String,
    pub title: String,
    pub content: String,
}

/// Recognized input layouts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    ScraperJsonl(PathBuf),
    QaCsv(PathBuf),
    TextDirectory(PathBuf),
}

impl SourceFormat {
    /// Pick the loader for a path
    pub fn detect(path: &Path) -> Result<Self> {
        if path.is_dir() {
            let dataset = path.join(SCRAPER_DATASET);
            if dataset.is_file() {
                return Ok(Self::ScraperJsonl(dataset));
            }
            return Ok(Self::TextDirectory(path.to_path_buf()));
        }
        if path.is_file() {
            match extension(path).as_deref() {
                Some("jsonl") => return Ok(Self::ScraperJsonl(path.to_path_buf())),
                Some("csv") => return Ok(Self::QaCsv(path.to_path_buf())),
                _ => {}
            }
        }
        Err(RagError::InvalidInput(format!(
            "Unsupported path or unknown file format: {}",
            path.display()
        )))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ScraperJsonl(_) => "scraper jsonl",
            Self::QaCsv(_) => "question/answer csv",
            Self::TextDirectory(_) => "text directory",
        }
    }
}

/// Detect the format of `path` and load its documents
pub fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let format = SourceFormat::detect(path)?;
    tracing::info!("Loading {} from {}", format.name(), path.display());
    match format {
        SourceFormat::ScraperJsonl(file) => load_scraper_jsonl(&file),
        SourceFormat::QaCsv(file) => load_qa_csv(&file),
        SourceFormat::TextDirectory(dir) => load_text_directory(&dir),
    }
}

#[derive(Deserialize)]
struct ScrapedPage {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

/// One JSON object per line with `url`, `title` and `content`
fn load_scraper_jsonl(path: &Path) -> Result<Vec<Document>> {
    let reader = std::io::BufReader::new(std::fs::File::open(path)?);
    let mut documents = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let page: ScrapedPage = match serde_json::from_str(&line) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Skipping line {} of {}: {}", line_no + 1, path.display(), e);
                continue;
            }
        };
        if page.content.trim().is_empty() {
            continue;
        }
        let source = if page.url.is_empty() {
            format!("line-{}", line_no + 1)
        } else {
            page.url
        };
        documents.push(Document {
            source,
            title: page.title,
            content: page.content,
        });
    }

    Ok(documents)
}

#[derive(Deserialize)]
struct QaRow {
    question: String,
    answer: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    source: String,
}

/// Rows with `question` and `answer` columns; rows without an answer are
/// skipped. The question becomes the title when no title column is set.
fn load_qa_csv(path: &Path) -> Result<Vec<Document>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    for required in ["question", "answer"] {
        if !headers.iter().any(|h| h == required) {
            return Err(RagError::InvalidInput(format!(
                "CSV must have 'question' and 'answer' columns: {}",
                path.display()
            )));
        }
    }

    let mut documents = Vec::new();
    for (row_no, row) in reader.deserialize::<QaRow>().enumerate() {
        let row = row?;
        if row.answer.trim().is_empty() {
            continue;
        }
        let source = [row.source, row.url]
            .into_iter()
            .find(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("row-{}", row_no + 1));
        let title = if row.title.trim().is_empty() {
            row.question
        } else {
            row.title
        };
        documents.push(Document {
            source,
            title,
            content: row.answer,
        });
    }

    Ok(documents)
}

fn load_text_directory(root: &Path) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_text = extension(entry.path())
            .map(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        if !is_text {
            continue;
        }

        let content = std::fs::read_to_string(entry.path())?;
        if content.trim().is_empty() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        documents.push(Document {
            title: extract_title(&content, entry.path()),
            source: relative,
            content,
        });
    }

    Ok(documents)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
