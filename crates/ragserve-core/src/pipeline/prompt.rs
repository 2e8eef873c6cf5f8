//! Prompt composition

use crate::error::{RagError, Result};
use crate::search::RetrievedPassage;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::path::Path;

const QUESTION_SLOT: &str = "{{question}}";
const DOCUMENTS_SLOT: &str = "{{documents}}";
const DEFAULT_TEMPLATE: &str = include_str!("../../prompts/grounded_answer.txt");

lazy_static! {
    static ref SLOT_RE: Regex = Regex::new(r"\{\{(question|documents)\}\}").unwrap();
}

/// Text shown in place of the documents when retrieval found nothing
pub const NO_DOCUMENTS: &str = "(no documents)";

/// Template with `{{question}}` and `{{documents}}` slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        for slot in [QUESTION_SLOT, DOCUMENTS_SLOT] {
            if !text.contains(slot) {
                return Err(RagError::Config(format!(
                    "prompt template is missing the {} placeholder",
                    slot
                )));
            }
        }
        Ok(Self { text })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::new(text)
    }

    /// Template file when given, built-in template otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Fill the template. Passages are numbered from 1 in retrieval order.
    ///
    /// Slots are filled in a single pass over the template, so slot-like
    /// text inside the question or a passage is left as written.
    pub fn render(&self, question: &str, passages: &[RetrievedPassage]) -> String {
        let documents = format_documents(passages);
        let question = question.trim();
        SLOT_RE
            .replace_all(&self.text, |caps: &Captures| match &caps[1] {
                "question" => question.to_string(),
                _ => documents.clone(),
            })
            .into_owned()
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

fn format_documents(passages: &[RetrievedPassage]) -> String {
    if passages.is_empty() {
        return NO_DOCUMENTS.to_string();
    }
    passages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[{}] ({})\n{}", i + 1, p.source, p.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
