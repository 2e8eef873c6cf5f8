//! Title extraction for plain-text documents

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref HEADING_RE: Regex = Regex::new(r"^#{1,2}\s+(.+)$").unwrap();
}

/// First level-one or level-two markdown heading, else the file stem
pub fn extract_title(content: &str, path: &Path) -> String {
    content
        .lines()
        .take(50)
        .find_map(|line| {
            HEADING_RE
                .captures(line.trim_end())
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|title| !title.is_empty())
        })
        .unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.replace(['-', '_'], " "))
                .unwrap_or_default()
        })
}
