//! Output formatters

pub mod json;
pub mod markdown;
pub mod terminal;

use crate::app::OutputFormat;
use ragserve_core::{CollectionInfo, IngestReport, QueryResult};

/// Format an answer with its supporting passages
pub fn format_answer(result: &QueryResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_answer(result),
        OutputFormat::Md => markdown::format_answer(result),
        OutputFormat::Cli => terminal::format_answer(result),
    }
}

pub fn format_collections(collections: &[CollectionInfo], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(collections),
        OutputFormat::Md => markdown::format_collections(collections),
        OutputFormat::Cli => terminal::format_collections(collections),
    }
}

pub fn format_ingest_report(report: &IngestReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(report),
        OutputFormat::Md | OutputFormat::Cli => terminal::format_ingest_report(report),
    }
}
