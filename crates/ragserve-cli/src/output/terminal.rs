//! Terminal output formatter

use ragserve_core::{CollectionInfo, IngestReport, QueryResult};

const PREVIEW_LINES: usize = 3;

pub fn format_answer(result: &QueryResult) -> String {
    let mut output = String::new();
    output.push_str(result.answer.trim());
    output.push('\n');

    if result.is_low_confidence() {
        output.push_str("\n(low confidence: no supporting passages were found)\n");
        return output;
    }

    output.push_str(&format!(
        "\nSources ({}, {}):\n",
        result.collection, result.strategy
    ));
    for (i, passage) in result.passages.iter().enumerate() {
        output.push_str(&format!(
            "[{}] {:.3} {}\n",
            i + 1,
            passage.score,
            passage.source
        ));
        let lines: Vec<&str> = passage.text.lines().take(PREVIEW_LINES).collect();
        for line in &lines {
            output.push_str(&format!("    {}\n", line));
        }
        if passage.text.lines().count() > PREVIEW_LINES {
            output.push_str("    ...\n");
        }
    }

    output
}

pub fn format_collections(collections: &[CollectionInfo]) -> String {
    if collections.is_empty() {
        return "No collections\n".to_string();
    }
    collections
        .iter()
        .map(|c| {
            format!(
                "{}: {} passages ({}, {} dims)\n",
                c.name, c.passage_count, c.embedding_model, c.dimensions
            )
        })
        .collect()
}

pub fn format_ingest_report(report: &IngestReport) -> String {
    let mut output = String::new();
    if report.created {
        output.push_str(&format!("Created collection '{}'\n", report.collection));
    }
    output.push_str(&format!(
        "Ingested {} documents into '{}': {} chunks ({} new, {} replaced, {} skipped)\n",
        report.documents,
        report.collection,
        report.chunks,
        report.inserted,
        report.replaced,
        report.skipped
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragserve_core::{Confidence, RetrievedPassage, StrategyId};

    fn result(passages: Vec<RetrievedPassage>, confidence: Confidence) -> QueryResult {
        QueryResult {
            answer: "Values have one owner [1].".into(),
            passages,
            confidence,
            strategy: StrategyId::Hybrid,
            collection: "docs".into(),
        }
    }

    #[test]
    fn test_answer_lists_sources() {
        let output = format_answer(&result(
            vec![RetrievedPassage {
                source: "ownership#0".into(),
                title: String::new(),
                text: "line one\nline two\nline three\nline four".into(),
                score: 0.5,
            }],
            Confidence::Grounded,
        ));
        assert!(output.starts_with("Values have one owner [1].\n"));
        assert!(output.contains("Sources (docs, hybrid):"));
        assert!(output.contains("[1] 0.500 ownership#0"));
        assert!(output.contains("    ..."));
    }

    #[test]
    fn test_low_confidence_note() {
        let output = format_answer(&result(vec![], Confidence::Low));
        assert!(output.contains("low confidence"));
        assert!(!output.contains("Sources"));
    }
}
