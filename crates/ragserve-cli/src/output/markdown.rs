//! Markdown output formatter

use ragserve_core::{CollectionInfo, QueryResult};

pub fn format_answer(result: &QueryResult) -> String {
    let mut output = String::new();
    output.push_str("## Answer\n\n");
    output.push_str(result.answer.trim());
    output.push_str("\n\n");

    if result.is_low_confidence() {
        output.push_str("_Low confidence: no supporting passages were found._\n");
        return output;
    }

    output.push_str("## Sources\n\n");
    for (i, passage) in result.passages.iter().enumerate() {
        let title = if passage.title.is_empty() {
            passage.source.as_str()
        } else {
            passage.title.as_str()
        };
        output.push_str(&format!(
            "{}. **{}** `{}` (score {:.3})\n",
            i + 1,
            title,
            passage.source,
            passage.score
        ));
        output.push_str(&format!("   > {}\n", passage.text.replace('\n', " ")));
    }

    output
}

pub fn format_collections(collections: &[CollectionInfo]) -> String {
    let mut output = String::from("| Collection | Passages | Model | Dims |\n|---|---|---|---|\n");
    for c in collections {
        output.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            c.name, c.passage_count, c.embedding_model, c.dimensions
        ));
    }
    output
}
