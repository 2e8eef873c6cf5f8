//! Question answering command

use crate::app::{OutputFormat, QueryArgs};
use crate::output;
use anyhow::Result;
use ragserve_core::{
    Config, Database, DefaultProviderFactory, PipelineManager, PromptTemplate, Query,
    SqliteBackend,
};
use std::sync::Arc;

pub async fn run(args: QueryArgs, db: Database, config: &Config, format: OutputFormat) -> Result<()> {
    let prompt = PromptTemplate::load(config.manager.prompt_template.as_deref())?;
    let manager = PipelineManager::new(
        Arc::new(SqliteBackend::new(db)),
        Arc::new(DefaultProviderFactory),
        config.manager.clone(),
        config.hybrid.clone(),
        prompt,
    );

    let mut query = Query::new(args.question.join(" "), args.collection)
        .with_strategy(args.strategy)
        .with_top_k(args.top_k);
    if let Some(version) = args.collection_version {
        query = query.with_collection_version(version);
    }

    let result = manager.answer(&query, &config.providers).await;
    manager.shutdown().await;

    print!("{}", output::format_answer(&result?, format));
    Ok(())
}
