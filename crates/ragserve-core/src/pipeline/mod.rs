//! Pipelines and their manager
//!
//! A [`Pipeline`] binds one retrieval strategy to a collection and a provider
//! set. The [`PipelineManager`] caches pipelines by [`PipelineKey`] and runs
//! the retrieve-then-generate flow for each query.

mod instance;
mod key;
mod manager;
mod prompt;
mod query;

pub use instance::Pipeline;
pub use key::{CollectionId, PipelineKey};
pub use manager::{CacheStats, PipelineManager};
pub use prompt::{PromptTemplate, NO_DOCUMENTS};
pub use query::{Confidence, Query, QueryResult, DEFAULT_TOP_K};
