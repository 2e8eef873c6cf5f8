//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use ragserve_core::{StrategyId, WritePolicy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ragserve")]
#[command(
    author,
    version,
    about = "Ask grounded questions against indexed document collections"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to RAGSERVE_CONFIG or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer a question from a collection
    Query(QueryArgs),

    /// Load documents into a collection
    Ingest(IngestArgs),

    /// Manage collections
    Collection(CollectionArgs),

    /// Show the effective configuration
    Config,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Question to answer
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Collection to search
    #[arg(short, long)]
    pub collection: String,

    /// Retrieval strategy (naive, hybrid)
    #[arg(short, long, default_value = "naive")]
    pub strategy: StrategyId,

    /// Number of passages to retrieve
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    /// Content version of the collection; a new value forces a fresh pipeline
    #[arg(long)]
    pub collection_version: Option<String>,
}

#[derive(Args)]
pub struct IngestArgs {
    /// Target collection
    pub collection: String,

    /// Scraper output directory, Q&A CSV file or directory of text files
    pub path: PathBuf,

    /// What to do with passages that already exist
    #[arg(long, value_enum, default_value = "overwrite")]
    pub policy: PolicyArg,

    /// Words per chunk
    #[arg(long, default_value = "200")]
    pub chunk_words: usize,

    /// Words shared by consecutive chunks
    #[arg(long, default_value = "20")]
    pub overlap: usize,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    Overwrite,
    Skip,
}

impl From<PolicyArg> for WritePolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Overwrite => WritePolicy::Overwrite,
            PolicyArg::Skip => WritePolicy::Skip,
        }
    }
}

#[derive(Args)]
pub struct CollectionArgs {
    #[command(subcommand)]
    pub action: CollectionAction,
}

#[derive(Subcommand)]
pub enum CollectionAction {
    /// List all collections
    List,
    /// Remove a collection and its passages
    #[command(alias = "rm")]
    Remove { name: String },
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Cli,
    Json,
    Md,
}
