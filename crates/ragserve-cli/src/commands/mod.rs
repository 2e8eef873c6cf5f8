//! CLI command handlers

pub mod collection;
pub mod config;
pub mod ingest;
pub mod query;
