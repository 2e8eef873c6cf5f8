//! JSON output formatter

use ragserve_core::QueryResult;
use serde::Serialize;

pub fn format_answer(result: &QueryResult) -> String {
    to_pretty(result)
}

pub fn to_pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()) + "\n"
}
