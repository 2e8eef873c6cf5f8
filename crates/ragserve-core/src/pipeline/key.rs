//! Cache identity for pipelines

use crate::config::ProviderFingerprint;
use crate::error::{RagError, Result};
use crate::retrieval::StrategyId;
use serde::Serialize;
use std::fmt;

/// Validated collection name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RagError::InvalidInput(
                "collection name must not be empty".to_string(),
            ));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CollectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Every dimension that changes what a pipeline returns.
///
/// Equality and hashing cover all fields, so two keys that differ in any
/// component never share a cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub collection: CollectionId,
    pub strategy: StrategyId,
    pub providers: ProviderFingerprint,
    /// Caller-supplied content version; bumping it forces a rebuild
    pub collection_version: Option<String>,
}

impl PipelineKey {
    pub fn new(
        collection: CollectionId,
        strategy: StrategyId,
        providers: ProviderFingerprint,
        collection_version: Option<String>,
    ) -> Self {
        Self {
            collection,
            strategy,
            providers,
            collection_version,
        }
    }
}

impl fmt::Display for PipelineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.collection, self.strategy, self.providers)?;
        if let Some(ref version) = self.collection_version {
            write!(f, "#{}", version)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use std::collections::HashSet;

    fn key(collection: &str, strategy: StrategyId, version: Option<&str>) -> PipelineKey {
        PipelineKey::new(
            CollectionId::parse(collection).unwrap(),
            strategy,
            ProviderConfig::default().fingerprint(),
            version.map(str::to_string),
        )
    }

    #[test]
    fn test_collection_id_trims_and_rejects_empty() {
        assert_eq!(CollectionId::parse("  docs ").unwrap().as_str(), "docs");
        assert!(CollectionId::parse("   ").is_err());
    }

    #[test]
    fn test_keys_differ_per_component() {
        let mut keys = HashSet::new();
        keys.insert(key("docs", StrategyId::Naive, None));
        keys.insert(key("docs", StrategyId::Hybrid, None));
        keys.insert(key("faq", StrategyId::Naive, None));
        keys.insert(key("docs", StrategyId::Naive, Some("v2")));
        assert_eq!(keys.len(), 4);

        assert!(keys.contains(&key("docs", StrategyId::Hybrid, None)));
    }

    #[test]
    fn test_provider_change_changes_key() {
        let mut providers = ProviderConfig::default();
        let a = providers.fingerprint();
        providers.generation.model = "another-model".into();
        assert_ne!(a, providers.fingerprint());
    }

    #[test]
    fn test_display() {
        let k = key("docs", StrategyId::Hybrid, Some("3"));
        let shown = k.to_string();
        assert!(shown.starts_with("docs/hybrid@"));
        assert!(shown.ends_with("#3"));
    }
}
