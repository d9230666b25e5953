pub mod catalog;

use crate::types::{PipelineError, Result, Source};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;
use url::Url;

/// Ordered, read-only list of sources for one run.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Source>) -> Result<Self> {
        let mut seen = HashSet::new();

        for source in &sources {
            let parsed = Url::parse(&source.url)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(PipelineError::Config(format!(
                    "source {} must use http or https: {}",
                    source.name, source.url
                )));
            }
            if !(1..=10).contains(&source.reliability) {
                return Err(PipelineError::Config(format!(
                    "source {} has reliability {} outside 1-10",
                    source.name, source.reliability
                )));
            }
            if !seen.insert(source.url.as_str()) {
                return Err(PipelineError::Config(format!(
                    "duplicate source address: {}",
                    source.url
                )));
            }
        }

        Ok(Self { sources })
    }

    /// Loads a JSON array of `{url, name, reliability, origin}` records.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let sources: Vec<Source> = serde_json::from_str(&raw)?;
        info!("Loaded {} sources from {}", sources.len(), path.display());
        Self::new(sources)
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self {
            sources: catalog::default_sources(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_valid() {
        let registry = SourceRegistry::default();
        assert_eq!(registry.len(), 15);
        assert!(SourceRegistry::new(registry.sources().to_vec()).is_ok());
        assert_eq!(registry.sources()[0].name, "Global Voices Tech");
    }

    #[test]
    fn rejects_duplicate_addresses() {
        let source = Source::new("https://example.com/feed", "Example", 5, "US");
        let err = SourceRegistry::new(vec![source.clone(), source]).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn rejects_out_of_range_reliability() {
        let source = Source::new("https://example.com/feed", "Example", 11, "US");
        assert!(SourceRegistry::new(vec![source]).is_err());
    }

    #[test]
    fn rejects_non_http_addresses() {
        let source = Source::new("ftp://example.com/feed", "Example", 5, "US");
        assert!(SourceRegistry::new(vec![source]).is_err());
    }

    #[test]
    fn loads_registry_from_json() {
        let path = std::env::temp_dir().join(format!("sources-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"[{"url": "https://example.com/rss", "name": "Example", "reliability": 7, "origin": "Kenya"}]"#,
        )
        .unwrap();

        let registry = SourceRegistry::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.sources()[0].origin, "Kenya");
    }
}
