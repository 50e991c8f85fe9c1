//! Publisher registry (C11): loads, validates, and indexes publisher
//! configuration by canonical domain. Grounded on the teacher's
//! domain-indexed-map idiom and its JSON-config loading pattern, generalized
//! from NNTP server lists to news-source lists.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum PublisherConfigError {
    #[error("failed to read publisher config {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("failed to parse publisher config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("publisher config invalid: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    OfficialFeed,
    FeedProxy,
    AggregatorFeed,
    Scraper,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub url: String,
    pub priority: u32,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    pub domain: String,
    pub priority: Option<u32>,
    pub sources: Vec<Source>,
}

impl PublisherConfig {
    /// Restricted to just the official feed, falling back to an aggregator
    /// feed if no official feed is configured — used by the cross-publisher
    /// aggregator (C12), which trades depth for breadth across many
    /// publishers.
    pub fn fast_path_sources(&self) -> Vec<&Source> {
        let official: Vec<&Source> = self
            .sources
            .iter()
            .filter(|s| s.source_type == SourceType::OfficialFeed)
            .collect();
        if !official.is_empty() {
            return official;
        }
        self.sources
            .iter()
            .filter(|s| s.source_type == SourceType::AggregatorFeed)
            .collect()
    }

    /// Sources grouped by in-publisher priority rank, ascending, each group
    /// a parallel tier.
    pub fn tiers(&self) -> Vec<(u32, Vec<&Source>)> {
        let mut by_priority: HashMap<u32, Vec<&Source>> = HashMap::new();
        for source in &self.sources {
            by_priority.entry(source.priority).or_default().push(source);
        }
        let mut tiers: Vec<(u32, Vec<&Source>)> = by_priority.into_iter().collect();
        tiers.sort_by_key(|(priority, _)| *priority);
        tiers
    }
}

pub struct PublisherRegistry {
    by_domain: HashMap<String, PublisherConfig>,
}

impl PublisherRegistry {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PublisherConfigError> {
        let path_ref = path.as_ref();
        let raw = std::fs::read_to_string(path_ref).map_err(|source| PublisherConfigError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;
        let entries: Vec<PublisherConfig> = serde_json::from_str(&raw)?;
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<PublisherConfig>) -> Result<Self, PublisherConfigError> {
        if entries.is_empty() {
            return Err(PublisherConfigError::Validation("publisher config must not be empty".to_string()));
        }

        let mut by_domain = HashMap::new();
        for entry in entries {
            if entry.domain.trim().is_empty() {
                return Err(PublisherConfigError::Validation("publisher entry missing domain".to_string()));
            }
            if entry.sources.is_empty() {
                return Err(PublisherConfigError::Validation(format!(
                    "publisher {} has no sources",
                    entry.domain
                )));
            }

            let canonical = entry.domain.to_lowercase();
            let alias = alias_domain(&canonical);

            by_domain.insert(canonical.clone(), entry.clone());
            if let Some(alias) = alias {
                by_domain.entry(alias).or_insert(entry);
            }
        }

        Ok(Self { by_domain })
    }

    /// Looks up a publisher by exact domain, then with/without a `www.`
    /// prefix, then falls back to treating `domain` as a prefix of a
    /// configured domain (so `openai` resolves to a configured `openai.com`).
    pub fn lookup(&self, domain: &str) -> Option<&PublisherConfig> {
        let lower = domain.to_lowercase();
        if let Some(found) = self.by_domain.get(&lower) {
            return Some(found);
        }
        if let Some(alias) = alias_domain(&lower) {
            if let Some(found) = self.by_domain.get(&alias) {
                return Some(found);
            }
        }
        self.by_domain
            .iter()
            .find(|(key, _)| key.starts_with(&lower))
            .map(|(_, v)| v)
    }

    /// Publishers with an integer priority, ascending, for the
    /// cross-publisher aggregator — at most 12 are ever selected by the
    /// caller (the aggregator applies that cap itself).
    pub fn ranked_publishers(&self) -> Vec<&PublisherConfig> {
        let mut seen = std::collections::HashSet::new();
        let mut ranked: Vec<&PublisherConfig> = self
            .by_domain
            .values()
            .filter(|p| p.priority.is_some())
            .filter(|p| seen.insert(p.domain.clone()))
            .collect();
        ranked.sort_by_key(|p| p.priority.unwrap_or(u32::MAX));
        ranked
    }
}

fn alias_domain(domain: &str) -> Option<String> {
    if let Some(stripped) = domain.strip_prefix("www.") {
        Some(stripped.to_string())
    } else {
        Some(format!("www.{domain}"))
    }
}
