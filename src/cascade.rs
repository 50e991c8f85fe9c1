//! Cascade engine (C10): the central fetch/fallback algorithm. Given a
//! publisher's sources grouped into priority tiers, fetches every source in
//! a tier concurrently, applies the filter/dedup stage per tier, and stops
//! early once enough articles have been kept.
//!
//! Grounded on the teacher's priority-ordered fallback loop in its federated
//! NNTP client (`get_article` tries sources in rank order until one
//! succeeds), generalized here to fan out *within* a tier instead of trying
//! sources one at a time, since tiers are meant to run in parallel.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::article::Article;
use crate::config::FetchConfig;
use crate::dates::DateParser;
use crate::feed::{self, FeedError};
use crate::filter::{DedupState, Filter, FilterParams};
use crate::http_client::FetchClient;
use crate::publisher::{PublisherConfig, Source, SourceType};
use crate::scrape::{deep, listing};

pub struct CascadeParams<'a> {
    pub topic: Option<&'a str>,
    pub location: Option<&'a str>,
    pub last_n_days: Option<u32>,
    pub count: usize,
    /// Fast-path mode collapses the source list to official-feed-only (with
    /// an aggregator-feed fallback); used by the cross-publisher aggregator.
    pub fast_mode: bool,
}

pub struct CascadeOutcome {
    pub articles: Vec<Article>,
    /// Human-readable provenance, e.g. "official_feed (techcrunch.com)".
    pub source_used: String,
    pub message: Option<String>,
}

pub struct CascadeEngine {
    fetch_client: Arc<FetchClient>,
    date_parser: Arc<DateParser>,
    filter: Arc<Filter>,
    fetch_config: FetchConfig,
    deep_scrape_enabled: bool,
    deep_scrape_max_articles: usize,
    deep_scrape_worker_count: usize,
    deep_scrape_per_article_timeout: Duration,
    deep_scrape_batch_deadline: Duration,
    deep_scrape_summary_chars: usize,
    deep_scrape_retries: u32,
    /// Cancelled on process shutdown so an in-flight cascade abandons its
    /// outstanding fetches instead of running to its own deadline.
    shutdown: CancellationToken,
}

impl CascadeEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fetch_client: Arc<FetchClient>,
        date_parser: Arc<DateParser>,
        filter: Arc<Filter>,
        fetch_config: FetchConfig,
        deep_scrape: &crate::config::DeepScrapeConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            fetch_client,
            date_parser,
            filter,
            deep_scrape_enabled: deep_scrape.enabled,
            deep_scrape_max_articles: deep_scrape.max_articles,
            deep_scrape_worker_count: deep_scrape.worker_count,
            deep_scrape_per_article_timeout: Duration::from_millis(deep_scrape.per_article_timeout_ms),
            deep_scrape_batch_deadline: Duration::from_millis(deep_scrape.batch_deadline_ms),
            deep_scrape_summary_chars: deep_scrape.summary_chars,
            deep_scrape_retries: fetch_config.deep_scrape_retries,
            fetch_config,
            shutdown,
        }
    }

    /// Runs the cascade for one publisher, threading `dedup` through so
    /// state accumulates across publishers in a cross-publisher aggregation.
    pub async fn run(
        &self,
        publisher: &PublisherConfig,
        params: &CascadeParams<'_>,
        dedup: &mut DedupState,
    ) -> CascadeOutcome {
        let tiers = if params.fast_mode {
            let fast_sources = publisher.fast_path_sources();
            if fast_sources.is_empty() {
                Vec::new()
            } else {
                vec![(fast_sources[0].priority, fast_sources)]
            }
        } else {
            publisher.tiers()
        };

        let mut kept: Vec<Article> = Vec::new();
        let mut provenance: Vec<String> = Vec::new();
        let tier_deadline = Duration::from_millis(self.fetch_config.tier_deadline_ms);
        let outer_deadline = Duration::from_millis(self.fetch_config.cascade_deadline_ms);

        let cascade_body = async {
            for (tier_rank, sources) in &tiers {
                let tier_result = tokio::time::timeout(tier_deadline, self.run_tier(sources)).await;
                let Ok(tier_articles) = tier_result else {
                    continue;
                };

                let filter_params = FilterParams {
                    topic: params.topic,
                    location: params.location,
                    last_n_days: params.last_n_days,
                };
                let survivors = self.filter.apply(tier_articles, &filter_params, dedup);
                if !survivors.is_empty() {
                    let types: Vec<&str> = sources.iter().map(|s| source_type_label(s.source_type)).collect();
                    provenance.push(format!("tier {tier_rank} ({}): {} article(s)", types.join("/"), survivors.len()));
                    kept.extend(survivors);
                }

                if kept.len() >= params.count {
                    break;
                }
            }
        };

        tokio::select! {
            _ = tokio::time::timeout(outer_deadline, cascade_body) => {}
            _ = self.shutdown.cancelled() => {
                tracing::debug!(domain = %publisher.domain, "cascade abandoned on shutdown");
            }
        }

        let message = if kept.is_empty() {
            Some(format!("no articles found for {}", publisher.domain))
        } else if kept.len() < params.count {
            Some(format!("found {} of requested {}", kept.len(), params.count))
        } else {
            None
        };

        let ranked = crate::filter::rank_and_cap(kept, params.count);
        CascadeOutcome {
            articles: ranked,
            source_used: if provenance.is_empty() {
                format!("none ({})", publisher.domain)
            } else {
                provenance.join("; ")
            },
            message,
        }
    }

    async fn run_tier(&self, sources: &[&Source]) -> Vec<Article> {
        if self.fetch_config.parallel_fetch {
            let tasks = sources.iter().map(|source| self.fetch_and_parse(source));
            join_all(tasks).await.into_iter().flatten().collect()
        } else {
            let mut articles = Vec::new();
            for source in sources {
                articles.extend(self.fetch_and_parse(source).await);
            }
            articles
        }
    }

    async fn fetch_and_parse(&self, source: &Source) -> Vec<Article> {
        let deadline = Duration::from_millis(source.timeout_ms.unwrap_or(self.fetch_config.default_timeout_ms));
        let bytes = match self
            .fetch_client
            .fetch(&source.url, deadline, self.fetch_config.cascade_retries)
            .await
        {
            Ok(bytes) => bytes,
            Err(_) => return Vec::new(),
        };

        let domain = domain_from_url(&source.url);

        match source.source_type {
            SourceType::OfficialFeed | SourceType::FeedProxy | SourceType::AggregatorFeed => {
                match feed::parse_feed(&bytes, &domain, &self.date_parser, self.fetch_config.max_articles_per_request) {
                    Ok(articles) => articles,
                    Err(FeedError::Parse(_)) => Vec::new(),
                }
            }
            SourceType::Scraper => {
                let html = match String::from_utf8(bytes.to_vec()) {
                    Ok(html) => html,
                    Err(_) => return Vec::new(),
                };
                let stubs = match listing::scrape_listing(html, source.url.clone(), domain).await {
                    Ok(stubs) => stubs,
                    Err(_) => return Vec::new(),
                };

                if !self.deep_scrape_enabled {
                    return stubs;
                }

                let to_enrich: Vec<Article> = stubs.iter().take(self.deep_scrape_max_articles).cloned().collect();
                let rest: Vec<Article> = stubs.into_iter().skip(self.deep_scrape_max_articles).collect();

                let enriched = deep::deep_scrape_batch(
                    to_enrich,
                    Arc::clone(&self.fetch_client),
                    Arc::clone(&self.date_parser),
                    self.deep_scrape_worker_count,
                    self.deep_scrape_per_article_timeout,
                    self.deep_scrape_batch_deadline,
                    self.deep_scrape_summary_chars,
                )
                .await;

                let mut merged = enriched;
                merged.extend(rest);
                merged
            }
        }
    }
}

fn domain_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| url.to_string())
}

fn source_type_label(source_type: SourceType) -> &'static str {
    match source_type {
        SourceType::OfficialFeed => "official_feed",
        SourceType::FeedProxy => "feed_proxy",
        SourceType::AggregatorFeed => "aggregator_feed",
        SourceType::Scraper => "scraper",
    }
}
