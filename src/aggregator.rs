//! Cross-publisher aggregator (C12): fans out the cascade engine across many
//! publishers in fast-path mode, merges, and re-sorts. Grounded on the
//! teacher's worker-pool pattern (`nntp/worker.rs`/`nntp/service.rs`), using
//! `buffer_unordered` for the bounded concurrency instead of a dedicated
//! channel-fed pool since each publisher's work is independent.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::article::Article;
use crate::cascade::{CascadeEngine, CascadeParams};
use crate::filter::DedupState;
use crate::publisher::PublisherRegistry;

const MAX_SELECTED_PUBLISHERS: usize = 12;
const AGGREGATOR_WORKER_COUNT: usize = 4;
const OUTER_DEADLINE: Duration = Duration::from_secs(15);
const PER_PUBLISHER_DEADLINE: Duration = Duration::from_secs(5);

pub struct AggregatorParams<'a> {
    pub topic: Option<&'a str>,
    pub location: Option<&'a str>,
    pub last_n_days: Option<u32>,
    pub count: usize,
}

pub struct AggregatorOutcome {
    pub articles: Vec<Article>,
    pub publishers_queried: usize,
    pub message: Option<String>,
}

pub async fn aggregate(
    engine: Arc<CascadeEngine>,
    registry: &PublisherRegistry,
    params: &AggregatorParams<'_>,
) -> AggregatorOutcome {
    let selected: Vec<_> = registry
        .ranked_publishers()
        .into_iter()
        .take(MAX_SELECTED_PUBLISHERS)
        .cloned()
        .collect();

    if selected.is_empty() {
        return AggregatorOutcome {
            articles: Vec::new(),
            publishers_queried: 0,
            message: Some("no publishers configured with an aggregator priority".to_string()),
        };
    }

    let count = params.count;
    let cascade_params = Arc::new(CascadeParams {
        topic: params.topic,
        location: params.location,
        last_n_days: params.last_n_days,
        count,
        fast_mode: true,
    });

    let job = async {
        stream::iter(selected.iter().cloned().map(|publisher| {
            let engine = Arc::clone(&engine);
            let cascade_params = Arc::clone(&cascade_params);
            async move {
                let mut dedup = DedupState::new();
                let outcome = tokio::time::timeout(PER_PUBLISHER_DEADLINE, engine.run(&publisher, &cascade_params, &mut dedup)).await;
                outcome.ok().map(|o| o.articles).unwrap_or_default()
            }
        }))
        .buffer_unordered(AGGREGATOR_WORKER_COUNT)
        .collect::<Vec<Vec<Article>>>()
        .await
    };

    let per_publisher_results = tokio::time::timeout(OUTER_DEADLINE, job).await.unwrap_or_default();

    // Merge still needs a final, shared dedup pass: each publisher task ran
    // its own dedup state, so the same wire story reprinted by two
    // publishers survives both tasks individually.
    let mut merge_dedup = DedupState::new();
    let mut merged = Vec::new();
    for articles in per_publisher_results {
        for article in articles {
            if merge_dedup.accept(&article) {
                merged.push(article);
            }
        }
    }

    let ranked = crate::filter::rank_and_cap(merged, count);
    let message = if ranked.is_empty() {
        Some("no articles found across selected publishers".to_string())
    } else if ranked.len() < count {
        Some(format!("found {} of requested {}", ranked.len(), count))
    } else {
        None
    };

    AggregatorOutcome {
        articles: ranked,
        publishers_queried: selected.len(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::CascadeEngine;
    use crate::config::{DeepScrapeConfig, FetchConfig};
    use crate::dates::DateParser;
    use crate::filter::Filter;
    use crate::http_client::FetchClient;
    use crate::metrics::Metrics;
    use crate::publisher::PublisherRegistry;

    fn engine() -> Arc<CascadeEngine> {
        let metrics = Arc::new(Metrics::new());
        Arc::new(CascadeEngine::new(
            Arc::new(FetchClient::new("test-agent", Arc::clone(&metrics))),
            Arc::new(DateParser::new()),
            Arc::new(Filter::new()),
            FetchConfig::default(),
            &DeepScrapeConfig::default(),
            tokio_util::sync::CancellationToken::new(),
        ))
    }

    #[tokio::test]
    async fn no_ranked_publishers_reports_message() {
        let entries = vec![crate::publisher::PublisherConfig {
            domain: "x.test".to_string(),
            priority: None,
            sources: vec![crate::publisher::Source {
                source_type: crate::publisher::SourceType::OfficialFeed,
                url: "https://x.test/feed".to_string(),
                priority: 1,
                timeout_ms: None,
            }],
        }];
        let registry = PublisherRegistry::from_entries(entries).unwrap();
        let params = AggregatorParams { topic: None, location: None, last_n_days: None, count: 8 };
        let outcome = aggregate(engine(), &registry, &params).await;
        assert!(outcome.articles.is_empty());
        assert!(outcome.message.is_some());
    }
}
