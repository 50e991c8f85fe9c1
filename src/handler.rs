//! Request handler (C14): validate -> rate-limit -> cache-check -> cascade ->
//! cache-store -> respond. Grounded on the teacher's instrumented-handler
//! idiom (`routes/home.rs`), adapted from rendering Tera templates to
//! producing a typed JSON response, since this service has no HTML surface.

use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::aggregator::{self, AggregatorParams};
use crate::article::Article;
use crate::cache::{CacheKey, ResponseCache};
use crate::cascade::{CascadeEngine, CascadeParams};
use crate::config::{DEFAULT_COUNT, DEFAULT_LAST_N_DAYS, DEFAULT_TOP_NEWS_COUNT, MAX_COUNT, MAX_LAST_N_DAYS};
use crate::error::AppError;
use crate::filter::DedupState;
use crate::metrics::Metrics;
use crate::publisher::PublisherRegistry;
use crate::rate_limit::RateLimiter;

/// A relaxed domain pattern: accepts partial names (`openai`) as well as
/// fully-qualified domains (`openai.com`), since the publisher registry's
/// lookup already supports prefix matching.
static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9.-]{0,252}$").unwrap());

const MAX_SANITIZED_LEN: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesResponse {
    pub articles: Vec<Article>,
    pub source_used: String,
    pub cached: bool,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub struct GetArticlesArgs {
    pub domain: String,
    pub topic: Option<String>,
    pub location: Option<String>,
    pub last_n_days: Option<u32>,
    pub count: Option<usize>,
    pub fast_mode: bool,
}

pub struct GetTopNewsArgs {
    pub topic: Option<String>,
    pub location: Option<String>,
    pub last_n_days: Option<u32>,
    pub count: Option<usize>,
}

pub struct RequestHandler {
    rate_limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache>,
    registry: Arc<PublisherRegistry>,
    engine: Arc<CascadeEngine>,
    metrics: Arc<Metrics>,
}

impl RequestHandler {
    pub fn new(
        rate_limiter: Arc<RateLimiter>,
        cache: Arc<ResponseCache>,
        registry: Arc<PublisherRegistry>,
        engine: Arc<CascadeEngine>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { rate_limiter, cache, registry, engine, metrics }
    }

    #[instrument(skip(self, args), fields(cache_hit, duration_ms, tier_reached))]
    pub async fn get_articles(&self, args: GetArticlesArgs) -> Result<ArticlesResponse, AppError> {
        let started = Instant::now();

        if !DOMAIN_PATTERN.is_match(&args.domain) {
            return Err(AppError::InvalidArgument(format!("invalid domain: {}", args.domain)));
        }
        let last_n_days = validate_last_n_days(args.last_n_days)?;
        let count = validate_count(args.count.unwrap_or(DEFAULT_COUNT))?;
        let topic = args.topic.as_deref().map(sanitize);
        let location = args.location.as_deref().map(sanitize);

        // Rate-limit keyed by the requested domain, per C2's "keyed by
        // publisher domain" — distinct publishers don't share a budget.
        self.check_rate_limit(&args.domain.to_lowercase())?;

        let publisher = self
            .registry
            .lookup(&args.domain)
            .ok_or_else(|| AppError::NotConfigured(args.domain.clone()))?
            .clone();

        let cache_key = CacheKey {
            domain: publisher.domain.clone(),
            topic: topic.clone(),
            location: location.clone(),
            last_n_days,
            count,
        };

        if let Some(mut cached) = self.cache.get(&cache_key).await {
            cached.cached = true;
            tracing::Span::current().record("cache_hit", true);
            return Ok(cached);
        }
        tracing::Span::current().record("cache_hit", false);

        let params = CascadeParams {
            topic: topic.as_deref(),
            location: location.as_deref(),
            last_n_days: Some(last_n_days),
            count,
            fast_mode: args.fast_mode,
        };
        let mut dedup = DedupState::new();
        let outcome = self.engine.run(&publisher, &params, &mut dedup).await;

        if outcome.articles.is_empty() && outcome.message.is_some() {
            self.metrics.incr("no_content");
        }

        let response = ArticlesResponse {
            articles: outcome.articles,
            source_used: outcome.source_used,
            cached: false,
            duration_ms: started.elapsed().as_millis() as u64,
            message: outcome.message,
        };

        self.cache.set(&cache_key, response.clone()).await;
        self.metrics.record_duration("handler_duration", started.elapsed());
        tracing::Span::current().record("duration_ms", response.duration_ms);
        Ok(response)
    }

    #[instrument(skip(self, args), fields(cache_hit, duration_ms))]
    pub async fn get_top_news(&self, args: GetTopNewsArgs) -> Result<ArticlesResponse, AppError> {
        let started = Instant::now();

        let last_n_days = validate_last_n_days(args.last_n_days)?;
        let count = validate_count(args.count.unwrap_or(DEFAULT_TOP_NEWS_COUNT))?;
        let topic = args.topic.as_deref().map(sanitize);
        let location = args.location.as_deref().map(sanitize);

        self.check_rate_limit("__aggregate__")?;

        let cache_key = CacheKey {
            domain: "__aggregate__".to_string(),
            topic: topic.clone(),
            location: location.clone(),
            last_n_days,
            count,
        };

        if let Some(mut cached) = self.cache.get(&cache_key).await {
            cached.cached = true;
            tracing::Span::current().record("cache_hit", true);
            return Ok(cached);
        }
        tracing::Span::current().record("cache_hit", false);

        let params = AggregatorParams {
            topic: topic.as_deref(),
            location: location.as_deref(),
            last_n_days: Some(last_n_days),
            count,
        };
        let outcome = aggregator::aggregate(Arc::clone(&self.engine), &self.registry, &params).await;

        let response = ArticlesResponse {
            articles: outcome.articles,
            source_used: format!("{} publisher(s) queried", outcome.publishers_queried),
            cached: false,
            duration_ms: started.elapsed().as_millis() as u64,
            message: outcome.message,
        };

        self.cache.set(&cache_key, response.clone()).await;
        self.metrics.record_duration("handler_duration", started.elapsed());
        tracing::Span::current().record("duration_ms", response.duration_ms);
        Ok(response)
    }

    pub fn health_check(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "ok",
            "uptime_secs": self.metrics.uptime_secs(),
            "publishers_configured": self.registry.ranked_publishers().len(),
        })
    }

    pub fn get_metrics(&self) -> serde_json::Value {
        let counters = self.metrics.counters_snapshot();
        let histograms: serde_json::Map<String, serde_json::Value> = self
            .metrics
            .all_histogram_names()
            .into_iter()
            .filter_map(|name| {
                self.metrics
                    .histogram_stats(&name)
                    .map(|stats| (name, serde_json::json!(stats)))
            })
            .collect();
        serde_json::json!({ "counters": counters, "histograms": histograms })
    }

    fn check_rate_limit(&self, client_key: &str) -> Result<(), AppError> {
        let decision = self.rate_limiter.is_allowed(client_key);
        if !decision.allowed {
            self.metrics.incr("rate_limited");
            return Err(AppError::RateLimited { retry_after_secs: decision.retry_after_secs });
        }
        Ok(())
    }
}

fn validate_last_n_days(requested: Option<u32>) -> Result<u32, AppError> {
    let value = requested.unwrap_or(DEFAULT_LAST_N_DAYS);
    if value == 0 || value > 365 {
        return Err(AppError::InvalidArgument(format!("lastNDays out of range: {value}")));
    }
    Ok(value.min(MAX_LAST_N_DAYS))
}

fn validate_count(requested: usize) -> Result<usize, AppError> {
    if requested == 0 {
        return Err(AppError::InvalidArgument("count must be at least 1".to_string()));
    }
    Ok(requested.min(MAX_COUNT))
}

/// Lowercases, strips control characters, and truncates to a short length —
/// callers never need more than a word or two for topic/location.
fn sanitize(raw: &str) -> String {
    let cleaned: String = raw.trim().chars().filter(|c| !c.is_control()).collect();
    let lowered = cleaned.to_lowercase();
    lowered.chars().take(MAX_SANITIZED_LEN).collect()
}
