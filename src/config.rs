//! Configuration loading and constants.
//!
//! Loads application configuration from TOML, with environment-variable
//! overrides for the fields operators tune most (the `NEWSAGG_*` variables
//! documented alongside each field). `AppConfig` is the root configuration
//! struct; `AppConfig::load` is the only entry point and is called once at
//! process start.

use const_format::formatcp;
use serde::Deserialize;
use std::path::Path;

// =============================================================================
// HTTP response cache control (REST mirror only)
// =============================================================================

/// Article list responses are allowed to go stale briefly; the cascade itself
/// already caches (C3), so this just saves upstream proxies a round trip.
pub const HTTP_CACHE_ARTICLES_MAX_AGE: u32 = 30;
pub const HTTP_CACHE_ARTICLES_SWR: u32 = 30;

pub const CACHE_CONTROL_ARTICLES: &str = formatcp!(
    "public, max-age={}, stale-while-revalidate={}",
    HTTP_CACHE_ARTICLES_MAX_AGE,
    HTTP_CACHE_ARTICLES_SWR
);

pub const CACHE_CONTROL_HEALTH: &str = "no-store";
pub const CACHE_CONTROL_METRICS: &str = "no-store";

// =============================================================================
// Defaults shared across the cascade, filter, and handler
// =============================================================================

/// Default article count requested by `get_articles`.
pub const DEFAULT_COUNT: usize = 10;
/// Default article count requested by `get_top_news`.
pub const DEFAULT_TOP_NEWS_COUNT: usize = 8;
/// Hard cap on `count` regardless of caller request.
pub const MAX_COUNT: usize = 50;
/// Hard cap on `lastNDays` regardless of caller request.
pub const MAX_LAST_N_DAYS: u32 = 15;
/// Default `lastNDays` when the caller omits it.
pub const DEFAULT_LAST_N_DAYS: u32 = 15;
/// Per-response article cap, independent of requested `count`.
pub const MAX_ARTICLES_PER_REQUEST: usize = 50;

/// Default log filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "newsagg=debug,tower_http=debug";
/// Default log format (text or json).
pub const DEFAULT_LOG_FORMAT: &str = "text";
/// Default publisher-configuration path, resolved relative to the binary's
/// working directory when `NEWSAGG_CONFIG_PATH` is unset.
pub const DEFAULT_PUBLISHERS_PATH: &str = "config/publishers.json";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpServerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub deep_scrape: DeepScrapeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Path to the publisher-configuration JSON document.
    #[serde(default = "AppConfig::default_publishers_path")]
    pub publishers_path: String,
}

impl AppConfig {
    fn default_publishers_path() -> String {
        DEFAULT_PUBLISHERS_PATH.to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }
    fn default_port() -> u16 {
        8080
    }
}

/// HTTP client and cascade timing/retry tuning (C1/C10).
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-source deadline in milliseconds, used when a source has no
    /// `timeout_ms` of its own.
    #[serde(default = "FetchConfig::default_timeout_ms")]
    pub default_timeout_ms: u64,
    /// Retries for cascade fetches. Open Question 1: authoritative value is 0.
    #[serde(default = "FetchConfig::default_cascade_retries")]
    pub cascade_retries: u32,
    /// Retries for the deep-content pass.
    #[serde(default = "FetchConfig::default_deep_scrape_retries")]
    pub deep_scrape_retries: u32,
    #[serde(default = "FetchConfig::default_user_agent")]
    pub user_agent: String,
    /// Inner per-tier deadline, milliseconds.
    #[serde(default = "FetchConfig::default_tier_deadline_ms")]
    pub tier_deadline_ms: u64,
    /// Outer cross-tier cascade deadline, milliseconds.
    #[serde(default = "FetchConfig::default_cascade_deadline_ms")]
    pub cascade_deadline_ms: u64,
    /// Hard cap on articles produced per feed/listing fetch.
    #[serde(default = "FetchConfig::default_max_articles_per_request")]
    pub max_articles_per_request: usize,
    /// Whether sources within a tier are fetched concurrently. Disabling this
    /// is strictly slower and exists only as an operator escape hatch for
    /// publishers that rate-limit concurrent connections from one IP.
    #[serde(default = "FetchConfig::default_parallel_fetch")]
    pub parallel_fetch: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: Self::default_timeout_ms(),
            cascade_retries: Self::default_cascade_retries(),
            deep_scrape_retries: Self::default_deep_scrape_retries(),
            user_agent: Self::default_user_agent(),
            tier_deadline_ms: Self::default_tier_deadline_ms(),
            cascade_deadline_ms: Self::default_cascade_deadline_ms(),
            max_articles_per_request: Self::default_max_articles_per_request(),
            parallel_fetch: Self::default_parallel_fetch(),
        }
    }
}

impl FetchConfig {
    fn default_timeout_ms() -> u64 {
        2500
    }
    fn default_cascade_retries() -> u32 {
        0
    }
    fn default_deep_scrape_retries() -> u32 {
        1
    }
    fn default_user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/124.0.0.0 Safari/537.36"
            .to_string()
    }
    fn default_tier_deadline_ms() -> u64 {
        5000
    }
    fn default_cascade_deadline_ms() -> u64 {
        10_000
    }
    fn default_max_articles_per_request() -> usize {
        crate::feed::MAX_ARTICLES_PER_REQUEST
    }
    fn default_parallel_fetch() -> bool {
        true
    }
}

/// Response cache (C3) tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "CacheConfig::default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: Self::default_ttl_secs(),
            max_entries: Self::default_max_entries(),
        }
    }
}

impl CacheConfig {
    fn default_ttl_secs() -> u64 {
        300
    }
    fn default_max_entries() -> u64 {
        1000
    }
}

/// Sliding-window rate limiter (C2) tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "RateLimitConfig::default_count")]
    pub count: u32,
    #[serde(default = "RateLimitConfig::default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            count: Self::default_count(),
            window_secs: Self::default_window_secs(),
        }
    }
}

impl RateLimitConfig {
    fn default_count() -> u32 {
        10
    }
    fn default_window_secs() -> u64 {
        60
    }
}

/// Deep-content enrichment pass (C8) tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct DeepScrapeConfig {
    #[serde(default = "DeepScrapeConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "DeepScrapeConfig::default_max_articles")]
    pub max_articles: usize,
    #[serde(default = "DeepScrapeConfig::default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "DeepScrapeConfig::default_per_article_timeout_ms")]
    pub per_article_timeout_ms: u64,
    #[serde(default = "DeepScrapeConfig::default_batch_deadline_ms")]
    pub batch_deadline_ms: u64,
    #[serde(default = "DeepScrapeConfig::default_summary_chars")]
    pub summary_chars: usize,
}

impl Default for DeepScrapeConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            max_articles: Self::default_max_articles(),
            worker_count: Self::default_worker_count(),
            per_article_timeout_ms: Self::default_per_article_timeout_ms(),
            batch_deadline_ms: Self::default_batch_deadline_ms(),
            summary_chars: Self::default_summary_chars(),
        }
    }
}

impl DeepScrapeConfig {
    fn default_enabled() -> bool {
        true
    }
    fn default_max_articles() -> usize {
        10
    }
    fn default_worker_count() -> usize {
        5
    }
    fn default_per_article_timeout_ms() -> u64 {
        2000
    }
    fn default_batch_deadline_ms() -> u64 {
        30_000
    }
    fn default_summary_chars() -> usize {
        500
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured).
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
    #[serde(default = "LoggingConfig::default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: Self::default_format(),
            filter: Self::default_filter(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }
    fn default_filter() -> String {
        DEFAULT_LOG_FILTER.to_string()
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file, then applies `NEWSAGG_*`
    /// environment overrides, then validates. An absent file is not an
    /// error at this layer: callers that want a bootstrap default should
    /// catch `ConfigError::Io` and fall back to `AppConfig::default()`-style
    /// construction themselves; `load` is strict because production
    /// deployments should not silently run on defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&contents)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("NEWSAGG_LOG_LEVEL") {
            self.logging.filter = v;
        }
        if let Ok(v) = std::env::var("NEWSAGG_LOG_FORMAT") {
            self.logging.format = v;
        }
        if let Ok(v) = std::env::var("NEWSAGG_CACHE_TTL_SECS").and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent)) {
            self.cache.ttl_secs = v;
        }
        if let Ok(v) = std::env::var("NEWSAGG_RATE_LIMIT_COUNT").and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent)) {
            self.rate_limit.count = v;
        }
        if let Ok(v) = std::env::var("NEWSAGG_RATE_LIMIT_WINDOW_SECS").and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent)) {
            self.rate_limit.window_secs = v;
        }
        if let Ok(v) = std::env::var("NEWSAGG_DEEP_SCRAPE") {
            self.deep_scrape.enabled = v != "0" && v.to_lowercase() != "false";
        }
        if let Ok(v) = std::env::var("NEWSAGG_DEEP_SCRAPE_MAX_ARTICLES").and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent)) {
            self.deep_scrape.max_articles = v;
        }
        if let Ok(v) = std::env::var("NEWSAGG_DEEP_SCRAPE_WORKERS").and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent)) {
            self.deep_scrape.worker_count = v;
        }
        if let Ok(v) = std::env::var("NEWSAGG_CONFIG_PATH") {
            self.publishers_path = v;
        }
        if let Ok(v) = std::env::var("NEWSAGG_HTTP_HOST") {
            self.http.host = v;
        }
        if let Ok(v) = std::env::var("NEWSAGG_HTTP_PORT").and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent)) {
            self.http.port = v;
        }
        if let Ok(v) = std::env::var("NEWSAGG_MAX_ARTICLES").and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent)) {
            self.fetch.max_articles_per_request = v;
        }
        if let Ok(v) = std::env::var("NEWSAGG_PARALLEL_FETCH") {
            self.fetch.parallel_fetch = v != "0" && v.to_lowercase() != "false";
        }
        if let Ok(v) = std::env::var("NEWSAGG_DEEP_SCRAPE_TIMEOUT_MS").and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent)) {
            self.deep_scrape.per_article_timeout_ms = v;
        }
        if let Ok(v) = std::env::var("NEWSAGG_DEEP_SCRAPE_SUMMARY_CHARS").and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent)) {
            self.deep_scrape.summary_chars = v;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.count == 0 {
            return Err(ConfigError::Validation(
                "rate_limit.count must be greater than zero".to_string(),
            ));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Validation(
                "rate_limit.window_secs must be greater than zero".to_string(),
            ));
        }
        if self.deep_scrape.worker_count == 0 {
            return Err(ConfigError::Validation(
                "deep_scrape.worker_count must be greater than zero".to_string(),
            ));
        }
        if self.publishers_path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "publishers_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("configuration error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_applies_defaults_for_missing_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "publishers_path = \"publishers.json\"").unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.rate_limit.count, 10);
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.fetch.cascade_retries, 0);
        assert_eq!(config.fetch.default_timeout_ms, 2500);
    }

    #[test]
    fn validate_rejects_zero_rate_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "publishers_path = \"p.json\"\n[rate_limit]\ncount = 0").unwrap();
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
