//! Shared process startup: load config, init tracing, wire every service into
//! one `RequestHandler`. Both binaries call into this rather than duplicating
//! construction, the way the teacher keeps `main.rs` itself a thin driver.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cache::ResponseCache;
use crate::cascade::CascadeEngine;
use crate::config::AppConfig;
use crate::dates::DateParser;
use crate::error::AppError;
use crate::filter::Filter;
use crate::handler::RequestHandler;
use crate::http_client::FetchClient;
use crate::metrics::Metrics;
use crate::publisher::PublisherRegistry;
use crate::rate_limit::RateLimiter;

/// Initializes the global tracing subscriber per `LoggingConfig`. Must be
/// called at most once per process.
pub fn init_tracing(config: &crate::config::LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.filter.clone()));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Builds a fully-wired `RequestHandler` from a loaded `AppConfig`. `shutdown`
/// is threaded into the cascade engine so a process-wide shutdown signal
/// abandons in-flight cascades instead of running them to their own deadline.
pub async fn build_handler(
    config: &AppConfig,
    shutdown: CancellationToken,
) -> Result<Arc<RequestHandler>, AppError> {
    let metrics = Arc::new(Metrics::new());
    let fetch_client = Arc::new(FetchClient::new(&config.fetch.user_agent, metrics.clone()));
    let date_parser = Arc::new(DateParser::new());
    let filter = Arc::new(Filter::new());
    let cache = Arc::new(ResponseCache::new(config.cache.ttl_secs, config.cache.max_entries, metrics.clone()));
    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit.count,
        std::time::Duration::from_secs(config.rate_limit.window_secs),
    ));

    let registry = PublisherRegistry::load(&config.publishers_path)
        .map_err(|e| AppError::Internal(format!("failed to load publisher config: {e}")))?;

    let engine = Arc::new(CascadeEngine::new(
        fetch_client,
        date_parser,
        filter,
        config.fetch.clone(),
        &config.deep_scrape,
        shutdown,
    ));

    Ok(Arc::new(RequestHandler::new(rate_limiter, cache, Arc::new(registry), engine, metrics)))
}

/// Waits for SIGTERM or Ctrl+C. Shared by the HTTP server's graceful-drain
/// hook and the stdio loop's shutdown listener.
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, initiating shutdown"),
        _ = terminate => tracing::info!("received SIGTERM, initiating shutdown"),
    }
}

/// Spawns a background task that cancels `token` once a shutdown signal
/// arrives. Used by the stdio loop, which has no graceful-drain hook of its
/// own to piggyback on.
pub fn spawn_shutdown_listener(token: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        token.cancel();
    });
}
