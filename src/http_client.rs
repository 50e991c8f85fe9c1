//! Pooled HTTP fetch client with bounded retries and URL safety checks (C1).
//!
//! Grounded on the retry/backoff shape of a community news-fetcher's
//! `fetch_with_retry`: a generic retry loop around a single attempt closure,
//! exponential backoff, and typed failure reasons instead of raw `reqwest`
//! errors leaking past this module.

use std::time::{Duration, Instant};

use reqwest::Client;

use crate::metrics::Metrics;
use crate::safety::check_url_safety;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("url rejected by safety filter: {0:?}")]
    Unsafe(crate::safety::UnsafeReason),
    #[error("request timed out")]
    Timeout,
    #[error("TLS error: {0}")]
    TlsError(String),
    #[error("connection error: {0}")]
    ConnectionError(String),
    #[error("non-2xx status: {0}")]
    HttpStatus(u16),
}

pub struct FetchClient {
    client: Client,
    metrics: std::sync::Arc<Metrics>,
}

impl FetchClient {
    pub fn new(user_agent: &str, metrics: std::sync::Arc<Metrics>) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .expect("failed to build HTTP client");
        Self { client, metrics }
    }

    /// Fetches `url` with a deadline and up to `retries` additional attempts
    /// (so `retries = 0` means exactly one attempt). Never retries after a
    /// TLS verification failure — that failure mode will not resolve on
    /// retry and burns the source's remaining deadline.
    pub async fn fetch(&self, url: &str, deadline: Duration, retries: u32) -> Result<bytes::Bytes, FetchError> {
        check_url_safety(url).map_err(FetchError::Unsafe)?;

        let mut attempt = 0;
        loop {
            let started = Instant::now();
            let outcome = tokio::time::timeout(deadline, self.attempt(url)).await;
            self.metrics.record_duration("fetch_duration", started.elapsed());

            let result = match outcome {
                Err(_) => {
                    self.metrics.incr("fetch_timeout");
                    Err(FetchError::Timeout)
                }
                Ok(inner) => inner,
            };

            match &result {
                Ok(_) => {
                    self.metrics.incr("fetch_success");
                    return result;
                }
                Err(FetchError::TlsError(_)) => {
                    self.metrics.incr("fetch_ssl_error");
                    return result;
                }
                Err(FetchError::ConnectionError(_)) => {
                    self.metrics.incr("fetch_connection_error");
                }
                Err(FetchError::HttpStatus(_)) => {
                    self.metrics.incr("fetch_error");
                }
                Err(_) => {
                    self.metrics.incr("fetch_failed");
                }
            }

            if attempt >= retries {
                return result;
            }
            attempt += 1;
            let backoff = Duration::from_secs_f64(0.3 * 2f64.powi(attempt as i32 - 1));
            tokio::time::sleep(backoff).await;
        }
    }

    async fn attempt(&self, url: &str) -> Result<bytes::Bytes, FetchError> {
        let accept = "application/rss+xml, application/atom+xml, application/xml, text/xml, text/html;q=0.9, */*;q=0.8";
        let response = self
            .client
            .get(url)
            .header("Accept", accept)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        response.bytes().await.map_err(classify_reqwest_error)
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_connect() {
        if let Some(source) = err.source_chain_contains_tls() {
            FetchError::TlsError(source)
        } else {
            FetchError::ConnectionError(err.to_string())
        }
    } else {
        FetchError::ConnectionError(err.to_string())
    }
}

/// Small helper trait kept local to this module: `reqwest::Error` doesn't
/// expose a `is_tls()` check, so walk the source chain for the common
/// rustls/webpki error markers instead.
trait TlsErrorExt {
    fn source_chain_contains_tls(&self) -> Option<String>;
}

impl TlsErrorExt for reqwest::Error {
    fn source_chain_contains_tls(&self) -> Option<String> {
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            let msg = err.to_string();
            if msg.contains("certificate") || msg.contains("tls") || msg.contains("TLS") {
                return Some(msg);
            }
            source = err.source();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_unsafe_url_before_network() {
        let client = FetchClient::new("test-agent", std::sync::Arc::new(Metrics::new()));
        let result = client.fetch("http://127.0.0.1/x", Duration::from_millis(100), 0).await;
        assert!(matches!(result, Err(FetchError::Unsafe(_))));
    }
}
