//! Listing scraper (C7): extracts article stubs (title + URL, no body) from
//! a publisher's homepage or section-listing page. Two passes: a semantic-
//! selector pass first (`article a`, `h2 a`, `.headline a`, ...), then a
//! generic headline-tag fallback (`h1 a`, `h2 a`, `h3 a`) if the first pass
//! yields fewer than [`MIN_RESULTS_BEFORE_FALLBACK`] links.
//!
//! Grounded on the `scraper::{Html, Selector}` + `spawn_blocking` idiom used
//! by a community Rust-blog fetcher to pull headline links off a listing page.

use scraper::{Html, Selector};
use url::Url;

use crate::article::Article;
use crate::safety::check_url_safety;

pub const MIN_RESULTS_BEFORE_FALLBACK: usize = 5;
pub const MAX_STUBS_PER_PAGE: usize = 50;
/// Generic `h1`/`h2`/`h3` headline tags pick up a lot of noise (nav labels,
/// short captions); the semantic pass has no such ambiguity, so only the
/// fallback pass enforces this.
const MIN_FALLBACK_TITLE_CHARS: usize = 10;

const SEMANTIC_SELECTORS: &[&str] = &[
    "article a[href]",
    ".headline a[href]",
    ".story a[href]",
    ".post-title a[href]",
    "h2.title a[href]",
    "h3.title a[href]",
];

const FALLBACK_SELECTORS: &[&str] = &["h1 a[href]", "h2 a[href]", "h3 a[href]"];

/// Tags whose subtrees are stripped before either pass runs: navigation,
/// scripting, and styling never contain article links worth keeping.
const STRIP_TAGS: &[&str] = &["script", "style", "nav", "footer", "aside", "noscript"];

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

/// Runs both scraper passes against `html` on a blocking thread, since
/// `scraper`'s DOM parsing is CPU-bound.
pub async fn scrape_listing(html: String, base_url: String, source_domain: String) -> Result<Vec<Article>, ScrapeError> {
    tokio::task::spawn_blocking(move || scrape_listing_sync(&html, &base_url, &source_domain))
        .await
        .expect("scrape_listing blocking task panicked")
}

fn scrape_listing_sync(html: &str, base_url: &str, source_domain: &str) -> Result<Vec<Article>, ScrapeError> {
    let base = Url::parse(base_url).map_err(|e| ScrapeError::InvalidBaseUrl(e.to_string()))?;
    let document = Html::parse_document(html);

    let mut stubs = extract_with_selectors(&document, SEMANTIC_SELECTORS, &base, source_domain, 0);
    if stubs.len() < MIN_RESULTS_BEFORE_FALLBACK {
        let fallback = extract_with_selectors(&document, FALLBACK_SELECTORS, &base, source_domain, MIN_FALLBACK_TITLE_CHARS);
        for article in fallback {
            if !stubs.iter().any(|a: &Article| a.normalized_url() == article.normalized_url()) {
                stubs.push(article);
            }
        }
    }

    stubs.truncate(MAX_STUBS_PER_PAGE);
    Ok(stubs)
}

fn extract_with_selectors(
    document: &Html,
    selectors: &[&str],
    base: &Url,
    source_domain: &str,
    min_title_chars: usize,
) -> Vec<Article> {
    let mut seen_urls = std::collections::HashSet::new();
    let mut stubs = Vec::new();

    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in document.select(&selector) {
            if is_inside_stripped_tag(&element) {
                continue;
            }

            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(absolute) = resolve_url(base, href) else {
                continue;
            };
            if check_url_safety(&absolute).is_err() {
                continue;
            }

            let title: String = element.text().collect::<String>().trim().to_string();
            if title.is_empty() || title.chars().count() < min_title_chars {
                continue;
            }

            if !seen_urls.insert(absolute.clone()) {
                continue;
            }

            stubs.push(Article::new(title, absolute, source_domain.to_string()));
        }
    }

    stubs
}

fn is_inside_stripped_tag(element: &scraper::ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .map(|el| STRIP_TAGS.contains(&el.name()))
            .unwrap_or(false)
    })
}

/// Resolves `href` against `base`: absolute URLs pass through, protocol-
/// relative (`//host/path`) URLs get the base's scheme, and relative paths
/// are joined against the base.
fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("javascript:") || trimmed.starts_with("mailto:") {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix("//") {
        return Some(format!("{}://{}", base.scheme(), rest));
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Some(trimmed.to_string());
    }

    base.join(trimmed).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_semantic_article_links() {
        let html = r#"
            <html><body>
              <article><a href="/news/a">First Headline</a></article>
              <article><a href="/news/b">Second Headline</a></article>
              <nav><a href="/news/c">Nav Link Should Be Ignored</a></nav>
            </body></html>
        "#.to_string();
        let stubs = scrape_listing(html, "https://example.test/".to_string(), "example.test".to_string())
            .await
            .unwrap();
        assert_eq!(stubs.len(), 2);
        assert!(stubs.iter().all(|a| a.url.starts_with("https://example.test/news/")));
    }

    #[tokio::test]
    async fn falls_back_to_headline_tags_when_sparse() {
        let html = r#"
            <html><body>
              <h2><a href="/a">First Long Headline</a></h2>
              <h3><a href="/b">Second Long Headline</a></h3>
            </body></html>
        "#.to_string();
        let stubs = scrape_listing(html, "https://example.test/".to_string(), "example.test".to_string())
            .await
            .unwrap();
        assert_eq!(stubs.len(), 2);
    }

    #[tokio::test]
    async fn fallback_skips_short_titles() {
        let html = r#"
            <html><body>
              <h2><a href="/a">One</a></h2>
              <h3><a href="/b">Two</a></h3>
            </body></html>
        "#.to_string();
        let stubs = scrape_listing(html, "https://example.test/".to_string(), "example.test".to_string())
            .await
            .unwrap();
        assert!(stubs.is_empty());
    }

    #[tokio::test]
    async fn resolves_protocol_relative_links() {
        let html = r#"<html><body><article><a href="//cdn.example.test/x">X</a></article></body></html>"#.to_string();
        let stubs = scrape_listing(html, "https://example.test/".to_string(), "example.test".to_string())
            .await
            .unwrap();
        assert_eq!(stubs[0].url, "https://cdn.example.test/x");
    }

    #[tokio::test]
    async fn rejects_unsafe_resolved_links() {
        let html = r#"<html><body><article><a href="http://127.0.0.1/admin">Hidden</a></article></body></html>"#.to_string();
        let stubs = scrape_listing(html, "https://example.test/".to_string(), "example.test".to_string())
            .await
            .unwrap();
        assert!(stubs.is_empty());
    }
}
