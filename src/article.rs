//! The normalized article record produced by the feed parser, listing scraper,
//! and deep scraper, and consumed by the filter/dedup stage.

use serde::{Deserialize, Serialize};

/// Hard per-field limits applied by every producer before an article leaves
/// its parser. These are not configurable: they bound response size and
/// protect downstream JSON consumers from pathological upstream content.
pub const MAX_TITLE_CHARS: usize = 300;
pub const MAX_SUMMARY_CHARS: usize = 1000;
pub const MAX_AUTHOR_CHARS: usize = 100;
pub const MAX_TAGS: usize = 5;
pub const MAX_TAG_CHARS: usize = 50;

/// A single news article, normalized across feed, listing-scrape, and
/// deep-scrape origins.
///
/// `title` and `url` are required by every producer; every other field may
/// be empty. Once returned to a caller an `Article` is never mutated again —
/// `full_content`/`content_length`/`deep_scraped` are the only fields set
/// after initial construction, and only by the deep scraper (C8).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub source_domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<usize>,
    /// Whether the deep scraper (C8) successfully enriched this article.
    /// Only meaningful for scraper-sourced articles.
    #[serde(default)]
    pub deep_scraped: bool,
}

impl Article {
    pub fn new(title: impl Into<String>, url: impl Into<String>, source_domain: impl Into<String>) -> Self {
        Self {
            title: sanitize(title.into(), MAX_TITLE_CHARS),
            url: url.into(),
            published_at: None,
            summary: String::new(),
            author: String::new(),
            tags: Vec::new(),
            source_domain: source_domain.into(),
            full_content: None,
            content_length: None,
            deep_scraped: false,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = sanitize(summary.into(), MAX_SUMMARY_CHARS);
        self
    }

    pub fn with_published_at(mut self, published_at: Option<String>) -> Self {
        self.published_at = published_at;
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = sanitize(author.into(), MAX_AUTHOR_CHARS);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags
            .into_iter()
            .take(MAX_TAGS)
            .map(|t| sanitize(t, MAX_TAG_CHARS))
            .collect();
        self
    }

    /// Normalized URL used for fingerprinting: lowercased, trailing slash stripped.
    pub fn normalized_url(&self) -> String {
        let lower = self.url.to_lowercase();
        lower.strip_suffix('/').unwrap_or(&lower).to_string()
    }

    /// Normalized title used for fingerprinting: whitespace-collapsed, lowercased.
    pub fn normalized_title(&self) -> String {
        self.title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
    }

    /// Searchable text for keyword matching: title + summary + tags, lowercased.
    pub fn searchable_text(&self) -> String {
        let mut text = self.title.clone();
        text.push(' ');
        text.push_str(&self.summary);
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        text.to_lowercase()
    }
}

/// Truncates to a char boundary and strips control characters; never panics
/// on multi-byte input.
fn sanitize(s: String, max_chars: usize) -> String {
    let cleaned: String = s.chars().filter(|c| !c.is_control() || *c == ' ').collect();
    if cleaned.chars().count() <= max_chars {
        cleaned
    } else {
        cleaned.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_url_trailing_slash() {
        let a = Article::new("T", "HTTPS://Example.com/Path/", "example.com");
        assert_eq!(a.normalized_url(), "https://example.com/path");
    }

    #[test]
    fn normalizes_title_whitespace() {
        let a = Article::new("  Hello   World  ", "https://x.test/a", "x.test");
        assert_eq!(a.normalized_title(), "hello world");
    }

    #[test]
    fn sanitize_truncates_long_title() {
        let long = "x".repeat(1000);
        let a = Article::new(long, "https://x.test/a", "x.test");
        assert_eq!(a.title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn tags_capped_at_five() {
        let a = Article::new("T", "https://x.test/a", "x.test")
            .with_tags(vec!["a", "b", "c", "d", "e", "f"].into_iter().map(String::from).collect());
        assert_eq!(a.tags.len(), MAX_TAGS);
    }
}
