//! RSS/Atom feed parser (C6), grounded on two community news aggregators'
//! use of `feed_rs::parser` to turn raw feed bytes into normalized entries.

use crate::article::Article;
use crate::dates::DateParser;

/// Hard cap on articles produced from a single feed fetch.
pub const MAX_ARTICLES_PER_REQUEST: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed parse failed: {0}")]
    Parse(String),
}

/// Parses `bytes` as an RSS or Atom feed and returns up to `max_articles`
/// normalized articles. Entries missing a title or link are skipped rather
/// than failing the whole feed — a handful of malformed entries in an
/// otherwise-good feed shouldn't zero out the source.
pub fn parse_feed(bytes: &[u8], source_domain: &str, date_parser: &DateParser, max_articles: usize) -> Result<Vec<Article>, FeedError> {
    let parsed = feed_rs::parser::parse(bytes).map_err(|e| FeedError::Parse(e.to_string()))?;

    let mut articles = Vec::new();
    for entry in parsed.entries {
        let Some(title) = entry.title.as_ref().map(|t| t.content.clone()) else {
            continue;
        };
        let Some(link) = entry.links.first().map(|l| l.href.clone()) else {
            continue;
        };
        if title.trim().is_empty() || link.trim().is_empty() {
            continue;
        }
        if crate::safety::check_url_safety(&link).is_err() {
            continue;
        }

        let summary = entry
            .summary
            .as_ref()
            .map(|s| s.content.clone())
            .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
            .unwrap_or_default();

        let author = entry
            .authors
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_default();

        let tags: Vec<String> = entry.categories.iter().map(|c| c.term.clone()).collect();

        // Prefer structured time fields over anything string-parsed; fall
        // back through published -> updated and finally feed-level updated.
        let published_at = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.to_rfc3339())
            .or_else(|| parsed.updated.map(|dt| dt.to_rfc3339()))
            .or_else(|| date_parser.parse(&summary));

        let article = Article::new(title, link, source_domain.to_string())
            .with_summary(summary)
            .with_author(author)
            .with_tags(tags)
            .with_published_at(published_at);

        articles.push(article);
        if articles.len() >= max_articles {
            break;
        }
    }

    Ok(articles)
}
