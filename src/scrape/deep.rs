//! Deep scraper (C8): enriches a listing-scraped article stub with its full
//! body text, fetched and parsed with bounded concurrency and an overall
//! batch deadline so one slow publisher can't stall a whole request.
//!
//! Concurrency shape grounded on the teacher's worker-pool pattern
//! (`nntp/worker.rs`), generalized here via `futures::stream::buffer_unordered`
//! instead of a dedicated channel-fed worker loop, since each unit of work is
//! independent and short-lived.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use scraper::{ElementRef, Html, Selector};

use crate::article::Article;
use crate::dates::DateParser;
use crate::http_client::FetchClient;

const CONTENT_SELECTORS: &[&str] = &[
    "article",
    ".article-body",
    ".post-content",
    ".entry-content",
    "main",
];

const DATE_SELECTORS: &[&str] = &["time[datetime]", "meta[property='article:published_time']"];
const AUTHOR_SELECTORS: &[&str] = &[".byline", ".author", "meta[name='author']"];
const JSON_LD_SELECTOR: &str = "script[type='application/ld+json']";

/// Tags and class-name substrings that mark noise subtrees (sidebars, ads,
/// comment threads) to exclude from extracted paragraph text.
const STRIP_TAGS: &[&str] = &["script", "style", "nav", "aside", "footer", "noscript", "form"];
const STRIP_CLASS_HINTS: &[&str] = &[
    "sidebar",
    "comment",
    "advert",
    "promo",
    "related",
    "share",
    "social",
    "newsletter",
    "cookie",
];

/// Paragraphs shorter than this are usually captions or nav fragments, not
/// body text.
const MIN_PARAGRAPH_CHARS: usize = 30;
/// Below this, the gathered paragraphs are too sparse to trust; fall back to
/// the container's full text instead.
const MIN_JOINED_CONTENT_CHARS: usize = 100;

const MIN_SENTENCE_CHARS: usize = 20;
const JUNK_PHRASES: &[&str] = &["click here", "subscribe", "cookie policy", "sign up", "read more"];

/// Enriches up to `articles.len()` stubs concurrently (bounded by
/// `worker_count`), stopping early at `batch_deadline` — articles still in
/// flight at that point are returned un-enriched rather than dropped.
pub async fn deep_scrape_batch(
    articles: Vec<Article>,
    fetch_client: Arc<FetchClient>,
    date_parser: Arc<DateParser>,
    worker_count: usize,
    per_article_timeout: Duration,
    batch_deadline: Duration,
    summary_chars: usize,
) -> Vec<Article> {
    let job = async {
        stream::iter(articles.into_iter().map(|article| {
            let fetch_client = Arc::clone(&fetch_client);
            let date_parser = Arc::clone(&date_parser);
            async move { enrich_one(article, fetch_client, date_parser, per_article_timeout, summary_chars).await }
        }))
        .buffer_unordered(worker_count.max(1))
        .collect::<Vec<Article>>()
        .await
    };

    match tokio::time::timeout(batch_deadline, job).await {
        Ok(results) => results,
        Err(_) => Vec::new(),
    }
}

async fn enrich_one(
    mut article: Article,
    fetch_client: Arc<FetchClient>,
    date_parser: Arc<DateParser>,
    per_article_timeout: Duration,
    summary_chars: usize,
) -> Article {
    let fetch_result = fetch_client.fetch(&article.url, per_article_timeout, 1).await;
    let Ok(bytes) = fetch_result else {
        return article;
    };

    let Ok(html) = String::from_utf8(bytes.to_vec()) else {
        return article;
    };

    let extracted = tokio::task::spawn_blocking(move || extract_content(&html)).await;
    let Ok(extracted) = extracted else {
        return article;
    };

    if let Some(content) = extracted.content {
        article.content_length = Some(content.chars().count());
        if article.summary.is_empty() {
            article.summary = build_summary(&content, summary_chars);
        }
        article.full_content = Some(content);
        article.deep_scraped = true;
    }

    if article.published_at.is_none() {
        if let Some(raw_date) = extracted.raw_date {
            article.published_at = date_parser.parse(&raw_date);
        }
    }

    if article.author.is_empty() {
        if let Some(author) = extracted.author {
            article = article.with_author(author);
        }
    }

    article
}

struct ExtractedContent {
    content: Option<String>,
    raw_date: Option<String>,
    author: Option<String>,
}

/// Fields recovered from a page's JSON-LD `NewsArticle`/`Article` block, if
/// any. These take priority over OG/meta tags and visible date/byline
/// selectors, since publishers keep them accurate for search indexing.
#[derive(Default)]
struct JsonLdFields {
    date: Option<String>,
    author: Option<String>,
}

fn extract_content(html: &str) -> ExtractedContent {
    let document = Html::parse_document(html);
    let json_ld = parse_json_ld(&document).unwrap_or_default();

    let content = CONTENT_SELECTORS
        .iter()
        .find_map(|sel| {
            let selector = Selector::parse(sel).ok()?;
            document.select(&selector).next().map(|el| extract_container_text(&el))
        })
        .filter(|s| !s.is_empty());

    let raw_date = json_ld.date.or_else(|| {
        DATE_SELECTORS.iter().find_map(|sel| {
            let selector = Selector::parse(sel).ok()?;
            let el = document.select(&selector).next()?;
            el.value()
                .attr("datetime")
                .or_else(|| el.value().attr("content"))
                .map(|s| s.to_string())
        })
    });

    let author = json_ld.author.or_else(|| {
        AUTHOR_SELECTORS.iter().find_map(|sel| {
            let selector = Selector::parse(sel).ok()?;
            let el = document.select(&selector).next()?;
            el.value()
                .attr("content")
                .map(|s| s.to_string())
                .or_else(|| {
                    let text = el.text().collect::<String>().trim().to_string();
                    if text.is_empty() { None } else { Some(text) }
                })
        })
    });

    ExtractedContent { content, raw_date, author }
}

/// Joins `<p>` fragments longer than [`MIN_PARAGRAPH_CHARS`] inside
/// `container`, skipping sidebar/ad/comment noise. Falls back to the
/// container's full text when the gathered paragraphs are too sparse to be
/// the real article body.
fn extract_container_text(container: &ElementRef<'_>) -> String {
    let Ok(p_selector) = Selector::parse("p") else {
        return collapse_whitespace(container);
    };

    let paragraphs: Vec<String> = container
        .select(&p_selector)
        .filter(|p| !is_noise(p))
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect();

    let joined = paragraphs.join("\n\n");
    if joined.chars().count() >= MIN_JOINED_CONTENT_CHARS {
        joined
    } else {
        collapse_whitespace(container)
    }
}

fn collapse_whitespace(container: &ElementRef<'_>) -> String {
    container.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_noise(element: &ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .map(|el| {
                if STRIP_TAGS.contains(&el.name()) {
                    return true;
                }
                el.attr("class")
                    .map(|class| {
                        let class = class.to_lowercase();
                        STRIP_CLASS_HINTS.iter().any(|hint| class.contains(hint))
                    })
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    })
}

fn parse_json_ld(document: &Html) -> Option<JsonLdFields> {
    let selector = Selector::parse(JSON_LD_SELECTOR).ok()?;
    document.select(&selector).find_map(|el| {
        let text = el.text().collect::<String>();
        let value: serde_json::Value = serde_json::from_str(&text).ok()?;
        json_ld_fields_from_value(&value)
    })
}

fn json_ld_fields_from_value(value: &serde_json::Value) -> Option<JsonLdFields> {
    match value {
        serde_json::Value::Array(items) => items.iter().find_map(json_ld_fields_from_value),
        serde_json::Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                if let Some(fields) = json_ld_fields_from_value(graph) {
                    return Some(fields);
                }
            }
            let date = map
                .get("datePublished")
                .or_else(|| map.get("dateCreated"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            let author = map.get("author").and_then(json_ld_author_name);
            if date.is_some() || author.is_some() {
                Some(JsonLdFields { date, author })
            } else {
                None
            }
        }
        _ => None,
    }
}

fn json_ld_author_name(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => map.get("name").and_then(|v| v.as_str()).map(|s| s.to_string()),
        serde_json::Value::Array(items) => items.first().and_then(json_ld_author_name),
        _ => None,
    }
}

/// Splits `content` into sentences, keeps those that read as real prose
/// (not nav/boilerplate fragments), and joins them up to `max_chars`.
fn build_summary(content: &str, max_chars: usize) -> String {
    let mut summary = String::new();
    for sentence in content.split(['.', '!', '?']) {
        let trimmed = sentence.trim();
        if trimmed.chars().count() < MIN_SENTENCE_CHARS {
            continue;
        }
        let lower = trimmed.to_lowercase();
        if JUNK_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
            continue;
        }

        if !summary.is_empty() {
            summary.push(' ');
        }
        summary.push_str(trimmed);
        summary.push('.');

        if summary.chars().count() >= max_chars {
            break;
        }
    }

    summary.chars().take(max_chars).collect()
}
