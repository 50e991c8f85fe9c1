//! Filter/dedup (C9): a single pass over a candidate article list applying
//! topic, location, and date constraints, then deduplicating by URL and
//! normalized title. Dedup state accumulates across an entire aggregation
//! run (not reset per source) so the same story picked up from two
//! publishers is only kept once.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::article::Article;
use crate::topics::{self, EXCLUDE_KEYWORDS, GENERAL_TOPIC};

/// Fixed set of publisher domains treated as India-local for the
/// smart-location skip: requesting `location=india` against one of these
/// (or any `.in` domain) never runs the location keyword check.
pub const INDIAN_PUBLISHER_DOMAINS: &[&str] = &[
    "ndtv.com",
    "indianexpress.com",
    "timesofindia.indiatimes.com",
    "hindustantimes.com",
    "gadgets360.com",
    "economictimes.indiatimes.com",
    "analyticsindiamag.com",
    "indiatechnologynews.in",
    "devshorts.in",
    "analyticsvidhya.com",
    "livemint.com",
    "moneycontrol.com",
    "thehindu.com",
    "business-standard.com",
    "financialexpress.com",
    "deccanherald.com",
];

pub struct Filter {
    topic_regex_cache: std::sync::Mutex<std::collections::HashMap<String, Regex>>,
}

pub struct FilterParams<'a> {
    pub topic: Option<&'a str>,
    pub location: Option<&'a str>,
    pub last_n_days: Option<u32>,
}

/// Accumulates URL/title fingerprints across an entire aggregation run so
/// repeated calls to `Filter::apply` for successive tiers still dedup
/// against articles already kept.
#[derive(Default)]
pub struct DedupState {
    seen_urls: HashSet<String>,
    seen_titles: HashSet<String>,
}

impl DedupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `article`'s URL/title fingerprints if not already present,
    /// returning whether it was new. Exposed for callers (the aggregator)
    /// that need a final merge-time dedup pass across independently-filtered
    /// per-publisher results.
    pub fn accept(&mut self, article: &Article) -> bool {
        let url_key = article.normalized_url();
        let title_key = article.normalized_title();
        if self.seen_urls.contains(&url_key) || self.seen_titles.contains(&title_key) {
            return false;
        }
        self.seen_urls.insert(url_key);
        self.seen_titles.insert(title_key);
        true
    }
}

impl Filter {
    pub fn new() -> Self {
        Self {
            topic_regex_cache: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    /// Applies topic/location/date filters and dedup to `articles`, returning
    /// only survivors. `dedup` is threaded through by the caller so state
    /// persists across tiers/sources within one aggregation run.
    pub fn apply(&self, articles: Vec<Article>, params: &FilterParams, dedup: &mut DedupState) -> Vec<Article> {
        let cutoff = params.last_n_days.map(|days| Utc::now() - chrono::Duration::days(days as i64));

        articles
            .into_iter()
            .filter(|a| self.passes_topic(a, params.topic))
            .filter(|a| self.passes_location(a, params.location))
            .filter(|a| passes_date(a, cutoff))
            .filter(|a| dedup.accept(a))
            .collect()
    }

    fn passes_topic(&self, article: &Article, topic: Option<&str>) -> bool {
        let Some(topic) = topic else { return true };
        if topic.eq_ignore_ascii_case(GENERAL_TOPIC) {
            return true;
        }

        let text = article.searchable_text();

        if EXCLUDE_KEYWORDS.iter().any(|kw| self.word_matches(&text, kw)) {
            return false;
        }

        let Some(keywords) = topics::expand(topic) else {
            // Unknown topic: fall back to a direct word-boundary match on the
            // topic string itself rather than rejecting everything.
            return self.word_matches(&text, topic);
        };

        keywords.iter().any(|kw| self.word_matches(&text, kw))
    }

    fn passes_location(&self, article: &Article, location: Option<&str>) -> bool {
        let Some(location) = location else { return true };

        if location.eq_ignore_ascii_case("india") && is_indian_publisher(&article.source_domain) {
            return true;
        }

        self.word_matches(&article.searchable_text(), location)
    }

    fn word_matches(&self, text: &str, keyword: &str) -> bool {
        let mut cache = self.topic_regex_cache.lock().unwrap();
        let regex = cache.entry(keyword.to_string()).or_insert_with(|| {
            let escaped = regex::escape(&keyword.to_lowercase());
            Regex::new(&format!(r"\b{escaped}\b")).expect("keyword regex must compile")
        });
        regex.is_match(text)
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

fn passes_date(article: &Article, cutoff: Option<DateTime<Utc>>) -> bool {
    let Some(cutoff) = cutoff else { return true };
    let Some(published_at) = &article.published_at else {
        // Articles with no known date are never dropped by the date filter —
        // only an explicit too-old date excludes an article.
        return true;
    };
    match DateTime::parse_from_rfc3339(published_at) {
        Ok(dt) => dt.with_timezone(&Utc) >= cutoff,
        Err(_) => true,
    }
}

fn is_indian_publisher(domain: &str) -> bool {
    let domain = domain.to_lowercase();
    domain.ends_with(".in") || INDIAN_PUBLISHER_DOMAINS.iter().any(|d| domain == *d || domain.ends_with(&format!(".{d}")))
}

/// Sorts by `published_at` descending (articles with no date sort last,
/// stable relative to each other) and truncates to `count`.
pub fn rank_and_cap(mut articles: Vec<Article>, count: usize) -> Vec<Article> {
    articles.sort_by(|a, b| match (&a.published_at, &b.published_at) {
        (Some(a_date), Some(b_date)) => b_date.cmp(a_date),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    articles.truncate(count);
    articles
}
