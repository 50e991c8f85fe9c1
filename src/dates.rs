//! Date parser (C5): tries an ordered list of format patterns, then a
//! permissive ISO fallback, always normalizing to UTC. Memoized because
//! feed parsing calls this for every entry in every feed.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDateTime, Utc};

const MEMO_CAPACITY: usize = 1000;

/// Offset-aware formats are tried first via `DateTime::parse_from_str`;
/// naive formats assume UTC when the source lacks timezone info. Order
/// matters: earlier entries are tried first, so put the more common/
/// specific formats ahead of generic catch-alls. This list is load-bearing
/// for real-world feeds — preserve all entries, do not prune.
const OFFSET_AWARE_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",     // RFC 2822
    "%a, %d %b %Y %H:%M %z",        // RFC 2822, no seconds
    "%Y-%m-%dT%H:%M:%S%z",          // ISO 8601 with offset
    "%Y-%m-%dT%H:%M:%S%.f%z",       // ISO 8601 with fractional seconds and offset
];

const NAIVE_UTC_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%SZ",           // ISO 8601 Zulu
    "%Y-%m-%dT%H:%M:%S%.fZ",        // ISO 8601 Zulu with fractional seconds
    "%Y-%m-%d %H:%M:%S",            // common SQL-ish datetime
    "%Y-%m-%d",                     // date only
    "%Y/%m/%d",                     // slash-separated date
    "%Y.%m.%d",                     // dot-separated date
    "%m/%d/%Y %H:%M:%S",            // US datetime
    "%m/%d/%Y",                     // US date
    "%d/%m/%Y",                     // day-first date
    "%d-%m-%Y",                     // day-first with dashes
    "%B %d, %Y",                    // long-form English, e.g. "January 2, 2024"
    "%b %d, %Y",                    // abbreviated month, e.g. "Jan 2, 2024"
    "%d %B %Y",                     // day-first long-form, e.g. "2 January 2024"
    "%d %b %Y",                     // day-first abbreviated, e.g. "2 Jan 2024"
    "%A, %B %d, %Y",                // full weekday + long-form
    "%a %b %d %H:%M:%S %Y",         // Unix `date`/ctime style
    "%a, %d %b %Y %H:%M:%S GMT",    // HTTP-date with literal GMT
];

pub struct DateParser {
    memo: Mutex<HashMap<String, (Option<String>, usize)>>,
    next_seq: Mutex<usize>,
}

impl DateParser {
    pub fn new() -> Self {
        Self {
            memo: Mutex::new(HashMap::new()),
            next_seq: Mutex::new(0),
        }
    }

    /// Parses `raw` into an ISO-8601 UTC string, or `None` if no format
    /// matched. Memoized on the exact input string.
    pub fn parse(&self, raw: &str) -> Option<String> {
        {
            let memo = self.memo.lock().unwrap();
            if let Some((cached, _)) = memo.get(raw) {
                return cached.clone();
            }
        }

        let parsed = parse_uncached(raw);
        self.memoize(raw, parsed.clone());
        parsed
    }

    fn memoize(&self, raw: &str, value: Option<String>) {
        let mut memo = self.memo.lock().unwrap();
        let mut seq = self.next_seq.lock().unwrap();
        if memo.len() >= MEMO_CAPACITY && !memo.contains_key(raw) {
            if let Some(oldest_key) = memo
                .iter()
                .min_by_key(|(_, (_, s))| *s)
                .map(|(k, _)| k.clone())
            {
                memo.remove(&oldest_key);
            }
        }
        memo.insert(raw.to_string(), (value, *seq));
        *seq += 1;
    }
}

impl Default for DateParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_uncached(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    for fmt in OFFSET_AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.with_timezone(&Utc).to_rfc3339());
        }
    }

    for fmt in NAIVE_UTC_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).to_rfc3339());
        }
        if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, fmt) {
            let naive = date.and_hms_opt(0, 0, 0).unwrap();
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).to_rfc3339());
        }
    }

    // Permissive ISO fallback: accepts RFC 3339 variants the fixed formats missed.
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc).to_rfc3339());
    }

    None
}
