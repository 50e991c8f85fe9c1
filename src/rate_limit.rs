//! Per-key sliding-window admission control (C2).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct RateLimiter {
    count: u32,
    window: Duration,
    records: Mutex<HashMap<String, Vec<Instant>>>,
}

pub struct Decision {
    pub allowed: bool,
    /// Seconds until the oldest surviving timestamp ages out, if denied.
    pub retry_after_secs: u64,
}

impl RateLimiter {
    pub fn new(count: u32, window: Duration) -> Self {
        Self {
            count,
            window,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Checks and, if allowed, records `now` against `key` in one atomic
    /// step — the window is swept of stale timestamps first.
    pub fn is_allowed(&self, key: &str) -> Decision {
        let now = Instant::now();
        let mut records = self.records.lock().unwrap();
        let timestamps = records.entry(key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() as u32 >= self.count {
            let oldest = timestamps[0];
            let age = now.duration_since(oldest);
            let retry_after = self.window.saturating_sub(age);
            return Decision {
                allowed: false,
                retry_after_secs: retry_after.as_secs().max(1),
            };
        }

        timestamps.push(now);
        Decision {
            allowed: true,
            retry_after_secs: 0,
        }
    }
}
