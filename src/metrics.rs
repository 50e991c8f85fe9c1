//! Counters and duration histograms with percentile reporting (C4).
//!
//! Thread-safe via a single mutex per map, matching the synchronization
//! level the rest of the shared state uses at the expected load (≤100 QPS).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Histogram samples beyond this count are dropped (oldest first), bounding
/// memory under sustained load.
const MAX_SAMPLES_PER_HISTOGRAM: usize = 1000;

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct HistogramStats {
    pub count: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

pub struct Metrics {
    counters: Mutex<HashMap<String, u64>>,
    histograms: Mutex<HashMap<String, Vec<f64>>>,
    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            histograms: Mutex::new(HashMap::new()),
            started_at: Instant::now(),
        }
    }

    pub fn incr(&self, name: &str) {
        *self.counters.lock().unwrap().entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn record_duration(&self, name: &str, duration: Duration) {
        let mut histograms = self.histograms.lock().unwrap();
        let samples = histograms.entry(name.to_string()).or_default();
        samples.push(duration.as_secs_f64() * 1000.0);
        if samples.len() > MAX_SAMPLES_PER_HISTOGRAM {
            samples.remove(0);
        }
    }

    pub fn counters_snapshot(&self) -> HashMap<String, u64> {
        self.counters.lock().unwrap().clone()
    }

    pub fn histogram_stats(&self, name: &str) -> Option<HistogramStats> {
        let histograms = self.histograms.lock().unwrap();
        let samples = histograms.get(name)?;
        if samples.is_empty() {
            return None;
        }
        Some(compute_stats(samples))
    }

    pub fn all_histogram_names(&self) -> Vec<String> {
        self.histograms.lock().unwrap().keys().cloned().collect()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// `p99` uses the sample max when the sample count is below 100 — too few
/// samples for the 99th percentile to be a meaningful distinct value.
fn compute_stats(samples: &[f64]) -> HistogramStats {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let count = sorted.len();
    let min_ms = sorted[0];
    let max_ms = sorted[count - 1];
    let mean_ms = sorted.iter().sum::<f64>() / count as f64;

    let percentile = |p: f64| -> f64 {
        let idx = ((count as f64 - 1.0) * p).round() as usize;
        sorted[idx.min(count - 1)]
    };

    HistogramStats {
        count,
        min_ms,
        max_ms,
        mean_ms,
        p50_ms: percentile(0.50),
        p95_ms: percentile(0.95),
        p99_ms: if count < 100 { max_ms } else { percentile(0.99) },
    }
}
