//! Bounded LRU + TTL memo of prediction results.
//!
//! Keys are (configuration key, quantized parameter vector, fidelity). The
//! map sits behind a single `parking_lot::Mutex`; two threads missing on the
//! same key may both compute, and the later insert wins.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use crate::fidelity::PredictionResult;
use crate::types::{FidelityLevel, OperatingParameters, ParameterKind};

/// Marker for an absent optional parameter
const ABSENT: i64 = i64::MIN;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    config: String,
    params: Vec<i64>,
    fidelity: FidelityLevel,
}

impl CacheKey {
    /// Parameters are rounded to `decimals` places so float noise below that
    /// precision maps to the same entry.
    pub fn new(config: &str, params: &OperatingParameters, fidelity: FidelityLevel, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        let params = ParameterKind::ALL
            .iter()
            .map(|k| match params.get(*k) {
                Some(v) => (v * scale).round() as i64,
                None => ABSENT,
            })
            .collect();
        Self {
            config: config.to_string(),
            params,
            fidelity,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: PredictionResult,
    inserted: Instant,
    tick: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<CacheKey, Entry>,
    // recency tick → key, oldest first
    recency: BTreeMap<u64, CacheKey>,
    tick: u64,
    stats: CacheStats,
}

impl Inner {
    fn touch(&mut self, key: &CacheKey) {
        self.tick += 1;
        let tick = self.tick;
        if let Some(entry) = self.entries.get_mut(key) {
            self.recency.remove(&entry.tick);
            entry.tick = tick;
            self.recency.insert(tick, key.clone());
        }
    }

    fn remove(&mut self, key: &CacheKey) {
        if let Some(entry) = self.entries.remove(key) {
            self.recency.remove(&entry.tick);
        }
    }
}

#[derive(Debug)]
pub struct PredictionCache {
    inner: Mutex<Inner>,
    capacity: usize,
    ttl: Duration,
}

impl PredictionCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<PredictionResult> {
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(key) {
            None => {
                inner.stats.misses += 1;
                return None;
            }
            Some(entry) => entry.inserted.elapsed() > self.ttl,
        };
        if expired {
            inner.remove(key);
            inner.stats.expirations += 1;
            inner.stats.misses += 1;
            return None;
        }
        inner.touch(key);
        inner.stats.hits += 1;
        inner.entries.get(key).map(|e| e.value.clone())
    }

    pub fn insert(&self, key: CacheKey, value: PredictionResult) {
        let mut inner = self.inner.lock();
        inner.remove(&key);
        while inner.entries.len() >= self.capacity {
            let oldest = match inner.recency.iter().next() {
                Some((_, k)) => k.clone(),
                None => break,
            };
            inner.remove(&oldest);
            inner.stats.evictions += 1;
        }
        inner.tick += 1;
        let tick = inner.tick;
        inner.recency.insert(tick, key.clone());
        inner.entries.insert(
            key,
            Entry {
                value,
                inserted: Instant::now(),
                tick,
            },
        );
    }

    /// Drops every entry computed for `config`. Returns how many went.
    pub fn invalidate(&self, config: &str) -> usize {
        let mut inner = self.inner.lock();
        let stale: Vec<CacheKey> = inner.entries.keys().filter(|k| k.config == config).cloned().collect();
        for key in &stale {
            inner.remove(key);
        }
        stale.len()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.recency.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.entries.len(),
            ..inner.stats
        }
    }
}
