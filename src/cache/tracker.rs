//! Access pattern tracking for the predictor.
//!
//! Keeps per-key hit/access counters and a bounded ring of the most recent
//! keys touched, in order.

use std::collections::{HashMap, VecDeque};

use tokio::time::Instant;

/// Per-key bookkeeping. `hits <= accesses` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPattern {
    pub hits: u64,
    pub accesses: u64,
    /// Sets observed for this key; a write signal separate from reads.
    pub writes: u64,
    pub last_accessed_at: Instant,
}

impl AccessPattern {
    fn new(now: Instant) -> Self {
        Self {
            hits: 0,
            accesses: 0,
            writes: 0,
            last_accessed_at: now,
        }
    }

    pub fn hit_ratio(&self) -> f64 {
        if self.accesses == 0 {
            return 0.0;
        }
        self.hits as f64 / self.accesses as f64
    }
}

#[derive(Debug)]
pub struct AccessTracker {
    patterns: HashMap<String, AccessPattern>,
    recent: VecDeque<String>,
    window: usize,
}

impl AccessTracker {
    pub fn new(window: usize) -> Self {
        Self {
            patterns: HashMap::new(),
            recent: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Record a read of `key`, hit or miss.
    pub fn record(&mut self, key: &str, hit: bool, now: Instant) {
        let pattern = self.pattern_mut(key, now);
        pattern.accesses += 1;
        if hit {
            pattern.hits += 1;
        }
        pattern.last_accessed_at = now;
        self.push_recent(key);
    }

    /// Record a set of `key`.
    pub fn record_write(&mut self, key: &str, now: Instant) {
        let pattern = self.pattern_mut(key, now);
        pattern.writes += 1;
        pattern.last_accessed_at = now;
        self.push_recent(key);
    }

    fn pattern_mut(&mut self, key: &str, now: Instant) -> &mut AccessPattern {
        self.patterns
            .entry(key.to_string())
            .or_insert_with(|| AccessPattern::new(now))
    }

    fn push_recent(&mut self, key: &str) {
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(key.to_string());
    }

    /// Shrink or grow the ring, dropping the oldest keys if needed.
    pub fn set_window(&mut self, window: usize) {
        self.window = window;
        while self.recent.len() > window {
            self.recent.pop_front();
        }
    }

    pub fn pattern(&self, key: &str) -> Option<&AccessPattern> {
        self.patterns.get(key)
    }

    pub fn patterns(&self) -> impl Iterator<Item = (&String, &AccessPattern)> {
        self.patterns.iter()
    }

    /// Recent keys, oldest first.
    pub fn recent(&self) -> &VecDeque<String> {
        &self.recent
    }

    pub fn last_key(&self) -> Option<&str> {
        self.recent.back().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
        self.recent.clear();
    }

    pub fn tracked_keys(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_never_exceed_accesses() {
        let mut tracker = AccessTracker::new(10);
        let now = Instant::now();
        tracker.record("a", false, now);
        tracker.record("a", true, now);
        tracker.record("a", true, now);

        let p = tracker.pattern("a").unwrap();
        assert_eq!(p.accesses, 3);
        assert_eq!(p.hits, 2);
        assert!((p.hit_ratio() - 2.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_writes_do_not_count_as_reads() {
        let mut tracker = AccessTracker::new(10);
        tracker.record_write("a", Instant::now());
        let p = tracker.pattern("a").unwrap();
        assert_eq!(p.writes, 1);
        assert_eq!(p.accesses, 0);
        assert_eq!(tracker.last_key(), Some("a"));
    }

    #[test]
    fn test_ring_is_bounded() {
        let mut tracker = AccessTracker::new(3);
        let now = Instant::now();
        for key in ["a", "b", "c", "d"] {
            tracker.record(key, true, now);
        }
        let recent: Vec<&str> = tracker.recent().iter().map(String::as_str).collect();
        assert_eq!(recent, vec!["b", "c", "d"]);

        tracker.set_window(2);
        assert_eq!(tracker.recent().len(), 2);
        assert_eq!(tracker.recent().front().map(String::as_str), Some("c"));
    }
}
