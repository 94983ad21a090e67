//! Point-in-time cache statistics.

use serde::Serialize;
use tokio::time::Instant;

use crate::cache::store::EntryStore;

/// Operation counters, kept under the cache lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    pub hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub expirations: u64,
}

/// Snapshot returned by `IntelligentCache::stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_size_bytes: usize,
    pub max_size_bytes: usize,
    pub hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub deletes: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub average_access_count: f64,
    pub oldest_entry_age_secs: Option<f64>,
    pub newest_entry_age_secs: Option<f64>,
    pub evictions: u64,
    pub expirations: u64,
    pub errors: u64,
    pub compressed_entries: usize,
    /// Original bytes over stored bytes for compressed entries (1.0 if none).
    pub compression_ratio: f64,
    pub predicted_absent_keys: usize,
    /// Successful operations over all operations, scaled to 0-100.
    pub performance_score: f64,
}

impl CacheStats {
    pub(crate) fn compute<V>(
        store: &EntryStore<V>,
        counters: &Counters,
        errors: u64,
        max_size_bytes: usize,
        predicted_absent_keys: usize,
        now: Instant,
    ) -> Self {
        let reads = counters.hits + counters.stale_hits + counters.misses;
        let served = counters.hits + counters.stale_hits;
        let (hit_rate, miss_rate) = if reads == 0 {
            (0.0, 0.0)
        } else {
            (served as f64 / reads as f64, counters.misses as f64 / reads as f64)
        };

        let entry_count = store.len();
        let mut total_accesses = 0u64;
        let mut oldest: Option<Instant> = None;
        let mut newest: Option<Instant> = None;
        let mut compressed_entries = 0usize;
        let mut compressed_original = 0usize;
        let mut compressed_stored = 0usize;

        for entry in store.entries() {
            total_accesses += entry.access_count;
            oldest = Some(oldest.map_or(entry.created_at, |t| t.min(entry.created_at)));
            newest = Some(newest.map_or(entry.created_at, |t| t.max(entry.created_at)));
            if entry.is_compressed() {
                compressed_entries += 1;
                compressed_original += entry.original_size;
                compressed_stored += entry.size_bytes;
            }
        }

        let average_access_count = if entry_count == 0 {
            0.0
        } else {
            total_accesses as f64 / entry_count as f64
        };

        let compression_ratio = if compressed_stored == 0 {
            1.0
        } else {
            compressed_original as f64 / compressed_stored as f64
        };

        let successful = served + counters.writes + counters.deletes;
        let total = successful + counters.misses + errors;
        let performance_score = if total == 0 {
            100.0
        } else {
            successful as f64 / total as f64 * 100.0
        };

        Self {
            entry_count,
            total_size_bytes: store.total_size(),
            max_size_bytes,
            hits: counters.hits,
            stale_hits: counters.stale_hits,
            misses: counters.misses,
            writes: counters.writes,
            deletes: counters.deletes,
            hit_rate,
            miss_rate,
            average_access_count,
            oldest_entry_age_secs: oldest.map(|t| now.saturating_duration_since(t).as_secs_f64()),
            newest_entry_age_secs: newest.map(|t| now.saturating_duration_since(t).as_secs_f64()),
            evictions: counters.evictions,
            expirations: counters.expirations,
            errors,
            compressed_entries,
            compression_ratio,
            predicted_absent_keys,
            performance_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::{CacheEntry, Payload};
    use bytes::Bytes;
    use std::time::Duration;

    #[test]
    fn test_empty_stats() {
        let store: EntryStore<u32> = EntryStore::new();
        let stats = CacheStats::compute(&store, &Counters::default(), 0, 100, 0, Instant::now());
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.compression_ratio, 1.0);
        assert_eq!(stats.performance_score, 100.0);
        assert!(stats.oldest_entry_age_secs.is_none());
    }

    #[test]
    fn test_rates_ratio_and_score() {
        let now = Instant::now();
        let mut store: EntryStore<u32> = EntryStore::new();
        let mut compressed = CacheEntry::with_payload(
            "c",
            Payload::Compressed(Bytes::from_static(b"xx")),
            Duration::from_secs(60),
            25,
            now,
        );
        compressed.original_size = 100;
        store.insert(compressed);
        let mut raw = CacheEntry::new("r", 1, Duration::from_secs(60), 10, now);
        raw.access_count = 4;
        store.insert(raw);

        let counters = Counters {
            hits: 3,
            stale_hits: 1,
            misses: 4,
            writes: 2,
            ..Default::default()
        };
        let stats = CacheStats::compute(&store, &counters, 0, 1_000, 2, now);

        assert_eq!(stats.hit_rate, 0.5);
        assert_eq!(stats.miss_rate, 0.5);
        assert_eq!(stats.average_access_count, 2.0);
        assert_eq!(stats.compressed_entries, 1);
        assert_eq!(stats.compression_ratio, 4.0);
        assert_eq!(stats.predicted_absent_keys, 2);
        // successful = 4 served + 2 writes; total = 6 + 4 misses.
        assert_eq!(stats.performance_score, 60.0);
    }
}
