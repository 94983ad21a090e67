//! Eviction policy: decides which entries to remove when space is short.
//!
//! Expired entries are always reclaimed first. Only when none exist are live
//! entries ranked by the configured policy, each producing a retention score
//! where lower means "evict sooner":
//! - LRU: seconds since the store epoch at last access
//! - LFU: access count
//! - FIFO: seconds since the store epoch at creation
//! - Hybrid: `(access_count + 1) / (idle_secs + 1)`

use std::cmp::Ordering;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::entry::CacheEntry;
use crate::cache::store::SpaceRequest;
use crate::config::{EvictionConfig, EvictionPolicy};

/// An eviction candidate with its computed retention score.
#[derive(Debug, Clone)]
pub struct EvictionCandidate {
    pub key: String,
    pub size_bytes: usize,
    pub score: f64,
    sequence: u64,
}

impl PartialEq for EvictionCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EvictionCandidate {}

impl PartialOrd for EvictionCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Lower score sorts first; insertion order breaks ties.
impl Ord for EvictionCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// Why a batch of entries was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// Past hard expiry; chosen regardless of policy.
    Expired,
    /// Ranked by the configured policy.
    Policy(EvictionPolicy),
}

/// The selected batch.
#[derive(Debug, Clone)]
pub struct EvictionPlan {
    pub reason: EvictionReason,
    pub victims: Vec<EvictionCandidate>,
}

impl EvictionPlan {
    pub fn freed_bytes(&self) -> usize {
        self.victims.iter().map(|v| v.size_bytes).sum()
    }

    pub fn keys(&self) -> Vec<String> {
        self.victims.iter().map(|v| v.key.clone()).collect()
    }
}

/// The eviction policy engine.
#[derive(Debug, Clone)]
pub struct Evictor {
    config: EvictionConfig,
}

impl Evictor {
    pub fn new(config: EvictionConfig) -> Self {
        Self { config }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.config.policy
    }

    /// Retention score of a live entry under the configured policy.
    pub fn compute_score<V>(&self, entry: &CacheEntry<V>, epoch: Instant, now: Instant) -> f64 {
        match self.config.policy {
            EvictionPolicy::Lru => entry.last_accessed_at.saturating_duration_since(epoch).as_secs_f64(),
            EvictionPolicy::Lfu => entry.access_count as f64,
            EvictionPolicy::Fifo => entry.created_at.saturating_duration_since(epoch).as_secs_f64(),
            EvictionPolicy::Hybrid => {
                let idle_secs = now.saturating_duration_since(entry.last_accessed_at).as_secs_f64();
                (entry.access_count as f64 + 1.0) / (idle_secs + 1.0)
            }
        }
    }

    /// Select the entries to remove for `request`.
    ///
    /// If any entry is past hard expiry, the plan is exactly the expired set,
    /// even if it does not cover the deficit; callers re-check and ask again.
    /// Otherwise entries are ranked by policy and the shortest prefix freeing
    /// `required_bytes * headroom_factor` bytes and `required_entries` entries
    /// is returned.
    pub fn select_entries_to_evict<'a, V: 'a>(
        &self,
        entries: impl Iterator<Item = &'a CacheEntry<V>> + Clone,
        request: &SpaceRequest,
        epoch: Instant,
        now: Instant,
        stale_window: Duration,
    ) -> EvictionPlan {
        let expired: Vec<EvictionCandidate> = entries
            .clone()
            .filter(|entry| entry.is_hard_expired(now, stale_window))
            .map(|entry| EvictionCandidate {
                key: entry.key.clone(),
                size_bytes: entry.size_bytes,
                score: 0.0,
                sequence: entry.sequence,
            })
            .collect();

        if !expired.is_empty() {
            return EvictionPlan {
                reason: EvictionReason::Expired,
                victims: expired,
            };
        }

        let mut ranked: Vec<EvictionCandidate> = entries
            .map(|entry| EvictionCandidate {
                key: entry.key.clone(),
                size_bytes: entry.size_bytes,
                score: self.compute_score(entry, epoch, now),
                sequence: entry.sequence,
            })
            .collect();
        ranked.sort();

        let target_bytes = (request.required_bytes as f64 * self.config.headroom_factor).ceil() as usize;
        let mut freed = 0usize;
        let mut victims = Vec::new();

        for candidate in ranked {
            if freed >= target_bytes && victims.len() >= request.required_entries {
                break;
            }
            freed += candidate.size_bytes;
            victims.push(candidate);
        }

        EvictionPlan {
            reason: EvictionReason::Policy(self.config.policy),
            victims,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evictor(policy: EvictionPolicy) -> Evictor {
        Evictor::new(EvictionConfig {
            policy,
            ..Default::default()
        })
    }

    fn make_entry(key: &str, size: usize, created: Instant, seq: u64) -> CacheEntry<u32> {
        let mut e = CacheEntry::new(key, 0, Duration::from_secs(60), size, created);
        e.sequence = seq;
        e
    }

    #[test]
    fn test_headroom_margin_overshoots_deficit() {
        let epoch = Instant::now();
        let entries: Vec<_> = (0..5)
            .map(|i| make_entry(&format!("k{i}"), 100, epoch + Duration::from_secs(i), i))
            .collect();

        // Deficit 100 → target 110 → two 100-byte entries.
        let request = SpaceRequest {
            required_bytes: 100,
            required_entries: 0,
        };
        let plan = evictor(EvictionPolicy::Fifo).select_entries_to_evict(
            entries.iter(),
            &request,
            epoch,
            epoch + Duration::from_secs(10),
            Duration::ZERO,
        );
        assert_eq!(plan.reason, EvictionReason::Policy(EvictionPolicy::Fifo));
        assert_eq!(plan.keys(), vec!["k0", "k1"]);
        assert_eq!(plan.freed_bytes(), 200);
    }

    #[test]
    fn test_entry_count_deficit_only() {
        let epoch = Instant::now();
        let entries = vec![make_entry("a", 0, epoch, 0), make_entry("b", 0, epoch, 1)];
        let request = SpaceRequest {
            required_bytes: 0,
            required_entries: 1,
        };
        let plan = evictor(EvictionPolicy::Fifo).select_entries_to_evict(
            entries.iter(),
            &request,
            epoch,
            epoch,
            Duration::ZERO,
        );
        assert_eq!(plan.keys(), vec!["a"]);
    }

    #[test]
    fn test_expired_set_returned_exclusively() {
        let epoch = Instant::now();
        let mut stale = make_entry("old", 1, epoch, 0);
        stale.ttl = Duration::from_secs(1);
        let fresh = make_entry("new", 1_000, epoch, 1);
        let entries = vec![stale, fresh];

        let request = SpaceRequest {
            required_bytes: 500,
            required_entries: 0,
        };
        let plan = evictor(EvictionPolicy::Lru).select_entries_to_evict(
            entries.iter(),
            &request,
            epoch,
            epoch + Duration::from_secs(5),
            Duration::ZERO,
        );
        assert_eq!(plan.reason, EvictionReason::Expired);
        assert_eq!(plan.keys(), vec!["old"]);
    }

    #[test]
    fn test_lfu_prefers_low_access_count() {
        let epoch = Instant::now();
        let mut hot = make_entry("hot", 10, epoch, 0);
        hot.access_count = 50;
        let cold = make_entry("cold", 10, epoch, 1);
        let entries = vec![hot, cold];

        let request = SpaceRequest {
            required_bytes: 1,
            required_entries: 0,
        };
        let plan = evictor(EvictionPolicy::Lfu).select_entries_to_evict(
            entries.iter(),
            &request,
            epoch,
            epoch,
            Duration::ZERO,
        );
        assert_eq!(plan.keys(), vec!["cold"]);
    }

    #[test]
    fn test_hybrid_score_monotone() {
        let epoch = Instant::now();
        let now = epoch + Duration::from_secs(100);
        let ev = evictor(EvictionPolicy::Hybrid);

        let mut idle_rare = make_entry("a", 1, epoch, 0);
        idle_rare.last_accessed_at = epoch + Duration::from_secs(10);
        idle_rare.access_count = 1;

        let mut busy = make_entry("b", 1, epoch, 1);
        busy.last_accessed_at = epoch + Duration::from_secs(90);
        busy.access_count = 5;

        assert!(ev.compute_score(&idle_rare, epoch, now) < ev.compute_score(&busy, epoch, now));
    }
}
