//! Eviction policy tests, at the engine level and through the cache.

use std::time::Duration;

use intelligent_cache::cache::entry::CacheEntry;
use intelligent_cache::cache::evictor::{EvictionReason, Evictor};
use intelligent_cache::cache::store::{EntryStore, SpaceRequest};
use intelligent_cache::config::{Config, EvictionConfig};
use intelligent_cache::{EvictionPolicy, IntelligentCache, SetOptions};
use tokio::time::Instant;

fn quiet_config(policy: EvictionPolicy, max_entries: usize) -> Config {
    let mut config = Config::default();
    config.maintenance.cleanup_enabled = false;
    config.maintenance.metrics_enabled = false;
    config.warming.enabled = false;
    config.eviction.policy = policy;
    config.capacity.max_entries = max_entries;
    config
}

fn store_with(entries: &[(&str, usize, u64)], now: Instant) -> EntryStore<u32> {
    let mut store = EntryStore::new();
    for &(key, size, access_count) in entries {
        let mut entry = CacheEntry::new(key, 0, Duration::from_secs(60), size, now);
        entry.access_count = access_count;
        store.insert(entry);
    }
    store
}

#[tokio::test(start_paused = true)]
async fn test_fifo_evicts_first_inserted() {
    let cache: IntelligentCache<u32> = IntelligentCache::new(quiet_config(EvictionPolicy::Fifo, 2)).unwrap();

    cache.set("a", 1, SetOptions::default()).await.unwrap();
    cache.set("b", 2, SetOptions::default()).await.unwrap();
    cache.set("c", 3, SetOptions::default()).await.unwrap();

    assert!(cache.get("a").await.is_none());
    assert_eq!(cache.get("b").await.unwrap().value, 2);
    assert_eq!(cache.get("c").await.unwrap().value, 3);
    assert_eq!(cache.stats().await.evictions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_lru_evicts_least_recently_used() {
    let cache: IntelligentCache<u32> = IntelligentCache::new(quiet_config(EvictionPolicy::Lru, 2)).unwrap();

    cache.set("a", 1, SetOptions::default()).await.unwrap();
    cache.set("b", 2, SetOptions::default()).await.unwrap();
    tokio::time::advance(Duration::from_secs(1)).await;
    cache.get("a").await.unwrap();
    cache.set("c", 3, SetOptions::default()).await.unwrap();

    assert!(cache.contains("a").await);
    assert!(!cache.contains("b").await);
    assert!(cache.contains("c").await);
}

#[tokio::test(start_paused = true)]
async fn test_lfu_evicts_least_frequently_used() {
    let cache: IntelligentCache<u32> = IntelligentCache::new(quiet_config(EvictionPolicy::Lfu, 2)).unwrap();

    cache.set("a", 1, SetOptions::default()).await.unwrap();
    cache.set("b", 2, SetOptions::default()).await.unwrap();
    for _ in 0..3 {
        cache.get("b").await.unwrap();
    }
    cache.get("a").await.unwrap();
    cache.set("c", 3, SetOptions::default()).await.unwrap();

    assert!(!cache.contains("a").await);
    assert!(cache.contains("b").await);
}

#[tokio::test(start_paused = true)]
async fn test_hybrid_prefers_old_and_rarely_used() {
    let cache: IntelligentCache<u32> = IntelligentCache::new(quiet_config(EvictionPolicy::Hybrid, 2)).unwrap();

    cache.set("a", 1, SetOptions::default()).await.unwrap();
    cache.set("b", 2, SetOptions::default()).await.unwrap();
    tokio::time::advance(Duration::from_secs(10)).await;
    for _ in 0..3 {
        cache.get("b").await.unwrap();
    }
    cache.set("c", 3, SetOptions::default()).await.unwrap();

    assert!(!cache.contains("a").await);
    assert!(cache.contains("b").await);
    assert!(cache.contains("c").await);
}

#[tokio::test(start_paused = true)]
async fn test_expired_entries_go_before_policy_victims() {
    let mut config = quiet_config(EvictionPolicy::Lfu, 2);
    config.expiry.stale_while_revalidate_ms = 0;
    let cache: IntelligentCache<u32> = IntelligentCache::new(config).unwrap();

    cache
        .set("old", 1, SetOptions::default().with_ttl(Duration::from_millis(10)))
        .await
        .unwrap();
    cache.set("hot", 2, SetOptions::default()).await.unwrap();
    // Under plain LFU "hot" (never read) would be the victim.
    for _ in 0..5 {
        cache.get("old").await.unwrap();
    }

    tokio::time::advance(Duration::from_millis(20)).await;
    cache.set("new", 3, SetOptions::default()).await.unwrap();

    assert!(!cache.contains("old").await);
    assert!(cache.contains("hot").await);
    assert!(cache.contains("new").await);

    let stats = cache.stats().await;
    assert_eq!(stats.expirations, 1);
    assert_eq!(stats.evictions, 0);
}

#[tokio::test(start_paused = true)]
async fn test_expired_first_under_every_policy() {
    for policy in [
        EvictionPolicy::Lru,
        EvictionPolicy::Lfu,
        EvictionPolicy::Fifo,
        EvictionPolicy::Hybrid,
    ] {
        let mut config = quiet_config(policy, 3);
        config.expiry.stale_while_revalidate_ms = 0;
        let cache: IntelligentCache<u32> = IntelligentCache::new(config).unwrap();

        cache.set("live1", 1, SetOptions::default()).await.unwrap();
        cache.set("live2", 2, SetOptions::default()).await.unwrap();
        cache
            .set("dying", 3, SetOptions::default().with_ttl(Duration::from_millis(5)))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_millis(10)).await;

        cache.set("fresh", 4, SetOptions::default()).await.unwrap();

        assert!(!cache.contains("dying").await, "policy {policy}");
        assert_eq!(cache.len().await, 3, "policy {policy}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_expired_set_short_of_deficit_falls_through_to_policy() {
    let mut config = quiet_config(EvictionPolicy::Fifo, 100);
    config.capacity.max_size_bytes = 100;
    config.expiry.stale_while_revalidate_ms = 0;
    let cache: IntelligentCache<u32> = IntelligentCache::new(config).unwrap();

    cache.set("a", 0, SetOptions::default().with_size(40)).await.unwrap();
    cache
        .set("b", 0, SetOptions::default().with_size(10).with_ttl(Duration::from_millis(5)))
        .await
        .unwrap();
    cache.set("c", 0, SetOptions::default().with_size(40)).await.unwrap();
    tokio::time::advance(Duration::from_millis(10)).await;

    // Needs 60 more bytes: dropping "b" frees 10, then FIFO takes "a" and "c".
    cache.set("d", 0, SetOptions::default().with_size(70)).await.unwrap();

    assert!(!cache.contains("a").await);
    assert!(!cache.contains("b").await);
    assert!(!cache.contains("c").await);
    assert!(cache.contains("d").await);

    let stats = cache.stats().await;
    assert!(stats.total_size_bytes <= 100);
    assert_eq!(stats.expirations, 1);
}

#[test]
fn test_select_honors_size_and_count_deficits() {
    let now = Instant::now();
    let store = store_with(&[("a", 10, 5), ("b", 50, 1), ("c", 30, 0), ("d", 5, 9)], now);
    let evictor = Evictor::new(EvictionConfig {
        policy: EvictionPolicy::Lfu,
        headroom_factor: 1.0,
    });
    assert_eq!(evictor.policy(), EvictionPolicy::Lfu);

    // Bytes alone: 30 needed, c(30) is lowest.
    let plan = evictor.select_entries_to_evict(
        store.entries(),
        &SpaceRequest {
            required_bytes: 30,
            required_entries: 0,
        },
        store.epoch(),
        now,
        Duration::ZERO,
    );
    assert_eq!(plan.reason, EvictionReason::Policy(EvictionPolicy::Lfu));
    assert_eq!(plan.keys(), vec!["c".to_string()]);

    // Count dominates: three entries even though one covers the bytes.
    let plan = evictor.select_entries_to_evict(
        store.entries(),
        &SpaceRequest {
            required_bytes: 1,
            required_entries: 3,
        },
        store.epoch(),
        now,
        Duration::ZERO,
    );
    assert_eq!(plan.keys(), vec!["c".to_string(), "b".to_string(), "a".to_string()]);
    assert_eq!(plan.freed_bytes(), 90);
}

#[test]
fn test_select_on_satisfied_request_is_empty() {
    let now = Instant::now();
    let store = store_with(&[("a", 10, 0)], now);
    let evictor = Evictor::new(EvictionConfig::default());

    let plan = evictor.select_entries_to_evict(
        store.entries(),
        &SpaceRequest {
            required_bytes: 0,
            required_entries: 0,
        },
        store.epoch(),
        now,
        Duration::ZERO,
    );
    assert!(plan.victims.is_empty());
}
