//! intelligent-cache: an in-process cache for expensive computations.
//!
//! Combines TTL expiry with stale-while-revalidate serving, size-aware
//! eviction (LRU, LFU, FIFO, Hybrid), dependency-aware invalidation and
//! access-pattern-driven predictive warming behind one async handle.

pub mod cache;
pub mod config;
pub mod metrics;

pub use cache::{CacheError, CacheHit, CacheStats, IntelligentCache, SetOptions};
pub use config::{Config, ConfigUpdate, EvictionPolicy};
