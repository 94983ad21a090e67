//! In-process intelligent cache.
//!
//! This module contains the core cache data structures and algorithms:
//! - [`entry`]: CacheEntry, payload forms, per-set options
//! - [`store`]: Entry store with capacity accounting and cascading delete
//! - [`evictor`]: Eviction policy engine (expired-first, then LRU/LFU/FIFO/Hybrid)
//! - [`tracker`]: Per-key access patterns and the recent-access ring
//! - [`warming`]: Frequency and sequence prediction for proactive warming
//! - [`compressor`]: Pluggable compression for large values
//! - [`hooks`]: Observer callbacks around every operation
//! - [`scheduler`]: Periodic maintenance tasks
//! - [`manager`]: `IntelligentCache`, the facade tying it all together

pub mod compressor;
pub mod entry;
pub mod error;
pub mod evictor;
pub mod hooks;
pub mod manager;
pub mod scheduler;
pub mod stats;
pub mod store;
pub mod tracker;
pub mod warming;

pub use entry::{CacheHit, CacheValue, EntryType, SetOptions};
pub use error::CacheError;
pub use hooks::{CacheObserver, GetOutcome, TracingObserver};
pub use manager::{CacheBuilder, IntelligentCache};
pub use stats::CacheStats;
pub use warming::{Warmer, WarmingReport};
