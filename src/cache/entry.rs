//! Cache entry types and per-set options.
//!
//! An entry is the unit of accounting, expiry and eviction. Its payload is
//! either the caller's value, a compressed encoding of it, or a placeholder
//! materialized by the warming engine.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Bounds every cached value type must satisfy.
///
/// Values are serialized to estimate their footprint and to feed the
/// compression adapter.
pub trait CacheValue: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Caller-supplied classification, used only for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    #[default]
    Generic,
    /// Result of a model inference call.
    Inference,
    /// Derived report or aggregate.
    Report,
    /// Query result.
    Query,
    /// Materialized by the warming engine without a real value.
    Placeholder,
    Custom(String),
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::Generic => write!(f, "generic"),
            EntryType::Inference => write!(f, "inference"),
            EntryType::Report => write!(f, "report"),
            EntryType::Query => write!(f, "query"),
            EntryType::Placeholder => write!(f, "placeholder"),
            EntryType::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// What an entry currently holds.
#[derive(Debug, Clone)]
pub enum Payload<V> {
    /// The caller's value as given.
    Raw(V),
    /// Compressed serialized form of the value.
    Compressed(Bytes),
    /// No value yet; reserved by predictive warming.
    Placeholder,
}

/// Where an entry sits relative to its TTL at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Age within TTL.
    Fresh,
    /// Past TTL but within the stale-while-revalidate window.
    Stale,
    /// Past TTL plus the stale window.
    Expired,
}

/// A single cached entry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Unique key.
    pub key: String,

    /// Stored payload.
    pub payload: Payload<V>,

    /// Creation timestamp.
    pub created_at: Instant,

    /// Timestamp of last fresh read (or creation).
    pub last_accessed_at: Instant,

    /// Time after creation at which the entry is logically expired.
    pub ttl: Duration,

    /// Number of fresh reads served.
    pub access_count: u64,

    /// Reporting tag.
    pub entry_type: EntryType,

    /// Accounted footprint in bytes (in current form).
    pub size_bytes: usize,

    /// Footprint before compression.
    pub original_size: usize,

    /// Informational priority hint (higher = more valuable).
    pub priority: i32,

    /// Keys removed whenever this entry is deleted.
    pub dependencies: HashSet<String>,

    /// Insertion order stamp, assigned by the store.
    pub sequence: u64,
}

impl<V> CacheEntry<V> {
    /// Create an entry holding a raw value.
    pub fn new(key: impl Into<String>, value: V, ttl: Duration, size_bytes: usize, now: Instant) -> Self {
        Self::with_payload(key, Payload::Raw(value), ttl, size_bytes, now)
    }

    /// Create a value-less placeholder entry.
    pub fn placeholder(key: impl Into<String>, ttl: Duration, now: Instant) -> Self {
        let mut entry = Self::with_payload(key, Payload::Placeholder, ttl, 0, now);
        entry.entry_type = EntryType::Placeholder;
        entry.priority = -1;
        entry
    }

    pub fn with_payload(
        key: impl Into<String>,
        payload: Payload<V>,
        ttl: Duration,
        size_bytes: usize,
        now: Instant,
    ) -> Self {
        Self {
            key: key.into(),
            payload,
            created_at: now,
            last_accessed_at: now,
            ttl,
            access_count: 0,
            entry_type: EntryType::Generic,
            size_bytes,
            original_size: size_bytes,
            priority: 0,
            dependencies: HashSet::new(),
            sequence: 0,
        }
    }

    /// Age of the entry at `now`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// Classify the entry against its TTL and the stale window.
    pub fn freshness(&self, now: Instant, stale_window: Duration) -> Freshness {
        let age = self.age(now);
        if age <= self.ttl {
            Freshness::Fresh
        } else if age <= self.ttl.saturating_add(stale_window) {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }

    /// Whether the entry is past its hard-expiry deadline.
    pub fn is_hard_expired(&self, now: Instant, stale_window: Duration) -> bool {
        self.freshness(now, stale_window) == Freshness::Expired
    }

    /// Record a fresh read.
    pub fn touch(&mut self, now: Instant) {
        self.last_accessed_at = now;
        self.access_count += 1;
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.payload, Payload::Compressed(_))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.payload, Payload::Placeholder)
    }

    /// Reporting view of the entry, without its payload.
    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            key: self.key.clone(),
            size_bytes: self.size_bytes,
            entry_type: self.entry_type.clone(),
            access_count: self.access_count,
        }
    }
}

/// Payload-free description of an entry, handed to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub key: String,
    pub size_bytes: usize,
    pub entry_type: EntryType,
    pub access_count: u64,
}

/// A successful read.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit<V> {
    pub value: V,
    /// True when served from the stale-while-revalidate window.
    pub stale: bool,
}

/// Per-set options. `Default` uses the configured TTL and estimates size.
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// Overrides the configured default TTL.
    pub ttl: Option<Duration>,

    pub entry_type: EntryType,

    pub priority: i32,

    /// Caller-supplied footprint; otherwise the serialized length is used.
    pub size_bytes: Option<usize>,

    /// Keys to invalidate when this entry is deleted.
    pub dependencies: Vec<String>,

    /// Store the value uncompressed regardless of configuration.
    pub no_compress: bool,
}

impl SetOptions {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = entry_type;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_size(mut self, size_bytes: usize) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn with_dependencies<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn uncompressed(mut self) -> Self {
        self.no_compress = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_boundaries() {
        let now = Instant::now();
        let entry = CacheEntry::new("k", 1u32, Duration::from_millis(100), 1, now);
        let stale = Duration::from_millis(50);

        assert_eq!(entry.freshness(now, stale), Freshness::Fresh);
        assert_eq!(entry.freshness(now + Duration::from_millis(100), stale), Freshness::Fresh);
        assert_eq!(entry.freshness(now + Duration::from_millis(120), stale), Freshness::Stale);
        assert_eq!(entry.freshness(now + Duration::from_millis(150), stale), Freshness::Stale);
        assert_eq!(entry.freshness(now + Duration::from_millis(151), stale), Freshness::Expired);
    }

    #[test]
    fn test_zero_stale_window_expires_right_after_ttl() {
        let now = Instant::now();
        let entry = CacheEntry::new("k", 1u32, Duration::from_millis(10), 1, now);
        assert!(entry.is_hard_expired(now + Duration::from_millis(11), Duration::ZERO));
    }

    #[test]
    fn test_touch_updates_counters() {
        let now = Instant::now();
        let mut entry = CacheEntry::new("k", "v".to_string(), Duration::from_secs(1), 3, now);
        let later = now + Duration::from_millis(5);
        entry.touch(later);
        assert_eq!(entry.access_count, 1);
        assert_eq!(entry.last_accessed_at, later);
    }

    #[test]
    fn test_placeholder_is_low_priority() {
        let entry: CacheEntry<u8> = CacheEntry::placeholder("p", Duration::from_secs(1), Instant::now());
        assert!(entry.is_placeholder());
        assert_eq!(entry.entry_type, EntryType::Placeholder);
        assert!(entry.priority < 0);
        assert_eq!(entry.size_bytes, 0);
    }

    #[test]
    fn test_set_options_builder() {
        let opts = SetOptions::default()
            .with_ttl(Duration::from_secs(5))
            .with_dependencies(["a", "b"])
            .uncompressed();
        assert_eq!(opts.ttl, Some(Duration::from_secs(5)));
        assert_eq!(opts.dependencies, vec!["a".to_string(), "b".to_string()]);
        assert!(opts.no_compress);
    }
}
