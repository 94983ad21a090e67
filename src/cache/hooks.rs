//! Observer hooks around cache operations.
//!
//! Observers are registered on the builder and invoked best-effort: a failing
//! hook is reported through `on_error` and never aborts the operation that
//! triggered it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::cache::entry::EntrySummary;
use crate::cache::error::CacheError;
use crate::cache::evictor::EvictionReason;

/// How a read resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetOutcome {
    Hit,
    Stale,
    Miss,
    /// Found past hard expiry and removed.
    Expired,
    /// Found a warming placeholder with no value yet.
    Placeholder,
}

/// Lifecycle callbacks. Every method defaults to a no-op.
///
/// `before_evict` runs while the cache lock is held, between selecting the
/// batch and removing it; implementations must not call back into the cache
/// from it.
#[async_trait]
pub trait CacheObserver: Send + Sync {
    async fn before_get(&self, _key: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn after_get(&self, _key: &str, _outcome: GetOutcome) -> anyhow::Result<()> {
        Ok(())
    }

    async fn before_set(&self, _key: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Fires only once the entry is stored. A set rejected after `before_set`
    /// (oversized entry, shutdown) skips it; oversized rejections reach
    /// `on_error` instead.
    async fn after_set(&self, _key: &str, _size_bytes: usize) -> anyhow::Result<()> {
        Ok(())
    }

    async fn before_delete(&self, _key: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn after_delete(&self, _key: &str, _removed: &[String]) -> anyhow::Result<()> {
        Ok(())
    }

    async fn before_evict(&self, _reason: EvictionReason, _victims: &[EntrySummary]) -> anyhow::Result<()> {
        Ok(())
    }

    async fn after_evict(&self, _reason: EvictionReason, _victims: &[EntrySummary]) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_error(&self, _error: &CacheError) {}
}

/// Audit logger that writes every lifecycle event through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingObserver;

#[async_trait]
impl CacheObserver for TracingObserver {
    async fn after_get(&self, key: &str, outcome: GetOutcome) -> anyhow::Result<()> {
        debug!(key, ?outcome, "cache get");
        Ok(())
    }

    async fn after_set(&self, key: &str, size_bytes: usize) -> anyhow::Result<()> {
        debug!(key, size_bytes, "cache set");
        Ok(())
    }

    async fn after_delete(&self, key: &str, removed: &[String]) -> anyhow::Result<()> {
        debug!(key, removed = removed.len(), "cache delete");
        Ok(())
    }

    async fn after_evict(&self, reason: EvictionReason, victims: &[EntrySummary]) -> anyhow::Result<()> {
        let keys: Vec<&str> = victims.iter().map(|v| v.key.as_str()).collect();
        info!(?reason, count = victims.len(), ?keys, "cache eviction");
        Ok(())
    }

    async fn on_error(&self, error: &CacheError) {
        warn!(%error, "cache error");
    }
}

/// Fan-out over the registered observers.
#[derive(Default)]
pub(crate) struct Hooks {
    observers: Vec<Arc<dyn CacheObserver>>,
    errors: AtomicU64,
}

impl Hooks {
    pub fn new(observers: Vec<Arc<dyn CacheObserver>>) -> Self {
        Self {
            observers,
            errors: AtomicU64::new(0),
        }
    }

    /// Errors reported so far, from hooks, adapters and warming.
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn reset_error_count(&self) {
        self.errors.store(0, Ordering::Relaxed);
    }

    /// Route an error to every observer's `on_error`.
    pub async fn report(&self, error: CacheError) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        debug!(%error, "reporting cache error");
        for observer in &self.observers {
            observer.on_error(&error).await;
        }
    }

    async fn check(&self, hook: &'static str, result: anyhow::Result<()>) {
        if let Err(err) = result {
            self.report(CacheError::hook(hook, err)).await;
        }
    }

    pub async fn before_get(&self, key: &str) {
        for observer in &self.observers {
            self.check("before_get", observer.before_get(key).await).await;
        }
    }

    pub async fn after_get(&self, key: &str, outcome: GetOutcome) {
        for observer in &self.observers {
            self.check("after_get", observer.after_get(key, outcome).await).await;
        }
    }

    pub async fn before_set(&self, key: &str) {
        for observer in &self.observers {
            self.check("before_set", observer.before_set(key).await).await;
        }
    }

    pub async fn after_set(&self, key: &str, size_bytes: usize) {
        for observer in &self.observers {
            self.check("after_set", observer.after_set(key, size_bytes).await).await;
        }
    }

    pub async fn before_delete(&self, key: &str) {
        for observer in &self.observers {
            self.check("before_delete", observer.before_delete(key).await).await;
        }
    }

    pub async fn after_delete(&self, key: &str, removed: &[String]) {
        for observer in &self.observers {
            self.check("after_delete", observer.after_delete(key, removed).await).await;
        }
    }

    pub async fn before_evict(&self, reason: EvictionReason, victims: &[EntrySummary]) {
        for observer in &self.observers {
            self.check("before_evict", observer.before_evict(reason, victims).await).await;
        }
    }

    pub async fn after_evict(&self, reason: EvictionReason, victims: &[EntrySummary]) {
        for observer in &self.observers {
            self.check("after_evict", observer.after_evict(reason, victims).await).await;
        }
    }
}
