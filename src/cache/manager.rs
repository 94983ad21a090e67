//! The cache facade: the handle collaborators hold.
//!
//! `IntelligentCache` is the central coordinator. It:
//! - Serves get/set/delete against the entry store under one lock
//! - Makes room through the eviction engine before inserts
//! - Feeds the access tracker and drives predictive warming
//! - Runs the maintenance tasks and owns the shutdown lifecycle

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::compressor::{decode_value, encode_value, Compressor, ZstdCompressor};
use crate::cache::entry::{CacheEntry, CacheHit, CacheValue, EntrySummary, Freshness, Payload, SetOptions};
use crate::cache::error::CacheError;
use crate::cache::evictor::{EvictionReason, Evictor};
use crate::cache::hooks::{CacheObserver, GetOutcome, Hooks};
use crate::cache::scheduler::MaintenanceScheduler;
use crate::cache::stats::{CacheStats, Counters};
use crate::cache::store::EntryStore;
use crate::cache::tracker::AccessTracker;
use crate::cache::warming::{Prediction, Predictor, Warmer, WarmingReport};
use crate::config::{Config, ConfigUpdate};
use crate::metrics::CacheMetrics;

/// A batch removed in one eviction pass.
type EvictedBatch = (EvictionReason, Vec<EntrySummary>);

/// Everything guarded by the cache lock.
struct CacheState<V> {
    config: Arc<Config>,
    store: EntryStore<V>,
    tracker: AccessTracker,
    evictor: Evictor,
    predictor: Predictor,
    counters: Counters,
}

impl<V> CacheState<V> {
    fn new(config: Arc<Config>) -> Self {
        Self {
            store: EntryStore::new(),
            tracker: AccessTracker::new(config.warming.sequence_window),
            evictor: Evictor::new(config.eviction.clone()),
            predictor: Predictor::new(config.warming.clone()),
            counters: Counters::default(),
            config,
        }
    }

    fn apply_config(&mut self, config: Arc<Config>) {
        self.evictor = Evictor::new(config.eviction.clone());
        self.predictor = Predictor::new(config.warming.clone());
        self.tracker.set_window(config.warming.sequence_window);
        self.config = config;
    }

    fn predictions(&self, now: Instant) -> Vec<Prediction> {
        let store = &self.store;
        self.predictor.predict(&self.tracker, now, &|key| store.contains(key))
    }
}

struct Shared<V> {
    state: Mutex<CacheState<V>>,
    scheduler: Mutex<Option<MaintenanceScheduler>>,
    hooks: Hooks,
    compressor: Arc<dyn Compressor>,
    warmer: Option<Arc<dyn Warmer<V>>>,
    metrics: CacheMetrics,
    shutting_down: AtomicBool,
}

/// Builder for [`IntelligentCache`].
pub struct CacheBuilder<V> {
    config: Config,
    observers: Vec<Arc<dyn CacheObserver>>,
    compressor: Option<Arc<dyn Compressor>>,
    warmer: Option<Arc<dyn Warmer<V>>>,
    metrics_namespace: String,
}

impl<V: CacheValue> CacheBuilder<V> {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            observers: Vec::new(),
            compressor: None,
            warmer: None,
            metrics_namespace: "intelligent_cache".to_string(),
        }
    }

    /// Register an observer. Observers run in registration order.
    pub fn observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Replace the default zstd codec.
    pub fn compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = Some(compressor);
        self
    }

    /// Supply real values for predicted keys instead of placeholders.
    pub fn warmer(mut self, warmer: Arc<dyn Warmer<V>>) -> Self {
        self.warmer = Some(warmer);
        self
    }

    pub fn metrics_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metrics_namespace = namespace.into();
        self
    }

    /// Validate the configuration and start the maintenance tasks.
    ///
    /// When any maintenance task is enabled this must run inside a tokio runtime.
    pub fn build(self) -> Result<IntelligentCache<V>, CacheError> {
        self.config.validate()?;
        if self.config.has_maintenance() && tokio::runtime::Handle::try_current().is_err() {
            return Err(CacheError::NoRuntime);
        }

        let compressor = self.compressor.unwrap_or_else(|| {
            Arc::new(ZstdCompressor::new(self.config.compression.zstd_level)) as Arc<dyn Compressor>
        });
        let metrics = CacheMetrics::new(&self.metrics_namespace)?;
        let config = Arc::new(self.config);

        let shared = Arc::new(Shared {
            state: Mutex::new(CacheState::new(config.clone())),
            scheduler: Mutex::new(None),
            hooks: Hooks::new(self.observers),
            compressor,
            warmer: self.warmer,
            metrics,
            shutting_down: AtomicBool::new(false),
        });

        let scheduler = start_maintenance(&shared, &config);
        if let Ok(mut slot) = shared.scheduler.try_lock() {
            *slot = Some(scheduler);
        }

        info!(
            max_size_bytes = config.capacity.max_size_bytes,
            max_entries = config.capacity.max_entries,
            policy = %config.eviction.policy,
            compression = config.compression.enabled,
            warming = config.warming.enabled,
            "Cache started"
        );

        Ok(IntelligentCache { shared })
    }
}

/// Spawn the periodic tasks enabled by `config`.
///
/// Tasks hold a weak handle so they end on their own once the cache is dropped.
fn start_maintenance<V: CacheValue>(shared: &Arc<Shared<V>>, config: &Config) -> MaintenanceScheduler {
    let mut scheduler = MaintenanceScheduler::new();

    if config.maintenance.cleanup_enabled {
        let weak = Arc::downgrade(shared);
        scheduler.spawn("cleanup", config.cleanup_interval(), move || {
            let weak = weak.clone();
            async move {
                let Some(cache) = upgrade(&weak) else {
                    return ControlFlow::Break(());
                };
                cache.cleanup_expired().await;
                ControlFlow::Continue(())
            }
        });
    }

    if config.warming.enabled {
        let weak = Arc::downgrade(shared);
        scheduler.spawn("warming", config.warming_interval(), move || {
            let weak = weak.clone();
            async move {
                let Some(cache) = upgrade(&weak) else {
                    return ControlFlow::Break(());
                };
                cache.run_warming_cycle().await;
                ControlFlow::Continue(())
            }
        });
    }

    if config.maintenance.metrics_enabled {
        let weak = Arc::downgrade(shared);
        scheduler.spawn("metrics", config.metrics_interval(), move || {
            let weak = weak.clone();
            async move {
                let Some(cache) = upgrade(&weak) else {
                    return ControlFlow::Break(());
                };
                cache.refresh_metrics().await;
                ControlFlow::Continue(())
            }
        });
    }

    scheduler
}

fn upgrade<V>(weak: &Weak<Shared<V>>) -> Option<IntelligentCache<V>> {
    let shared = weak.upgrade()?;
    if shared.shutting_down.load(Ordering::Acquire) {
        return None;
    }
    Some(IntelligentCache { shared })
}

/// Thread-safe cache handle. Cloning is cheap and shares the same cache.
pub struct IntelligentCache<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for IntelligentCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<V: CacheValue> IntelligentCache<V> {
    pub fn builder(config: Config) -> CacheBuilder<V> {
        CacheBuilder::new(config)
    }

    /// Build a cache with default hooks, codec and no warmer.
    pub fn new(config: Config) -> Result<Self, CacheError> {
        CacheBuilder::new(config).build()
    }

    fn is_shutting_down(&self) -> bool {
        self.shared.shutting_down.load(Ordering::Acquire)
    }

    /// Look up `key`.
    ///
    /// Returns `None` on a miss, a hard-expired entry (which is removed) or a
    /// warming placeholder. Entries past their TTL but inside the stale window
    /// come back with `stale = true` and stay cached.
    pub async fn get(&self, key: &str) -> Option<CacheHit<V>> {
        self.shared.hooks.before_get(key).await;

        let (result, outcome, decode_error) = {
            let mut state = self.shared.state.lock().await;
            if self.is_shutting_down() {
                (None, GetOutcome::Miss, None)
            } else {
                self.read_locked(&mut state, key)
            }
        };

        if let Some(err) = decode_error {
            self.shared.hooks.report(err).await;
        }
        self.shared.hooks.after_get(key, outcome).await;
        result
    }

    fn read_locked(
        &self,
        state: &mut CacheState<V>,
        key: &str,
    ) -> (Option<CacheHit<V>>, GetOutcome, Option<CacheError>) {
        let now = Instant::now();
        let stale_window = state.config.stale_window();

        let freshness = match state.store.get(key) {
            None => {
                state.tracker.record(key, false, now);
                state.counters.misses += 1;
                return (None, GetOutcome::Miss, None);
            }
            Some(entry) if entry.is_placeholder() => {
                state.tracker.record(key, false, now);
                state.counters.misses += 1;
                return (None, GetOutcome::Placeholder, None);
            }
            Some(entry) => entry.freshness(now, stale_window),
        };

        if freshness == Freshness::Expired {
            state.store.remove(key);
            state.tracker.record(key, false, now);
            state.counters.expirations += 1;
            state.counters.misses += 1;
            debug!(key, "Removed hard-expired entry on read");
            return (None, GetOutcome::Expired, None);
        }

        let Some(entry) = state.store.get_mut(key) else {
            return (None, GetOutcome::Miss, None);
        };
        if freshness == Freshness::Fresh {
            entry.touch(now);
        }

        let value = match &entry.payload {
            Payload::Raw(value) => Ok(value.clone()),
            Payload::Compressed(bytes) => decode_value::<V>(self.shared.compressor.as_ref(), bytes),
            Payload::Placeholder => return (None, GetOutcome::Placeholder, None),
        };

        match value {
            Ok(value) => {
                let stale = freshness == Freshness::Stale;
                state.tracker.record(key, true, now);
                if stale {
                    state.counters.stale_hits += 1;
                } else {
                    state.counters.hits += 1;
                }
                let outcome = if stale { GetOutcome::Stale } else { GetOutcome::Hit };
                (Some(CacheHit { value, stale }), outcome, None)
            }
            Err(source) => {
                // An undecodable entry is useless; drop it and report a miss.
                state.store.remove(key);
                state.tracker.record(key, false, now);
                state.counters.misses += 1;
                let err = CacheError::Compression {
                    key: key.to_string(),
                    source,
                };
                (None, GetOutcome::Miss, Some(err))
            }
        }
    }

    /// Insert or replace `key`.
    ///
    /// Fails only when the (possibly compressed) entry alone exceeds
    /// `max_size_bytes`, or after shutdown.
    pub async fn set(&self, key: impl Into<String>, value: V, options: SetOptions) -> Result<(), CacheError> {
        self.store_value(key.into(), value, options, false).await.map(|_| ())
    }

    /// Shared insert path. With `if_absent`, a key already holding a real
    /// value is left alone and `Ok(false)` is returned.
    async fn store_value(
        &self,
        key: String,
        value: V,
        options: SetOptions,
        if_absent: bool,
    ) -> Result<bool, CacheError> {
        if self.is_shutting_down() {
            return Err(CacheError::ShutDown);
        }
        if if_absent && self.holds_value(&key).await {
            return Ok(false);
        }
        self.shared.hooks.before_set(&key).await;

        let config = self.shared.state.lock().await.config.clone();
        let (payload, size_bytes, original_size) = self.prepare_payload(&key, value, &options, &config).await;

        let evicted = {
            let mut state = self.shared.state.lock().await;
            if self.is_shutting_down() {
                return Err(CacheError::ShutDown);
            }
            if if_absent && state.store.get(&key).is_some_and(|e| !e.is_placeholder()) {
                return Ok(false);
            }

            // The limit may have shrunk since the config snapshot above.
            let max = state.config.capacity.max_size_bytes;
            if size_bytes > max {
                drop(state);
                warn!(key, size_bytes, max, "Rejected oversized entry");
                let oversized = |key: &str| CacheError::EntryTooLarge {
                    key: key.to_string(),
                    size: size_bytes,
                    max,
                };
                self.shared.hooks.report(oversized(&key)).await;
                return Err(oversized(&key));
            }

            let now = Instant::now();
            let ttl = options.ttl.unwrap_or_else(|| state.config.default_ttl());

            let mut entry = CacheEntry::with_payload(key.clone(), payload, ttl, size_bytes, now);
            entry.original_size = original_size;
            entry.entry_type = options.entry_type;
            entry.priority = options.priority;
            entry.dependencies = options.dependencies.into_iter().collect();

            // A replaced entry releases its space before the deficit is computed.
            state.store.remove(&key);
            let evicted = self.make_room(&mut state, size_bytes, 1, now).await;

            state.store.insert(entry);
            state.tracker.record_write(&key, now);
            state.counters.writes += 1;
            evicted
        };

        self.finish_evictions(evicted).await;
        self.shared.hooks.after_set(&key, size_bytes).await;
        Ok(true)
    }

    async fn holds_value(&self, key: &str) -> bool {
        let state = self.shared.state.lock().await;
        state.store.get(key).is_some_and(|e| !e.is_placeholder())
    }

    /// Encode, size and optionally compress a value.
    ///
    /// Returns the payload, its accounted size and its size before
    /// compression. For compressed payloads the latter is the encoded length,
    /// so the compression ratio compares like with like.
    async fn prepare_payload(
        &self,
        key: &str,
        value: V,
        options: &SetOptions,
        config: &Config,
    ) -> (Payload<V>, usize, usize) {
        let encoded = encode_value(&value).ok();
        let estimated = encoded
            .as_ref()
            .map(Vec::len)
            .unwrap_or_else(std::mem::size_of::<V>);
        let original_size = options.size_bytes.unwrap_or(estimated);

        let wants_compression = config.compression.enabled
            && !options.no_compress
            && original_size >= config.compression.threshold_bytes;
        let Some(encoded) = encoded.filter(|_| wants_compression) else {
            return (Payload::Raw(value), original_size, original_size);
        };

        match self.shared.compressor.compress(&encoded) {
            Ok(compressed) if compressed.len() < encoded.len() => {
                debug!(
                    key,
                    codec = self.shared.compressor.name(),
                    before = encoded.len(),
                    after = compressed.len(),
                    "Compressed value"
                );
                let size = compressed.len();
                (Payload::Compressed(Bytes::from(compressed)), size, encoded.len())
            }
            Ok(_) => (Payload::Raw(value), original_size, original_size),
            Err(source) => {
                self.shared
                    .hooks
                    .report(CacheError::Compression {
                        key: key.to_string(),
                        source,
                    })
                    .await;
                (Payload::Raw(value), original_size, original_size)
            }
        }
    }

    /// Evict until `incoming_bytes`/`incoming_entries` fit, under the held lock.
    ///
    /// Expired entries go first; if they do not cover the deficit a single
    /// policy-ranked batch follows. `before_evict` runs between selecting and
    /// removing each batch.
    async fn make_room(
        &self,
        state: &mut CacheState<V>,
        incoming_bytes: usize,
        incoming_entries: usize,
        now: Instant,
    ) -> Vec<EvictedBatch> {
        let mut batches = Vec::new();
        let stale_window = state.config.stale_window();

        loop {
            let request = state.store.space_request(
                incoming_bytes,
                incoming_entries,
                state.config.capacity.max_size_bytes,
                state.config.capacity.max_entries,
            );
            if request.is_satisfied() {
                break;
            }

            let plan = state.evictor.select_entries_to_evict(
                state.store.entries(),
                &request,
                state.store.epoch(),
                now,
                stale_window,
            );
            if plan.victims.is_empty() {
                break;
            }

            let summaries: Vec<EntrySummary> = plan
                .victims
                .iter()
                .filter_map(|v| state.store.get(&v.key).map(CacheEntry::summary))
                .collect();
            self.shared.hooks.before_evict(plan.reason, &summaries).await;

            for victim in &plan.victims {
                state.store.remove(&victim.key);
            }
            match plan.reason {
                EvictionReason::Expired => state.counters.expirations += summaries.len() as u64,
                EvictionReason::Policy(_) => state.counters.evictions += summaries.len() as u64,
            }

            debug!(
                reason = ?plan.reason,
                count = summaries.len(),
                freed = plan.freed_bytes(),
                required_bytes = request.required_bytes,
                required_entries = request.required_entries,
                "Eviction pass"
            );

            let done = matches!(plan.reason, EvictionReason::Policy(_));
            batches.push((plan.reason, summaries));
            if done {
                break;
            }
        }

        batches
    }

    async fn finish_evictions(&self, batches: Vec<EvictedBatch>) {
        for (reason, victims) in batches {
            self.shared.hooks.after_evict(reason, &victims).await;
        }
    }

    /// Delete `key` and, transitively, its dependencies.
    ///
    /// Returns the keys actually removed, dependencies first.
    pub async fn delete(&self, key: &str) -> Vec<String> {
        if self.is_shutting_down() {
            return Vec::new();
        }
        self.shared.hooks.before_delete(key).await;

        let removed: Vec<String> = {
            let mut state = self.shared.state.lock().await;
            let removed = state.store.remove_cascade(key);
            if !removed.is_empty() {
                state.counters.deletes += 1;
            }
            removed.into_iter().map(|e| e.key).collect()
        };

        if removed.len() > 1 {
            debug!(key, cascaded = removed.len() - 1, "Cascading delete");
        }
        self.shared.hooks.after_delete(key, &removed).await;
        removed
    }

    /// Empty the store, the tracker and all counters.
    pub async fn clear(&self) {
        let mut state = self.shared.state.lock().await;
        state.store.clear();
        state.tracker.clear();
        state.counters = Counters::default();
        self.shared.hooks.reset_error_count();
        info!("Cache cleared");
    }

    /// Remove every entry past hard expiry. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        if self.is_shutting_down() {
            return 0;
        }

        let batch = {
            let mut state = self.shared.state.lock().await;
            let now = Instant::now();
            let keys = state.store.expired_keys(now, state.config.stale_window());
            if keys.is_empty() {
                return 0;
            }

            let summaries: Vec<EntrySummary> = keys
                .iter()
                .filter_map(|k| state.store.get(k).map(CacheEntry::summary))
                .collect();
            self.shared.hooks.before_evict(EvictionReason::Expired, &summaries).await;
            for key in &keys {
                state.store.remove(key);
            }
            state.counters.expirations += summaries.len() as u64;
            summaries
        };

        let removed = batch.len();
        info!(removed, "Expired entries cleaned up");
        self.finish_evictions(vec![(EvictionReason::Expired, batch)]).await;
        removed
    }

    /// Keys the predictor currently expects that are not cached.
    pub async fn predicted_keys(&self) -> Vec<Prediction> {
        let state = self.shared.state.lock().await;
        state.predictions(Instant::now())
    }

    /// Run one warming cycle: predict, then materialize every candidate.
    pub async fn run_warming_cycle(&self) -> WarmingReport {
        if self.is_shutting_down() {
            return WarmingReport::default();
        }

        let (predictions, ttl, concurrently) = {
            let state = self.shared.state.lock().await;
            (
                state.predictions(Instant::now()),
                state.config.placeholder_ttl(),
                state.config.warming.warm_concurrently,
            )
        };

        let mut report = WarmingReport {
            predicted: predictions.len(),
            ..Default::default()
        };
        if predictions.is_empty() {
            return report;
        }

        let outcomes = if concurrently {
            let pending: Vec<_> = predictions.iter().map(|p| self.warm_key(&p.key, ttl)).collect();
            join_all(pending).await
        } else {
            let mut outcomes = Vec::with_capacity(predictions.len());
            for prediction in &predictions {
                outcomes.push(self.warm_key(&prediction.key, ttl).await);
            }
            outcomes
        };

        for (prediction, outcome) in predictions.into_iter().zip(outcomes) {
            match outcome {
                Ok(WarmOutcome::Value) => report.warmed.push(prediction.key),
                Ok(WarmOutcome::Placeholder) => report.placeholders.push(prediction.key),
                Ok(WarmOutcome::Skipped) => {}
                Err(err) => {
                    report.failed.push(prediction.key);
                    self.shared.hooks.report(err).await;
                }
            }
        }

        info!(
            predicted = report.predicted,
            warmed = report.warmed.len(),
            placeholders = report.placeholders.len(),
            failed = report.failed.len(),
            "Warming cycle complete"
        );
        report
    }

    async fn warm_key(&self, key: &str, ttl: Duration) -> Result<WarmOutcome, CacheError> {
        if let Some(warmer) = &self.shared.warmer {
            let produced = warmer.warm(key).await.map_err(|err| CacheError::Warming {
                key: key.to_string(),
                message: format!("{err:#}"),
            })?;
            if let Some(value) = produced {
                // A caller may have stored the real value while the warmer ran.
                let options = SetOptions::default().with_ttl(ttl).with_priority(-1);
                let stored = self.store_value(key.to_string(), value, options, true).await?;
                return Ok(if stored { WarmOutcome::Value } else { WarmOutcome::Skipped });
            }
        }
        self.insert_placeholder(key, ttl).await
    }

    async fn insert_placeholder(&self, key: &str, ttl: Duration) -> Result<WarmOutcome, CacheError> {
        let evicted = {
            let mut state = self.shared.state.lock().await;
            if self.is_shutting_down() {
                return Err(CacheError::ShutDown);
            }
            if state.store.contains(key) {
                return Ok(WarmOutcome::Skipped);
            }
            let now = Instant::now();
            let evicted = self.make_room(&mut state, 0, 1, now).await;
            state.store.insert(CacheEntry::placeholder(key, ttl, now));
            evicted
        };
        self.finish_evictions(evicted).await;
        Ok(WarmOutcome::Placeholder)
    }

    /// Compute a statistics snapshot.
    pub async fn stats(&self) -> CacheStats {
        let state = self.shared.state.lock().await;
        let now = Instant::now();
        let predicted = state.predictions(now).len();
        CacheStats::compute(
            &state.store,
            &state.counters,
            self.shared.hooks.error_count(),
            state.config.capacity.max_size_bytes,
            predicted,
            now,
        )
    }

    /// Recompute stats and publish them to the metrics registry.
    pub async fn refresh_metrics(&self) -> CacheStats {
        let stats = self.stats().await;
        self.shared.metrics.observe(&stats);
        debug!(
            entries = stats.entry_count,
            size_bytes = stats.total_size_bytes,
            hit_rate = stats.hit_rate,
            score = stats.performance_score,
            "Metrics refreshed"
        );
        stats
    }

    /// Merge `update` into the live configuration.
    ///
    /// Restarts every maintenance task when an interval or task toggle changed,
    /// and trims the store right away if limits shrank.
    pub async fn update_config(&self, update: ConfigUpdate) -> Result<(), CacheError> {
        let (previous, next, evicted) = {
            let mut state = self.shared.state.lock().await;
            let previous = state.config.clone();
            let next = Arc::new(previous.merged(&update));
            next.validate()?;
            state.apply_config(next.clone());
            let evicted = self.make_room(&mut state, 0, 0, Instant::now()).await;
            (previous, next, evicted)
        };
        self.finish_evictions(evicted).await;

        if previous.schedule_differs(&next) && !self.is_shutting_down() {
            let mut slot = self.shared.scheduler.lock().await;
            if let Some(mut old) = slot.take() {
                old.stop();
            }
            *slot = Some(start_maintenance(&self.shared, &next));
            info!("Maintenance tasks restarted with new intervals");
        }

        info!(policy = %next.eviction.policy, "Configuration updated");
        Ok(())
    }

    /// Stop maintenance and empty the cache. Safe to call more than once.
    pub async fn shutdown(&self) {
        let first = !self.shared.shutting_down.swap(true, Ordering::AcqRel);

        if let Some(mut scheduler) = self.shared.scheduler.lock().await.take() {
            scheduler.stop();
        }

        let mut state = self.shared.state.lock().await;
        state.store.clear();
        state.tracker.clear();
        if first {
            info!("Cache shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.is_shutting_down()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.shared.state.lock().await.store.contains(key)
    }

    pub async fn len(&self) -> usize {
        self.shared.state.lock().await.store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn config(&self) -> Arc<Config> {
        self.shared.state.lock().await.config.clone()
    }

    /// Names and periods of the running maintenance tasks.
    pub async fn maintenance_tasks(&self) -> Vec<(&'static str, Duration)> {
        match self.shared.scheduler.lock().await.as_ref() {
            Some(scheduler) => scheduler.tasks(),
            None => Vec::new(),
        }
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.shared.metrics
    }
}

enum WarmOutcome {
    Value,
    Placeholder,
    Skipped,
}
