//! Runtime configuration for intelligent-cache.
//!
//! Configuration can be loaded from a JSON file or constructed programmatically.
//! All cache knobs (capacities, expiry windows, eviction policy, warming and
//! maintenance intervals) live here.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Command-line arguments for the soak binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "cache-soak", about = "Drive a synthetic workload through an intelligent cache")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "cache.json")]
    pub config: PathBuf,

    /// Number of distinct keys in the synthetic key space.
    #[arg(long, default_value_t = 500)]
    pub keys: usize,

    /// Operations issued by each worker.
    #[arg(long, default_value_t = 10_000)]
    pub operations: usize,

    /// Number of concurrent workers sharing the cache.
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// Print the Prometheus exposition after the run.
    #[arg(long)]
    pub print_metrics: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("Interval {0} must be greater than zero when its task is enabled")]
    ZeroInterval(&'static str),

    #[error("Warming threshold must be a finite, non-negative number (got {0})")]
    InvalidThreshold(f64),

    #[error("Eviction headroom factor must be >= 1.0 (got {0})")]
    InvalidHeadroom(f64),

    #[error("zstd level must be within 1..=22 (got {0})")]
    InvalidZstdLevel(i32),

    #[error("Sequence window must hold at least two keys (got {0})")]
    InvalidSequenceWindow(usize),
}

/// Which ranking the eviction engine uses once no expired entries remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Least recently used first.
    Lru,
    /// Least frequently used first.
    Lfu,
    /// Oldest insertion first.
    Fifo,
    /// Idle and rarely used first.
    #[default]
    Hybrid,
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::Lru => write!(f, "LRU"),
            EvictionPolicy::Lfu => write!(f, "LFU"),
            EvictionPolicy::Fifo => write!(f, "FIFO"),
            EvictionPolicy::Hybrid => write!(f, "Hybrid"),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capacity limits.
    pub capacity: CapacityConfig,

    /// TTL and stale-while-revalidate settings.
    pub expiry: ExpiryConfig,

    /// Eviction policy tuning.
    pub eviction: EvictionConfig,

    /// Compression settings.
    pub compression: CompressionConfig,

    /// Predictive warming settings.
    pub warming: WarmingConfig,

    /// Background maintenance intervals.
    pub maintenance: MaintenanceConfig,
}

/// Space and entry-count ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    /// Maximum accounted bytes across all entries.
    pub max_size_bytes: usize,

    /// Maximum number of entries.
    pub max_entries: usize,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 100 * 1024 * 1024, // 100 MB
            max_entries: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpiryConfig {
    /// TTL applied when a set does not carry its own.
    pub default_ttl_ms: u64,

    /// How long past its TTL an entry may still be served as stale.
    pub stale_while_revalidate_ms: u64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 60 * 60 * 1000, // 1 hour
            stale_while_revalidate_ms: 5 * 60 * 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvictionConfig {
    /// Ranking used when no expired entries can be reclaimed.
    pub policy: EvictionPolicy,

    /// Multiplier applied to the byte deficit before walking the ranking.
    pub headroom_factor: f64,
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            policy: EvictionPolicy::Hybrid,
            headroom_factor: 1.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Compress values at or above `threshold_bytes`.
    pub enabled: bool,

    /// Minimum value size considered for compression.
    pub threshold_bytes: usize,

    /// zstd compression level (1-22) for the default codec.
    pub zstd_level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_bytes: 1024,
            zstd_level: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmingConfig {
    /// Run the periodic warming cycle.
    pub enabled: bool,

    /// Minimum frequency score for a key to be warmed.
    pub threshold: f64,

    /// Access patterns older than this are ignored by the predictor.
    pub lookback_window_ms: u64,

    /// Warm candidates concurrently instead of one after another.
    pub warm_concurrently: bool,

    /// Upper bound on frequency-based candidates per cycle.
    pub max_candidates: usize,

    /// Length of the recent-access ring used for sequence prediction.
    pub sequence_window: usize,

    /// TTL of placeholder entries (capped by the lookback window).
    pub placeholder_ttl_ms: u64,
}

impl Default for WarmingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.01,
            lookback_window_ms: 5 * 60 * 1000,
            warm_concurrently: true,
            max_candidates: 10,
            sequence_window: 10,
            placeholder_ttl_ms: 60 * 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub cleanup_enabled: bool,
    pub cleanup_interval_ms: u64,
    pub warming_interval_ms: u64,
    pub metrics_enabled: bool,
    pub metrics_interval_ms: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            cleanup_enabled: true,
            cleanup_interval_ms: 60 * 1000,
            warming_interval_ms: 5 * 60 * 1000,
            metrics_enabled: true,
            metrics_interval_ms: 30 * 1000,
        }
    }
}

/// A partial configuration applied on top of the live one by `update_config`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub max_size_bytes: Option<usize>,
    pub max_entries: Option<usize>,
    pub default_ttl_ms: Option<u64>,
    pub stale_while_revalidate_ms: Option<u64>,
    pub eviction_policy: Option<EvictionPolicy>,
    pub enable_compression: Option<bool>,
    pub compression_threshold_bytes: Option<usize>,
    pub enable_predictive_warming: Option<bool>,
    pub warming_threshold: Option<f64>,
    pub warming_lookback_window_ms: Option<u64>,
    pub warm_concurrently: Option<bool>,
    pub cleanup_enabled: Option<bool>,
    pub cleanup_interval_ms: Option<u64>,
    pub warming_interval_ms: Option<u64>,
    pub metrics_enabled: Option<bool>,
    pub metrics_interval_ms: Option<u64>,
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Reject option combinations the cache cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity.max_size_bytes == 0 {
            return Err(ConfigError::Zero("capacity.max_size_bytes"));
        }
        if self.capacity.max_entries == 0 {
            return Err(ConfigError::Zero("capacity.max_entries"));
        }
        if self.expiry.default_ttl_ms == 0 {
            return Err(ConfigError::Zero("expiry.default_ttl_ms"));
        }
        if !self.eviction.headroom_factor.is_finite() || self.eviction.headroom_factor < 1.0 {
            return Err(ConfigError::InvalidHeadroom(self.eviction.headroom_factor));
        }
        if !(1..=22).contains(&self.compression.zstd_level) {
            return Err(ConfigError::InvalidZstdLevel(self.compression.zstd_level));
        }
        if !self.warming.threshold.is_finite() || self.warming.threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.warming.threshold));
        }
        if self.warming.lookback_window_ms == 0 {
            return Err(ConfigError::Zero("warming.lookback_window_ms"));
        }
        if self.warming.sequence_window < 2 {
            return Err(ConfigError::InvalidSequenceWindow(self.warming.sequence_window));
        }

        let m = &self.maintenance;
        if m.cleanup_enabled && m.cleanup_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("maintenance.cleanup_interval_ms"));
        }
        if self.warming.enabled && m.warming_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("maintenance.warming_interval_ms"));
        }
        if m.metrics_enabled && m.metrics_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("maintenance.metrics_interval_ms"));
        }
        Ok(())
    }

    /// Return a copy of this configuration with `update` applied.
    pub fn merged(&self, update: &ConfigUpdate) -> Config {
        let mut next = self.clone();

        if let Some(v) = update.max_size_bytes {
            next.capacity.max_size_bytes = v;
        }
        if let Some(v) = update.max_entries {
            next.capacity.max_entries = v;
        }
        if let Some(v) = update.default_ttl_ms {
            next.expiry.default_ttl_ms = v;
        }
        if let Some(v) = update.stale_while_revalidate_ms {
            next.expiry.stale_while_revalidate_ms = v;
        }
        if let Some(v) = update.eviction_policy {
            next.eviction.policy = v;
        }
        if let Some(v) = update.enable_compression {
            next.compression.enabled = v;
        }
        if let Some(v) = update.compression_threshold_bytes {
            next.compression.threshold_bytes = v;
        }
        if let Some(v) = update.enable_predictive_warming {
            next.warming.enabled = v;
        }
        if let Some(v) = update.warming_threshold {
            next.warming.threshold = v;
        }
        if let Some(v) = update.warming_lookback_window_ms {
            next.warming.lookback_window_ms = v;
        }
        if let Some(v) = update.warm_concurrently {
            next.warming.warm_concurrently = v;
        }
        if let Some(v) = update.cleanup_enabled {
            next.maintenance.cleanup_enabled = v;
        }
        if let Some(v) = update.cleanup_interval_ms {
            next.maintenance.cleanup_interval_ms = v;
        }
        if let Some(v) = update.warming_interval_ms {
            next.maintenance.warming_interval_ms = v;
        }
        if let Some(v) = update.metrics_enabled {
            next.maintenance.metrics_enabled = v;
        }
        if let Some(v) = update.metrics_interval_ms {
            next.maintenance.metrics_interval_ms = v;
        }
        next
    }

    /// Whether moving from `self` to `other` requires restarting the maintenance tasks.
    pub fn schedule_differs(&self, other: &Config) -> bool {
        self.maintenance != other.maintenance || self.warming.enabled != other.warming.enabled
    }

    /// Whether any periodic task would be started for this configuration.
    pub fn has_maintenance(&self) -> bool {
        self.maintenance.cleanup_enabled || self.maintenance.metrics_enabled || self.warming.enabled
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.expiry.default_ttl_ms)
    }

    pub fn stale_window(&self) -> Duration {
        Duration::from_millis(self.expiry.stale_while_revalidate_ms)
    }

    pub fn lookback_window(&self) -> Duration {
        Duration::from_millis(self.warming.lookback_window_ms)
    }

    /// TTL given to placeholder entries: never longer than the lookback window.
    pub fn placeholder_ttl(&self) -> Duration {
        Duration::from_millis(self.warming.placeholder_ttl_ms.min(self.warming.lookback_window_ms))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.maintenance.cleanup_interval_ms)
    }

    pub fn warming_interval(&self) -> Duration {
        Duration::from_millis(self.maintenance.warming_interval_ms)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_millis(self.maintenance.metrics_interval_ms)
    }
}
