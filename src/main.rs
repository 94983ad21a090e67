//! cache-soak: drive a synthetic workload through an intelligent cache.
//!
//! Spawns several workers sharing one cache instance. Each worker reads a
//! skewed key space, computes and stores values on misses, refreshes entries
//! served stale, and occasionally invalidates a report together with its
//! dependents. Prints the resulting statistics when done.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use intelligent_cache::cache::entry::EntryType;
use intelligent_cache::cache::hooks::TracingObserver;
use intelligent_cache::config::{Cli, Config};
use intelligent_cache::{IntelligentCache, SetOptions};

/// Stand-in for an expensive inference result.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InferenceResult {
    prompt: String,
    tokens: Vec<u32>,
    latency_ms: u64,
}

impl InferenceResult {
    fn compute(key: &str, seed: u64) -> Self {
        let tokens = (0..64).map(|i| ((seed + i) % 50_000) as u32).collect();
        Self {
            prompt: format!("prompt for {key}"),
            tokens,
            latency_ms: seed % 250,
        }
    }
}

/// xorshift64; the workload only needs a cheap, reproducible skew.
struct KeyPicker {
    state: u64,
    keys: usize,
}

impl KeyPicker {
    fn new(seed: u64, keys: usize) -> Self {
        Self {
            state: seed.max(1),
            keys: keys.max(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// 80% of picks land in the hottest 20% of keys.
    fn next_key(&mut self) -> usize {
        let hot = (self.keys / 5).max(1);
        let roll = self.next_u64();
        if roll % 10 < 8 {
            (self.next_u64() as usize) % hot
        } else {
            (self.next_u64() as usize) % self.keys
        }
    }
}

async fn run_worker(
    cache: IntelligentCache<InferenceResult>,
    worker: usize,
    keys: usize,
    operations: usize,
) -> anyhow::Result<()> {
    let mut picker = KeyPicker::new(0x9E37_79B9 + worker as u64, keys);

    for op in 0..operations {
        let index = picker.next_key();
        let key = format!("inference:{index}");

        match cache.get(&key).await {
            Some(hit) if hit.stale => {
                let fresh = InferenceResult::compute(&key, picker.next_u64());
                cache
                    .set(&key, fresh, SetOptions::default().with_entry_type(EntryType::Inference))
                    .await?;
            }
            Some(_) => {}
            None => {
                let value = InferenceResult::compute(&key, picker.next_u64());
                cache
                    .set(&key, value, SetOptions::default().with_entry_type(EntryType::Inference))
                    .await?;
            }
        }

        // Every so often publish a report derived from the current key and later drop it.
        if op % 50 == 0 {
            let report_key = format!("report:{worker}:{index}");
            let summary = InferenceResult::compute(&report_key, op as u64);
            let options = SetOptions::default()
                .with_entry_type(EntryType::Report)
                .with_dependencies([format!("summary:{worker}:{index}")]);
            cache.set(&report_key, summary.clone(), options).await?;
            cache
                .set(format!("summary:{worker}:{index}"), summary, SetOptions::default())
                .await?;
        }
        if op % 200 == 199 {
            cache.delete(&format!("report:{worker}:{index}")).await;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "intelligent_cache=debug,cache_soak=debug"
    } else {
        "intelligent_cache=info,cache_soak=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("cache-soak v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Config::load(&cli.config)?;

    info!(
        max_size_bytes = config.capacity.max_size_bytes,
        max_entries = config.capacity.max_entries,
        default_ttl_ms = config.expiry.default_ttl_ms,
        stale_window_ms = config.expiry.stale_while_revalidate_ms,
        policy = %config.eviction.policy,
        "Configuration loaded"
    );

    let cache: IntelligentCache<InferenceResult> = IntelligentCache::builder(config)
        .observer(Arc::new(TracingObserver))
        .build()?;

    let start = Instant::now();
    let mut workers = Vec::with_capacity(cli.workers);
    for worker in 0..cli.workers {
        workers.push(tokio::spawn(run_worker(cache.clone(), worker, cli.keys, cli.operations)));
    }
    for handle in workers {
        if let Err(err) = handle.await? {
            warn!(%err, "Worker failed");
        }
    }

    info!(
        workers = cli.workers,
        operations = cli.workers * cli.operations,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Workload complete"
    );

    let report = cache.run_warming_cycle().await;
    info!(
        predicted = report.predicted,
        placeholders = report.placeholders.len(),
        "Final warming cycle"
    );

    let stats = cache.refresh_metrics().await;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    if cli.print_metrics {
        println!("{}", cache.metrics().encode()?);
    }

    cache.shutdown().await;
    Ok(())
}
