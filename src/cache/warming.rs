//! Predictive warming: guesses which absent keys will be requested soon.
//!
//! Strategies:
//! 1. Frequency: keys with a high hit rate over the lookback window
//! 2. Sequence: keys that followed the most recent key in the recent-access ring

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::cache::tracker::AccessTracker;
use crate::config::WarmingConfig;

/// Where a prediction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    Frequency,
    Sequence,
}

/// A key predicted to be accessed soon.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub key: String,
    pub score: f64,
    pub source: PredictionSource,
}

/// Produces real values for predicted keys.
///
/// Returning `Ok(None)` leaves a placeholder entry in the cache instead.
#[async_trait]
pub trait Warmer<V>: Send + Sync {
    async fn warm(&self, key: &str) -> anyhow::Result<Option<V>>;
}

/// Outcome of one warming cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmingReport {
    /// Candidates produced by the predictor.
    pub predicted: usize,
    /// Keys stored with a real value from the warmer.
    pub warmed: Vec<String>,
    /// Keys reserved with a placeholder entry.
    pub placeholders: Vec<String>,
    /// Keys whose warming failed.
    pub failed: Vec<String>,
}

/// Ranks absent keys from the tracker's state.
#[derive(Debug, Clone)]
pub struct Predictor {
    config: WarmingConfig,
}

impl Predictor {
    pub fn new(config: WarmingConfig) -> Self {
        Self { config }
    }

    /// Frequency-based candidates, best first.
    ///
    /// `score = (hits / accesses) * (accesses / lookback_secs)` for every
    /// pattern touched within the lookback window.
    pub fn frequency_candidates(
        &self,
        tracker: &AccessTracker,
        now: Instant,
        is_cached: &dyn Fn(&str) -> bool,
    ) -> Vec<Prediction> {
        let lookback = std::time::Duration::from_millis(self.config.lookback_window_ms);
        let lookback_secs = lookback.as_secs_f64();
        if lookback_secs <= 0.0 {
            return Vec::new();
        }

        let mut candidates: Vec<Prediction> = tracker
            .patterns()
            .filter(|(_, p)| p.accesses > 0)
            .filter(|(_, p)| now.saturating_duration_since(p.last_accessed_at) <= lookback)
            .filter(|(key, _)| !is_cached(key))
            .map(|(key, p)| Prediction {
                key: key.clone(),
                score: p.hit_ratio() * (p.accesses as f64 / lookback_secs),
                source: PredictionSource::Frequency,
            })
            .filter(|p| p.score >= self.config.threshold)
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        candidates.truncate(self.config.max_candidates);
        candidates
    }

    /// Sequence-based candidates: every key that immediately followed a prior
    /// occurrence of the most recent key, in ring order, de-duplicated.
    pub fn sequence_candidates(
        &self,
        tracker: &AccessTracker,
        is_cached: &dyn Fn(&str) -> bool,
    ) -> Vec<Prediction> {
        let recent = tracker.recent();
        let Some(last) = tracker.last_key() else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for i in 0..recent.len().saturating_sub(1) {
            if recent[i] != last {
                continue;
            }
            let successor = &recent[i + 1];
            if successor == last || is_cached(successor) || !seen.insert(successor.clone()) {
                continue;
            }
            candidates.push(Prediction {
                key: successor.clone(),
                score: 0.0,
                source: PredictionSource::Sequence,
            });
        }
        candidates
    }

    /// Union of both strategies, frequency candidates first.
    pub fn predict(
        &self,
        tracker: &AccessTracker,
        now: Instant,
        is_cached: &dyn Fn(&str) -> bool,
    ) -> Vec<Prediction> {
        let mut predictions = self.frequency_candidates(tracker, now, is_cached);
        let mut keys: HashSet<String> = predictions.iter().map(|p| p.key.clone()).collect();
        for candidate in self.sequence_candidates(tracker, is_cached) {
            if keys.insert(candidate.key.clone()) {
                predictions.push(candidate);
            }
        }
        predictions
    }
}
