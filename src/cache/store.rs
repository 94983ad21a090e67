//! Entry store: the ground truth for what is cached right now.
//!
//! Owns the key → entry map and the running byte total. Every mutation goes
//! through `insert`/`remove` so that `sum(size_bytes) == total_size` holds
//! after each call.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::entry::CacheEntry;

/// How much must be reclaimed before an insert fits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpaceRequest {
    /// Bytes over `max_size_bytes` after the insert.
    pub required_bytes: usize,
    /// Entries over `max_entries` after the insert.
    pub required_entries: usize,
}

impl SpaceRequest {
    pub fn is_satisfied(&self) -> bool {
        self.required_bytes == 0 && self.required_entries == 0
    }
}

/// The key → entry map plus capacity accounting.
pub struct EntryStore<V> {
    entries: HashMap<String, CacheEntry<V>>,
    total_size: usize,
    next_sequence: u64,
    /// Reference point for policy scores expressed in seconds.
    epoch: Instant,
}

impl<V> EntryStore<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            total_size: 0,
            next_sequence: 0,
            epoch: Instant::now(),
        }
    }

    /// Insert an entry, replacing any previous entry under the same key.
    ///
    /// Returns the replaced entry, whose size is released from the total.
    pub fn insert(&mut self, mut entry: CacheEntry<V>) -> Option<CacheEntry<V>> {
        entry.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.total_size += entry.size_bytes;

        let previous = self.entries.insert(entry.key.clone(), entry);
        if let Some(old) = &previous {
            self.total_size = self.total_size.saturating_sub(old.size_bytes);
        }
        previous
    }

    /// Remove a single entry without touching its dependencies.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.total_size = self.total_size.saturating_sub(entry.size_bytes);
        Some(entry)
    }

    /// Remove `key` and, depth-first, every key reachable through `dependencies`.
    ///
    /// Dependencies are removed before the entry that declares them. A visited
    /// set keeps dependency cycles from recursing forever. Returns the removed
    /// entries in removal order.
    pub fn remove_cascade(&mut self, key: &str) -> Vec<CacheEntry<V>> {
        let mut visited = HashSet::new();
        let mut removed = Vec::new();
        self.cascade(key, &mut visited, &mut removed);
        removed
    }

    fn cascade(&mut self, key: &str, visited: &mut HashSet<String>, removed: &mut Vec<CacheEntry<V>>) {
        if !visited.insert(key.to_string()) {
            return;
        }

        let dependencies: Vec<String> = match self.entries.get(key) {
            Some(entry) => entry.dependencies.iter().cloned().collect(),
            None => return,
        };

        for dependency in &dependencies {
            self.cascade(dependency, visited, removed);
        }

        if let Some(entry) = self.remove(key) {
            removed.push(entry);
        }
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut CacheEntry<V>> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry<V>> + Clone {
        self.entries.values()
    }

    /// Keys of every entry past its hard-expiry deadline.
    pub fn expired_keys(&self, now: Instant, stale_window: Duration) -> Vec<String> {
        self.entries
            .values()
            .filter(|entry| entry.is_hard_expired(now, stale_window))
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Compute the deficit for adding `incoming_entries` entries totalling
    /// `incoming_bytes` under the given limits.
    pub fn space_request(
        &self,
        incoming_bytes: usize,
        incoming_entries: usize,
        max_size_bytes: usize,
        max_entries: usize,
    ) -> SpaceRequest {
        SpaceRequest {
            required_bytes: (self.total_size + incoming_bytes).saturating_sub(max_size_bytes),
            required_entries: (self.entries.len() + incoming_entries).saturating_sub(max_entries),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_size = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Recompute the byte total from scratch and compare with the running one.
    pub fn accounting_consistent(&self) -> bool {
        self.entries.values().map(|e| e.size_bytes).sum::<usize>() == self.total_size
    }
}

impl<V> Default for EntryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
