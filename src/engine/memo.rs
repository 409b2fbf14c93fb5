// Memoizing gate for deterministic queries — per-key in-flight gating,
// failures never cached.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::debug;

/// Counters describing cache behavior since process start.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// A generic memoizer: maps a hashable key to an `Arc`-shared value computed
/// at most once per key (under normal scheduling).
///
/// Concurrent requests for the same absent key serialize on a per-key gate,
/// so the losers observe the winner's stored result instead of recomputing.
/// If the computation fails, nothing is stored and the error propagates to
/// the caller that ran it; waiters then compute for themselves. There is no
/// eviction: the underlying data is immutable for the process lifetime and
/// capacity is a deployment concern.
pub struct QueryCache<K, V> {
    entries: RwLock<HashMap<K, Arc<V>>>,
    inflight: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key`, computing and storing it via
    /// `compute` on a miss.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }

        // Per-key gate: exactly one caller computes while the rest wait.
        let gate = {
            let mut inflight = self.inflight.lock();
            inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        let _guard = gate.lock().await;

        // Either the winner stored a value while we waited, or we are the
        // winner and the key is still absent.
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = match compute().await {
            Ok(value) => {
                let value = Arc::new(value);
                self.entries.write().insert(key.clone(), value.clone());
                debug!("cache store, {} entries", self.len());
                Ok(value)
            }
            Err(e) => Err(e),
        };

        // Drop the gate entry only after the store is visible, so a caller
        // that misses the (now removed) gate finds the value. A failed key
        // leaves nothing behind and the next caller recomputes.
        self.inflight.lock().remove(&key);

        result
    }

    fn lookup(&self, key: &K) -> Option<Arc<V>> {
        let hit = self.entries.read().get(key).cloned();
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
