//! Bounded result cache shared by all workers
//!
//! Entries are keyed by a digest of everything that determines a
//! conversion's output, so a changed dataset or template simply misses.
//! The LRU map and its recency bookkeeping sit behind one mutex.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::chain::ConversionResult;
use crate::types::MediaKind;

/// Key identifying one (dataset, document, kind, template) conversion
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key from its four components
    pub fn new(
        dataset_hash: &str,
        document_id: &str,
        kind: MediaKind,
        template_version: &str,
    ) -> Self {
        let mut hasher = Sha256::new();
        for part in [
            dataset_hash,
            document_id,
            kind.config_key(),
            template_version,
        ] {
            // length prefix keeps ("ab", "c") and ("a", "bc") apart
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 when nothing was looked up
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Count-bounded LRU store of accepted conversion results
pub struct CacheStore {
    entries: Mutex<LruCache<CacheKey, Arc<ConversionResult>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create a store, `None` when `capacity` is zero
    pub fn with_capacity(capacity: usize) -> Option<Self> {
        NonZeroUsize::new(capacity).map(Self::new)
    }

    /// Look up a result, refreshing its recency
    pub fn get(&self, key: &CacheKey) -> Option<Arc<ConversionResult>> {
        let found = self.entries.lock().get(key).cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Insert a result, evicting the least recently used entry when full
    pub fn put(&self, key: CacheKey, result: Arc<ConversionResult>) {
        if let Some((evicted, _)) = self.entries.lock().push(key.clone(), result) {
            if evicted != key {
                log::trace!("Evicted cache entry {}", evicted);
            }
        }
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Evict least recently used entries until at most `retain` remain
    ///
    /// Returns the number of evicted entries.
    pub fn trim_to(&self, retain: usize) -> usize {
        let mut entries = self.entries.lock();
        let mut evicted = 0;
        while entries.len() > retain {
            if entries.pop_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        evicted
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            entries: entries.len(),
            capacity: entries.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore").field("stats", &self.stats()).finish()
    }
}
