//! Cache Store Module
//!
//! The shared object cache: a HashMap index with byte-capacity accounting,
//! a logical clock for LRU ordering, and eviction by minimum timestamp.
//!
//! The index, accounting, and clock form a single critical section behind
//! one mutex. The lock is held only for index mutation; payload transfers
//! to clients happen on cloned handles outside the lock.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats};
use crate::error::CacheError;

// == Object Cache ==
/// Capacity-bounded response cache shared by all connection workers.
///
/// An injectable service object: workers hold it behind an `Arc` and every
/// operation takes `&self`. Internally one mutex guards the index.
#[derive(Debug)]
pub struct ObjectCache {
    /// Maximum total payload bytes across all live entries
    capacity: usize,
    /// Index, byte accounting, clock, and stats under a single lock
    index: Mutex<CacheIndex>,
}

/// State guarded by the cache mutex.
#[derive(Debug, Default)]
struct CacheIndex {
    /// Key (origin-relative URI) to cached response object
    entries: HashMap<String, CacheEntry>,
    /// Sum of live entries' payload lengths
    used_bytes: usize,
    /// Logical clock, bumped on every lookup (hit or miss)
    clock: u64,
    /// Performance counters
    stats: CacheStats,
}

impl ObjectCache {
    // == Constructor ==
    /// Creates an empty cache with the given byte capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            index: Mutex::new(CacheIndex::default()),
        }
    }

    // == Lookup ==
    /// Looks up a cached response by key.
    ///
    /// Advances the logical clock whether or not the key is present. On a
    /// hit the entry's `last_used` is bumped to the new clock value and a
    /// handle to the payload is returned. The handle keeps the payload
    /// memory alive even if the entry is evicted while the caller is still
    /// streaming it; dropping the handle releases the reference.
    pub fn lookup(&self, key: &str) -> Option<Bytes> {
        let mut index = self.lock();
        index.clock += 1;
        let now = index.clock;

        if let Some(entry) = index.entries.get_mut(key) {
            entry.last_used = now;
            let payload = entry.payload.clone();
            index.stats.record_hit();
            Some(payload)
        } else {
            index.stats.record_miss();
            None
        }
    }

    // == Store ==
    /// Inserts a newly fetched response under `key`.
    ///
    /// Existing entries are never replaced: a duplicate key reports
    /// `AlreadyPresent` and leaves the original payload and timestamp
    /// untouched. A payload that could never fit reports `ObjectTooLarge`.
    /// Otherwise least-recently-used entries are evicted until the new
    /// payload fits within capacity.
    pub fn store(&self, key: &str, payload: Bytes) -> Result<(), CacheError> {
        if payload.len() > self.capacity {
            return Err(CacheError::ObjectTooLarge {
                size: payload.len(),
                capacity: self.capacity,
            });
        }

        let mut index = self.lock();
        if index.entries.contains_key(key) {
            return Err(CacheError::AlreadyPresent(key.to_string()));
        }

        while index.used_bytes + payload.len() > self.capacity {
            index.evict_one();
        }

        let now = index.clock;
        index.used_bytes += payload.len();
        index
            .entries
            .insert(key.to_string(), CacheEntry::new(payload, now));
        index.stats.entries = index.entries.len();
        index.stats.used_bytes = index.used_bytes;
        Ok(())
    }

    // == Stats ==
    /// Returns a snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.lock().stats.clone()
    }

    // == Used Bytes ==
    /// Total payload bytes currently indexed.
    pub fn used_bytes(&self) -> usize {
        self.lock().used_bytes
    }

    // == Length ==
    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheIndex> {
        // Poisoning only happens if a thread panicked inside the critical
        // section, at which point the index can no longer be trusted.
        self.index.lock().expect("cache lock poisoned")
    }
}

impl CacheIndex {
    /// Removes the entry with the smallest `last_used` timestamp.
    ///
    /// O(n) scan per victim; ties go to the first entry encountered in
    /// index iteration order. Readers still holding a handle to the evicted
    /// payload keep the memory alive until the last handle drops.
    fn evict_one(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            if let Some(entry) = self.entries.remove(&key) {
                self.used_bytes -= entry.len();
                self.stats.record_eviction();
                self.stats.entries = self.entries.len();
                self.stats.used_bytes = self.used_bytes;
                debug!(key = %key, bytes = entry.len(), "evicted cache entry");
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn payload(len: usize) -> Bytes {
        Bytes::from(vec![b'x'; len])
    }

    #[test]
    fn test_cache_new() {
        let cache = ObjectCache::new(1024);
        assert!(cache.is_empty());
        assert_eq!(cache.used_bytes(), 0);
    }

    #[test]
    fn test_basic_hit_and_miss() {
        let cache = ObjectCache::new(1024);

        cache.store("/a.html", Bytes::from_static(b"hello")).unwrap();

        assert_eq!(cache.lookup("/a.html").unwrap(), Bytes::from_static(b"hello"));
        assert!(cache.lookup("/b.html").is_none());
    }

    #[test]
    fn test_roundtrip_exact_bytes() {
        let cache = ObjectCache::new(1024);
        let body = Bytes::from(vec![0u8, 1, 2, 255, 254, 0, 13, 10]);

        cache.store("/bin", body.clone()).unwrap();

        assert_eq!(cache.lookup("/bin").unwrap(), body);
    }

    #[test]
    fn test_duplicate_store_rejected() {
        let cache = ObjectCache::new(1024);

        cache.store("/a", Bytes::from_static(b"first")).unwrap();
        let result = cache.store("/a", Bytes::from_static(b"second"));

        assert_eq!(result, Err(CacheError::AlreadyPresent("/a".to_string())));
        // the original payload is untouched
        assert_eq!(cache.lookup("/a").unwrap(), Bytes::from_static(b"first"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_oversize_store_rejected() {
        let cache = ObjectCache::new(100);

        let result = cache.store("/huge", payload(101));

        assert_eq!(
            result,
            Err(CacheError::ObjectTooLarge {
                size: 101,
                capacity: 100
            })
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn test_used_bytes_accounting() {
        let cache = ObjectCache::new(1024);

        cache.store("/a", payload(10)).unwrap();
        cache.store("/b", payload(20)).unwrap();

        assert_eq!(cache.used_bytes(), 30);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_eviction_removes_oldest() {
        let cache = ObjectCache::new(120);

        cache.store("/a", payload(40)).unwrap();
        cache.store("/b", payload(40)).unwrap();
        cache.store("/c", payload(40)).unwrap();
        // establish distinct recency: a oldest, then b, then c
        cache.lookup("/a");
        cache.lookup("/b");
        cache.lookup("/c");
        cache.lookup("/a");
        cache.lookup("/b");
        cache.lookup("/c");

        // a fourth object needs exactly one eviction, and it must be /a
        cache.store("/d", payload(40)).unwrap();

        assert!(cache.lookup("/a").is_none());
        assert!(cache.lookup("/b").is_some());
        assert!(cache.lookup("/c").is_some());
        assert!(cache.lookup("/d").is_some());
        assert!(cache.used_bytes() <= 120);
    }

    #[test]
    fn test_eviction_frees_exactly_enough() {
        let cache = ObjectCache::new(100);

        cache.store("/a", payload(40)).unwrap();
        cache.store("/b", payload(40)).unwrap();
        cache.lookup("/a");
        cache.lookup("/b");

        // 80 + 90 requires evicting both
        cache.store("/c", payload(90)).unwrap();

        assert!(cache.lookup("/a").is_none());
        assert!(cache.lookup("/b").is_none());
        assert!(cache.lookup("/c").is_some());
        assert_eq!(cache.used_bytes(), 90);
    }

    #[test]
    fn test_lookup_refreshes_recency() {
        let cache = ObjectCache::new(100);

        cache.store("/a", payload(40)).unwrap();
        cache.store("/b", payload(40)).unwrap();
        // touch /a so /b becomes the eviction candidate
        cache.lookup("/a");

        cache.store("/c", payload(40)).unwrap();

        assert!(cache.lookup("/a").is_some());
        assert!(cache.lookup("/b").is_none());
        assert!(cache.lookup("/c").is_some());
    }

    #[test]
    fn test_handle_survives_eviction() {
        let cache = ObjectCache::new(100);
        let body = Bytes::from_static(b"still readable after eviction");

        cache.store("/a", body.clone()).unwrap();
        let handle = cache.lookup("/a").unwrap();

        // force /a out of the index while the handle is live
        cache.store("/b", payload(90)).unwrap();
        assert!(cache.lookup("/a").is_none());

        // the reader's view of the payload is unaffected
        assert_eq!(handle, body);
    }

    #[test]
    fn test_stats_counters() {
        let cache = ObjectCache::new(100);

        cache.store("/a", payload(60)).unwrap();
        cache.lookup("/a"); // hit
        cache.lookup("/gone"); // miss
        cache.store("/b", payload(60)).unwrap(); // evicts /a

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.used_bytes, 60);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(ObjectCache::new(500));
        let mut handles = Vec::new();

        for worker in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("/obj-{}", (worker * 50 + i) % 20);
                    let _ = cache.store(&key, Bytes::from(vec![b'x'; 40]));
                    if let Some(handle) = cache.lookup(&key) {
                        assert_eq!(handle.len(), 40);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.used_bytes() <= 500);
    }
}
