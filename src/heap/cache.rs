//! Bounded cache of decompressed heap chunks.

use crate::error::Result;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::trace;

/// Least-recently-used cache keyed by chunk index.
///
/// The whole cache is locked while a missing chunk is loaded, so two readers
/// asking for the same chunk never decompress it twice.
#[derive(Debug)]
pub struct ChunkCache {
    entries: Mutex<LruCache<usize, Arc<Vec<u8>>>>,
}

impl ChunkCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Does not count as a use.
    pub fn contains(&self, index: usize) -> bool {
        self.entries.lock().contains(&index)
    }

    /// Return the cached chunk, or run `load` and remember its result.
    /// A failed load is not cached.
    pub fn get_or_load<F>(&self, index: usize, load: F) -> Result<Arc<Vec<u8>>>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        let mut entries = self.entries.lock();

        if let Some(data) = entries.get(&index) {
            return Ok(Arc::clone(data));
        }

        trace!(chunk = index, "heap chunk cache miss");
        let data = Arc::new(load()?);

        if let Some((evicted, _)) = entries.push(index, Arc::clone(&data)) {
            trace!(chunk = evicted, "evicting heap chunk");
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HpkError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_hit_does_not_reload() {
        let cache = ChunkCache::new(3);
        let loads = AtomicUsize::new(0);
        let load = || {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1, 2, 3])
        };

        let first = cache.get_or_load(0, load).unwrap();
        let second = cache
            .get_or_load(0, || panic!("chunk 0 should be cached"))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = ChunkCache::new(2);
        cache.get_or_load(0, || Ok(vec![0])).unwrap();
        cache.get_or_load(1, || Ok(vec![1])).unwrap();
        // touch 0 so that 1 becomes the oldest
        cache.get_or_load(0, || Ok(vec![0])).unwrap();
        cache.get_or_load(2, || Ok(vec![2])).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(0));
        assert!(!cache.contains(1));
        assert!(cache.contains(2));
    }

    #[test]
    fn test_contains_keeps_order() {
        let cache = ChunkCache::new(2);
        cache.get_or_load(0, || Ok(vec![0])).unwrap();
        cache.get_or_load(1, || Ok(vec![1])).unwrap();
        assert!(cache.contains(0));
        cache.get_or_load(2, || Ok(vec![2])).unwrap();

        assert!(!cache.contains(0));
        assert!(cache.contains(1));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = ChunkCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.get_or_load(0, || Ok(vec![0])).unwrap();
        cache.get_or_load(1, || Ok(vec![1])).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(1));
    }

    #[test]
    fn test_failed_load_not_cached() {
        let cache = ChunkCache::new(3);
        let result = cache.get_or_load(5, || Err(HpkError::Format("bad".into())));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_same_key_loads_once() {
        let cache = Arc::new(ChunkCache::new(3));
        let loads = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let loads = Arc::clone(&loads);
                std::thread::spawn(move || {
                    cache
                        .get_or_load(7, || {
                            loads.fetch_add(1, Ordering::SeqCst);
                            Ok(vec![7; 16])
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().len(), 16);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
