//! Paged node cache (§4.1): a bounded LRU of fixed-size node images shared
//! by both index kinds, with dirty write-back on eviction and flush.

mod lru;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

pub use lru::LruList;

use crate::error::{Result, StorageError};
use crate::page::NodeBuf;

/// What the cache writes a node back through and reads it from on a miss.
pub trait NodeCacheBackend {
    fn read_node(&self, node_id: u64) -> Result<NodeBuf>;
    fn write_node(&self, node_id: u64, buf: &NodeBuf) -> Result<()>;
}

/// A single resident node image plus its dirty flag.
pub struct CachedNode {
    pub node_id: u64,
    pub buf: NodeBuf,
    pub modified: bool,
}

/// Bounded LRU of `CachedNode`s backed by `B`.
pub struct NodeCache<B: NodeCacheBackend> {
    backend: B,
    capacity: usize,
    lru: RwLock<LruList<u64>>,
    entries: RwLock<HashMap<u64, Arc<RwLock<CachedNode>>>>,
}

impl<B: NodeCacheBackend> NodeCache<B> {
    pub fn new(backend: B, capacity: usize) -> Self {
        Self {
            backend,
            capacity,
            lru: RwLock::new(LruList::new(capacity)),
            entries: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Fetches a node, reading it from the backend on a cache miss.
    pub fn get(&self, node_id: u64) -> Result<Arc<RwLock<CachedNode>>> {
        if let Some(entry) = self.entries.read().get(&node_id) {
            let entry = entry.clone();
            self.lru.write().touch(node_id);
            return Ok(entry);
        }
        let buf = self.backend.read_node(node_id)?;
        let entry = Arc::new(RwLock::new(CachedNode {
            node_id,
            buf,
            modified: false,
        }));
        self.admit(node_id, entry.clone())?;
        Ok(entry)
    }

    /// Inserts a freshly created node (e.g. a newly allocated leaf), marked modified.
    pub fn insert_new(&self, node_id: u64, buf: NodeBuf) -> Result<Arc<RwLock<CachedNode>>> {
        let entry = Arc::new(RwLock::new(CachedNode {
            node_id,
            buf,
            modified: true,
        }));
        self.admit(node_id, entry.clone())?;
        Ok(entry)
    }

    fn admit(&self, node_id: u64, entry: Arc<RwLock<CachedNode>>) -> Result<()> {
        {
            let entries = self.entries.read();
            if entries.len() >= self.capacity && !entries.contains_key(&node_id) {
                drop(entries);
                if !self.evict_one()? {
                    return Err(StorageError::CacheCapacityExceeded);
                }
            }
        }
        self.entries.write().insert(node_id, entry);
        self.lru.write().touch(node_id);
        Ok(())
    }

    /// Evicts the coldest non-modified entry, triggering last-chance
    /// cleanup if every resident entry is currently dirty.
    fn evict_one(&self) -> Result<bool> {
        if self.try_evict_coldest_clean()? {
            return Ok(true);
        }
        if !self.last_chance_cleanup()? {
            // Nothing was dirty either: no candidate exists at all, avoid looping forever.
            return Ok(false);
        }
        self.try_evict_coldest_clean()
    }

    fn try_evict_coldest_clean(&self) -> Result<bool> {
        let order = self.lru.read().coldest_to_warmest();
        for node_id in order {
            let evictable = self
                .entries
                .read()
                .get(&node_id)
                .map(|e| !e.read().modified)
                .unwrap_or(false);
            if evictable {
                self.entries.write().remove(&node_id);
                self.lru.write().remove(&node_id);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Scans every resident entry and writes back dirty ones, clearing
    /// their modified flags. Returns whether anything was written.
    fn last_chance_cleanup(&self) -> Result<bool> {
        let snapshot: Vec<(u64, Arc<RwLock<CachedNode>>)> = self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        let mut saved = 0usize;
        for (node_id, entry) in snapshot {
            let mut guard = entry.write();
            if guard.modified {
                self.backend.write_node(node_id, &guard.buf)?;
                guard.modified = false;
                saved += 1;
            }
        }
        Ok(saved > 0)
    }

    /// Writes back every dirty entry, clearing modified flags. Unlike
    /// eviction, a per-entry write failure does not abort the scan: every
    /// entry is attempted, and failures are aggregated into a single
    /// returned error after the scan completes.
    pub fn flush(&self) -> Result<()> {
        let snapshot: Vec<(u64, Arc<RwLock<CachedNode>>)> = self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        let mut failed_count = 0usize;
        for (node_id, entry) in snapshot {
            let mut guard = entry.write();
            if guard.modified {
                match self.backend.write_node(node_id, &guard.buf) {
                    Ok(()) => guard.modified = false,
                    Err(_) => failed_count += 1,
                }
            }
        }
        if failed_count > 0 {
            Err(StorageError::CacheFlushFailed { failed_count })
        } else {
            Ok(())
        }
    }
}

impl<B> Drop for NodeCache<B>
where
    B: NodeCacheBackend,
{
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MemBackend {
        writes: AtomicUsize,
        fail_writes: bool,
    }

    impl NodeCacheBackend for MemBackend {
        fn read_node(&self, _node_id: u64) -> Result<NodeBuf> {
            Ok(NodeBuf::zeroed())
        }

        fn write_node(&self, _node_id: u64, _buf: &NodeBuf) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                Err(StorageError::Io(std::io::Error::other("boom")))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_get_miss_then_hit() {
        let backend = MemBackend {
            writes: AtomicUsize::new(0),
            fail_writes: false,
        };
        let cache = NodeCache::new(backend, 4);
        let a = cache.get(1).unwrap();
        let b = cache.get(1).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_eviction_of_clean_entry() {
        let backend = MemBackend {
            writes: AtomicUsize::new(0),
            fail_writes: false,
        };
        let cache = NodeCache::new(backend, 2);
        cache.get(1).unwrap();
        cache.get(2).unwrap();
        cache.get(3).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(!cache.entries.read().contains_key(&1));
    }

    #[test]
    fn test_last_chance_cleanup_on_all_dirty() {
        let backend = MemBackend {
            writes: AtomicUsize::new(0),
            fail_writes: false,
        };
        let cache = NodeCache::new(backend, 2);
        cache.insert_new(1, NodeBuf::zeroed()).unwrap();
        cache.insert_new(2, NodeBuf::zeroed()).unwrap();
        // Both entries are dirty; inserting a third forces last-chance cleanup.
        cache.insert_new(3, NodeBuf::zeroed()).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.backend().writes.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_flush_aggregates_failures() {
        let backend = MemBackend {
            writes: AtomicUsize::new(0),
            fail_writes: true,
        };
        let cache = NodeCache::new(backend, 4);
        cache.insert_new(1, NodeBuf::zeroed()).unwrap();
        cache.insert_new(2, NodeBuf::zeroed()).unwrap();
        let result = cache.flush();
        assert!(matches!(result, Err(StorageError::CacheFlushFailed { failed_count: 2 })));
    }

    #[test]
    fn test_flush_clears_modified_flags() {
        let backend = MemBackend {
            writes: AtomicUsize::new(0),
            fail_writes: false,
        };
        let cache = NodeCache::new(backend, 4);
        let entry = cache.insert_new(1, NodeBuf::zeroed()).unwrap();
        assert!(entry.read().modified);
        cache.flush().unwrap();
        assert!(!entry.read().modified);
    }
}
