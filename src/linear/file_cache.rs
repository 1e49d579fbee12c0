//! Bounded LRU of open `FileData` handles (§4.3 File cache). Unlike the
//! paged node cache, eviction here does no write-back of its own: the
//! dirty state lives in each file's own node cache, which flushes itself
//! (best-effort) when its owning `FileData` is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::cache::LruList;

use super::file_data::FileData;

pub struct FileCache {
    capacity: usize,
    lru: RwLock<LruList<u64>>,
    files: RwLock<HashMap<u64, Arc<FileData>>>,
}

impl FileCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lru: RwLock::new(LruList::new(capacity)),
            files: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    pub fn get(&self, file_id: u64) -> Option<Arc<FileData>> {
        let found = self.files.read().get(&file_id).cloned();
        if found.is_some() {
            self.lru.write().touch(file_id);
        }
        found
    }

    pub fn insert(&self, file_id: u64, data: Arc<FileData>) {
        let needs_eviction = {
            let files = self.files.read();
            files.len() >= self.capacity && !files.contains_key(&file_id)
        };
        if needs_eviction {
            if let Some(coldest) = self.lru.write().pop_coldest() {
                self.files.write().remove(&coldest);
            }
        }
        self.files.write().insert(file_id, data);
        self.lru.write().touch(file_id);
    }

    pub fn resident(&self) -> Vec<Arc<FileData>> {
        self.files.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexIdentity;
    use std::fs::OpenOptions;

    fn dummy_file_data(dir: &std::path::Path, file_id: u64) -> Arc<FileData> {
        let path = dir.join(format!("f{file_id}.dat"));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        file.set_len(8192 * 2).unwrap();
        Arc::new(FileData::new(
            IndexIdentity::new([0u8; 16], 1, 1),
            file_id,
            file,
            path,
            4,
        ))
    }

    #[test]
    fn test_insert_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(2);
        cache.insert(1, dummy_file_data(dir.path(), 1));
        assert!(cache.get(1).is_some());
    }

    #[test]
    fn test_evicts_coldest_at_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(2);
        cache.insert(1, dummy_file_data(dir.path(), 1));
        cache.insert(2, dummy_file_data(dir.path(), 2));
        cache.insert(3, dummy_file_data(dir.path(), 3));
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
    }
}
