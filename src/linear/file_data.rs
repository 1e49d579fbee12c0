//! A single linear-index data file: its own node cache, independent of
//! every other file's cache (§4.3 File cache / Node cache).
//!
//! Constructor argument order is `(owner, file_id, file)` per the
//! disambiguation of the header/implementation mismatch noted for this
//! type in the supplied source.

use std::path::PathBuf;

use crate::cache::NodeCache;
use crate::error::{IndexIdentity, Result};
use crate::node_store::FileNodeStore;
use std::fs::File;

pub struct FileData {
    owner: IndexIdentity,
    file_id: u64,
    cache: NodeCache<FileNodeStore>,
}

impl FileData {
    pub fn new(owner: IndexIdentity, file_id: u64, file: File, path: PathBuf, node_cache_capacity: usize) -> Self {
        let store = FileNodeStore::new(file, path);
        Self {
            owner,
            file_id,
            cache: NodeCache::new(store, node_cache_capacity),
        }
    }

    pub fn owner(&self) -> IndexIdentity {
        self.owner
    }

    pub fn file_id(&self) -> u64 {
        self.file_id
    }

    pub fn cache(&self) -> &NodeCache<FileNodeStore> {
        &self.cache
    }

    pub fn flush(&self) -> Result<()> {
        self.cache.flush()
    }
}
