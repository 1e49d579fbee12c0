//! B+ tree index over a single file of fixed-size nodes (§4.2).
//!
//! Node 0 is reserved: its first 8 bytes hold the root node id, overwriting
//! whatever `IndexFileHeaderBase` bytes were written there at create time —
//! this mirrors the source's write order exactly and means the header is
//! never re-read on open, only the root id.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::cache::{NodeCache, NodeCacheBackend};
use crate::codec::{IndexFileHeaderBase, IndexType, INDEX_FILE_HEADER_SIZE};
use crate::config::{StorageConfig, NODE_SIZE};
use crate::error::{IndexIdentity, Result, StorageError};
use crate::fsutil;
use crate::node_store::FileNodeStore;
use crate::page::NodeBuf;

use super::header::{CommonNodeHeader, LeafHeader, NodeHeader, NodeType};
use super::node::{leaf_insert_at, BTreeLayout, LeafEntries};

/// Total order over serialized key bytes, supplied by the table layer.
pub type CompareFn = Arc<dyn Fn(&[u8], &[u8]) -> Ordering + Send + Sync>;

struct Descent {
    leaf_id: u64,
}

pub struct BPlusTree {
    identity: IndexIdentity,
    path: PathBuf,
    layout: BTreeLayout,
    compare: CompareFn,
    cache: NodeCache<FileNodeStore>,
    root_node_id: RwLock<u64>,
    node_count: RwLock<u64>,
    next_free_node_id: RwLock<u64>,
}

impl BPlusTree {
    /// Creates a new, empty tree: header + single root-leaf node, with
    /// `root_node_id = 1` stamped over the header's first 8 bytes.
    pub fn create(
        config: &StorageConfig,
        identity: IndexIdentity,
        key_size: usize,
        value_size: usize,
        compare: CompareFn,
    ) -> Result<Self> {
        let path = config.data_file_path(0);
        let size = 2 * NODE_SIZE as u64;
        std::fs::create_dir_all(&config.data_dir)?;
        let file = fsutil::create_data_file(&config.data_dir, &path, size, config.sync_on_write)?;

        let mut header_buf = NodeBuf::zeroed();
        let header = IndexFileHeaderBase::new(
            IndexType::BPlusTree,
            identity.database_uuid,
            identity.table_id,
            identity.index_id,
        );
        header.serialize(&mut header_buf.as_bytes_mut()[..INDEX_FILE_HEADER_SIZE]);

        let store = FileNodeStore::new(file, path.clone());
        store.write_node(0, &header_buf)?;

        let mut root_buf = NodeBuf::zeroed();
        let root_header = LeafHeader {
            common: CommonNodeHeader {
                node_type: NodeType::RootLeaf,
                node_id: 1,
                entry_count: 0,
            },
            prev_node_id: 0,
            next_node_id: 0,
        };
        root_header.serialize(root_buf.as_bytes_mut());
        store.write_node(1, &root_buf)?;

        // Root id write happens last and overwrites the header's first 8 bytes.
        let mut stamped = store.read_node(0)?;
        stamped.as_bytes_mut()[..8].copy_from_slice(&1u64.to_be_bytes());
        store.write_node(0, &stamped)?;

        fsutil::write_init_flag(&config.init_flag_path())?;

        let layout = BTreeLayout::new(key_size, value_size);
        let cache = NodeCache::new(store, config.node_cache_capacity);

        Ok(Self {
            identity,
            path,
            layout,
            compare,
            cache,
            root_node_id: RwLock::new(1),
            node_count: RwLock::new(1),
            next_free_node_id: RwLock::new(2),
        })
    }

    /// Opens an existing tree file. Per §4.2 Open, the header is not
    /// re-validated here — only the root node id is read, and the faulted
    /// root's type tag is checked.
    pub fn open(
        config: &StorageConfig,
        identity: IndexIdentity,
        key_size: usize,
        value_size: usize,
        compare: CompareFn,
    ) -> Result<Self> {
        if !fsutil::is_initialized(&config.init_flag_path()) {
            return Err(StorageError::NotInitialized {
                path: config.data_dir.clone(),
            });
        }
        let path = config.data_file_path(0);
        let file = fsutil::open_data_file(&path, config.sync_on_write)?;
        let size = file.metadata()?.len();
        if size % NODE_SIZE as u64 != 0 || size < 2 * NODE_SIZE as u64 {
            return Err(StorageError::file_corrupted(
                path,
                format!("file size {size} is not a valid multiple of node size"),
            ));
        }
        let node_count = size / NODE_SIZE as u64 - 1;

        let store = FileNodeStore::new(file, path.clone());
        let header_buf = store.read_node(0)?;
        let root_node_id = u64::from_be_bytes(header_buf.as_bytes()[..8].try_into().unwrap());

        let layout = BTreeLayout::new(key_size, value_size);
        let cache = NodeCache::new(store, config.node_cache_capacity);

        let root_entry = cache.get(root_node_id)?;
        let root_header = NodeHeader::read(&root_entry.read().buf, &path)?;
        if !root_header.common().node_type.is_root() {
            return Err(StorageError::node_corrupted(
                path,
                root_node_id,
                "cannot find index root",
            ));
        }

        Ok(Self {
            identity,
            path,
            layout,
            compare,
            cache,
            root_node_id: RwLock::new(root_node_id),
            node_count: RwLock::new(node_count),
            next_free_node_id: RwLock::new(node_count + 1),
        })
    }

    pub fn identity(&self) -> IndexIdentity {
        self.identity
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        (self.compare)(a, b)
    }

    /// Descends from the root to the leaf that would hold `key`, following
    /// the 3-case rule of §4.2 at every internal node: left of the first
    /// separator, right of the last, or between two adjacent separators.
    fn descend_to_leaf(&self, key: &[u8]) -> Result<Descent> {
        let mut node_id = *self.root_node_id.read();
        loop {
            let entry = self.cache.get(node_id)?;
            let guard = entry.read();
            let header = NodeHeader::read(&guard.buf, &self.path)?;
            match header {
                NodeHeader::Leaf(_) => {
                    drop(guard);
                    return Ok(Descent { leaf_id: node_id });
                }
                NodeHeader::Internal(common) => {
                    let next = self.select_child(&guard.buf, common.entry_count as usize, key)?;
                    drop(guard);
                    node_id = next;
                }
            }
        }
    }

    /// Entry `i` owns the half-open-below range `(key(i-1), key(i)]`, with
    /// `key(-1)` taken as `-infinity`; the last entry's child also absorbs
    /// everything past `key(n-1)`, since it's the rightmost child. Scanning
    /// for the first separator the key doesn't exceed covers every gap
    /// exactly once, so there's no case left to fall through to.
    fn select_child(&self, buf: &NodeBuf, n: usize, key: &[u8]) -> Result<u64> {
        use super::node::InternalEntries;
        if n == 0 {
            return Err(StorageError::node_corrupted(
                self.path.clone(),
                0,
                "internal node has no entries",
            ));
        }
        let entries = InternalEntries::new(buf, &self.layout, n);
        for i in 0..n {
            if self.compare(key, entries.key(i)) != Ordering::Greater {
                return Ok(entries.child(i));
            }
        }
        Ok(entries.child(n - 1))
    }

    /// Inserts `(key, value)`. Returns `false` if the key already exists.
    pub fn insert(&self, key: &[u8], value: &[u8]) -> Result<bool> {
        if key.len() != self.layout.key_size {
            return Err(StorageError::InvalidKeySize { actual: key.len() });
        }
        if value.len() != self.layout.value_size {
            return Err(StorageError::InvalidValueSize {
                actual: value.len(),
                max: self.layout.value_size,
            });
        }
        let descent = self.descend_to_leaf(key)?;
        let entry = self.cache.get(descent.leaf_id)?;
        let mut guard = entry.write();
        let header = LeafHeader::deserialize(&guard.buf, &self.path)?;
        let count = header.common.entry_count as usize;

        let index = {
            let entries = LeafEntries::new(&guard.buf, &self.layout, count);
            entries.binary_search_by(|k| self.compare(k, key))
        };
        let index = match index {
            Ok(_) => return Ok(false),
            Err(index) => index,
        };

        if count >= self.layout.branching_factor {
            drop(guard);
            return Err(StorageError::NotImplemented {
                operation: "insert into a full leaf (node split)",
            });
        }

        leaf_insert_at(&mut guard.buf, &self.layout, count, index, key, value);
        let new_header = LeafHeader {
            common: CommonNodeHeader {
                entry_count: (count + 1) as u32,
                ..header.common
            },
            ..header
        };
        new_header.serialize(guard.buf.as_bytes_mut());
        guard.modified = true;
        Ok(true)
    }

    /// Looks up `key`, returning its value if present.
    pub fn find(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let descent = self.descend_to_leaf(key)?;
        let entry = self.cache.get(descent.leaf_id)?;
        let guard = entry.read();
        let common = CommonNodeHeader::deserialize(&guard.buf, &self.path)?;
        let count = common.entry_count as usize;
        let entries = LeafEntries::new(&guard.buf, &self.layout, count);
        match entries.binary_search_by(|k| self.compare(k, key)) {
            Ok(idx) => Ok(Some(entries.value(idx).to_vec())),
            Err(_) => Ok(None),
        }
    }

    /// Returns `1` if `key` is present, `0` otherwise.
    pub fn count(&self, key: &[u8]) -> Result<usize> {
        Ok(self.find(key)?.map(|_| 1).unwrap_or(0))
    }

    /// Walks leftmost children down to the leftmost leaf's first key.
    pub fn get_min_key(&self) -> Result<Option<Vec<u8>>> {
        self.extreme_key(true)
    }

    /// Walks rightmost children down to the rightmost leaf's last key.
    pub fn get_max_key(&self) -> Result<Option<Vec<u8>>> {
        self.extreme_key(false)
    }

    fn extreme_key(&self, leftmost: bool) -> Result<Option<Vec<u8>>> {
        let mut node_id = *self.root_node_id.read();
        loop {
            let entry = self.cache.get(node_id)?;
            let guard = entry.read();
            let header = NodeHeader::read(&guard.buf, &self.path)?;
            match header {
                NodeHeader::Leaf(leaf) => {
                    let count = leaf.common.entry_count as usize;
                    if count == 0 {
                        return Ok(None);
                    }
                    let entries = LeafEntries::new(&guard.buf, &self.layout, count);
                    let idx = if leftmost { 0 } else { count - 1 };
                    return Ok(Some(entries.key(idx).to_vec()));
                }
                NodeHeader::Internal(common) => {
                    use super::node::InternalEntries;
                    let n = common.entry_count as usize;
                    if n == 0 {
                        return Ok(None);
                    }
                    let entries = InternalEntries::new(&guard.buf, &self.layout, n);
                    let idx = if leftmost { 0 } else { n - 1 };
                    let next = entries.child(idx);
                    drop(guard);
                    node_id = next;
                }
            }
        }
    }

    /// Allocates a new node id, reusing a freed slot if one is pending
    /// (§4.2 Insert; never exercised today since `erase` is a stub and so
    /// nothing is ever freed).
    #[allow(dead_code)]
    fn get_new_node(&self) -> u64 {
        let node_count = *self.node_count.read();
        let mut next_free = self.next_free_node_id.write();
        let id = if *next_free <= node_count {
            *next_free
        } else {
            let mut count = self.node_count.write();
            *count += 1;
            *count
        };
        *next_free += 1;
        id
    }

    /// Stub per §9 open question 1: full-node split is a design hole in
    /// the supplied source.
    pub fn erase(&self, _key: &[u8]) -> Result<usize> {
        Err(StorageError::NotImplemented { operation: "erase" })
    }

    pub fn update(&self, _key: &[u8], _value: &[u8]) -> Result<usize> {
        Err(StorageError::NotImplemented { operation: "update" })
    }

    pub fn find_first(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        Err(StorageError::NotImplemented { operation: "find_first" })
    }

    pub fn find_last(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        Err(StorageError::NotImplemented { operation: "find_last" })
    }

    pub fn find_prev(&self, _key: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        Err(StorageError::NotImplemented { operation: "find_prev" })
    }

    pub fn find_next(&self, _key: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        Err(StorageError::NotImplemented { operation: "find_next" })
    }

    pub fn flush(&self) -> Result<()> {
        self.cache.flush()
    }

    /// Read-only tree walk into a serializable summary, generalized from
    /// the slotted-page tree export to this layout's fixed-stride entries.
    pub fn debug_dump(&self) -> Result<DebugNode> {
        let root = *self.root_node_id.read();
        self.debug_dump_node(root)
    }

    fn debug_dump_node(&self, node_id: u64) -> Result<DebugNode> {
        let entry = self.cache.get(node_id)?;
        let guard = entry.read();
        let header = NodeHeader::read(&guard.buf, &self.path)?;
        match header {
            NodeHeader::Leaf(leaf) => {
                let count = leaf.common.entry_count as usize;
                let entries = LeafEntries::new(&guard.buf, &self.layout, count);
                let keys = (0..count).map(|i| entries.key(i).to_vec()).collect();
                Ok(DebugNode {
                    node_id,
                    is_leaf: true,
                    keys,
                    children: Vec::new(),
                })
            }
            NodeHeader::Internal(common) => {
                use super::node::InternalEntries;
                let n = common.entry_count as usize;
                let entries = InternalEntries::new(&guard.buf, &self.layout, n);
                let keys: Vec<Vec<u8>> = (0..n).map(|i| entries.key(i).to_vec()).collect();
                let child_ids: Vec<u64> = (0..n).map(|i| entries.child(i)).collect();
                drop(guard);
                let mut children = Vec::with_capacity(child_ids.len());
                for child_id in child_ids {
                    children.push(self.debug_dump_node(child_id)?);
                }
                Ok(DebugNode {
                    node_id,
                    is_leaf: false,
                    keys,
                    children,
                })
            }
        }
    }
}

/// Serializable node summary produced by `BPlusTree::debug_dump`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DebugNode {
    pub node_id: u64,
    pub is_leaf: bool,
    #[serde(with = "hex_keys")]
    pub keys: Vec<Vec<u8>>,
    pub children: Vec<DebugNode>,
}

mod hex_keys {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(keys: &[Vec<u8>], ser: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        let mut seq = ser.serialize_seq(Some(keys.len()))?;
        for key in keys {
            let hex: String = key.iter().map(|b| format!("{b:02x}")).collect();
            seq.serialize_element(&hex)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u64_compare() -> CompareFn {
        Arc::new(|a: &[u8], b: &[u8]| {
            let a = u64::from_be_bytes(a.try_into().unwrap());
            let b = u64::from_be_bytes(b.try_into().unwrap());
            a.cmp(&b)
        })
    }

    fn open_fresh() -> (tempfile::TempDir, BPlusTree) {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(dir.path());
        let identity = IndexIdentity::new([1u8; 16], 7, 42);
        let tree = BPlusTree::create(&config, identity, 8, 8, u64_compare()).unwrap();
        (dir, tree)
    }

    #[test]
    fn test_create_then_insert_find() {
        let (_dir, tree) = open_fresh();
        assert!(tree.insert(&10u64.to_be_bytes(), &100u64.to_be_bytes()).unwrap());
        assert_eq!(
            tree.find(&10u64.to_be_bytes()).unwrap(),
            Some(100u64.to_be_bytes().to_vec())
        );
        assert_eq!(tree.find(&11u64.to_be_bytes()).unwrap(), None);
    }

    #[test]
    fn test_duplicate_insert_returns_false() {
        let (_dir, tree) = open_fresh();
        assert!(tree.insert(&1u64.to_be_bytes(), &1u64.to_be_bytes()).unwrap());
        assert!(!tree.insert(&1u64.to_be_bytes(), &2u64.to_be_bytes()).unwrap());
    }

    #[test]
    fn test_min_max_keys_track_inserts() {
        let (_dir, tree) = open_fresh();
        for k in [5u64, 1, 9, 3] {
            tree.insert(&k.to_be_bytes(), &0u64.to_be_bytes()).unwrap();
        }
        assert_eq!(tree.get_min_key().unwrap(), Some(1u64.to_be_bytes().to_vec()));
        assert_eq!(tree.get_max_key().unwrap(), Some(9u64.to_be_bytes().to_vec()));
    }

    #[test]
    fn test_reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(dir.path());
        let identity = IndexIdentity::new([2u8; 16], 1, 1);
        {
            let tree = BPlusTree::create(&config, identity, 8, 8, u64_compare()).unwrap();
            tree.insert(&42u64.to_be_bytes(), &99u64.to_be_bytes()).unwrap();
            tree.flush().unwrap();
        }
        let tree = BPlusTree::open(&config, identity, 8, 8, u64_compare()).unwrap();
        assert_eq!(
            tree.find(&42u64.to_be_bytes()).unwrap(),
            Some(99u64.to_be_bytes().to_vec())
        );
    }

    #[test]
    fn test_erase_and_update_are_stubs() {
        let (_dir, tree) = open_fresh();
        assert!(matches!(
            tree.erase(&1u64.to_be_bytes()),
            Err(StorageError::NotImplemented { .. })
        ));
        assert!(matches!(
            tree.update(&1u64.to_be_bytes(), &1u64.to_be_bytes()),
            Err(StorageError::NotImplemented { .. })
        ));
    }

    #[test]
    fn test_debug_dump_reports_leaf_keys() {
        let (_dir, tree) = open_fresh();
        tree.insert(&1u64.to_be_bytes(), &0u64.to_be_bytes()).unwrap();
        let dump = tree.debug_dump().unwrap();
        assert!(dump.is_leaf);
        assert_eq!(dump.keys.len(), 1);
    }
}
