//! Unique linear index (§4.3): a numeric key deterministically addresses a
//! record slot across one or more fixed-size data files.

use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::codec::{IndexFileHeaderBase, IndexType, INDEX_FILE_HEADER_SIZE};
use crate::config::{StorageConfig, NODE_SIZE};
use crate::error::{IndexIdentity, Result, StorageError};
use crate::fsutil;
use crate::page::NodeBuf;

use super::file_cache::FileCache;
use super::file_data::FileData;
use super::node::{decode_key, encode_key, FileAddress, RecordLayout, ValueState};

/// ASC/DESC flag carried by the indexed column (§4.3 Sort direction).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

pub struct UniqueLinearIndex {
    identity: IndexIdentity,
    config: StorageConfig,
    key_width: usize,
    value_size: usize,
    signed: bool,
    direction: SortDirection,
    layout: RecordLayout,
    file_ids: RwLock<BTreeSet<u64>>,
    file_cache: FileCache,
    min_key: RwLock<Option<u64>>,
    max_key: RwLock<Option<u64>>,
}

impl UniqueLinearIndex {
    pub fn create(
        config: StorageConfig,
        identity: IndexIdentity,
        key_width: usize,
        value_size: usize,
        signed: bool,
        direction: SortDirection,
    ) -> Result<Self> {
        if ![1, 2, 4, 8].contains(&key_width) {
            return Err(StorageError::InvalidKeySize { actual: key_width });
        }
        fs::create_dir_all(&config.data_dir)?;
        fsutil::write_init_flag(&config.init_flag_path())?;
        let file_cache_capacity = config.file_cache_capacity;
        Ok(Self {
            identity,
            config,
            key_width,
            value_size,
            signed,
            direction,
            layout: RecordLayout::new(value_size),
            file_ids: RwLock::new(BTreeSet::new()),
            file_cache: FileCache::new(file_cache_capacity),
            min_key: RwLock::new(None),
            max_key: RwLock::new(None),
        })
    }

    pub fn open(
        config: StorageConfig,
        identity: IndexIdentity,
        key_width: usize,
        value_size: usize,
        signed: bool,
        direction: SortDirection,
    ) -> Result<Self> {
        if !fsutil::is_initialized(&config.init_flag_path()) {
            return Err(StorageError::NotInitialized {
                path: config.data_dir.clone(),
            });
        }
        let file_ids = scan_file_ids(&config)?;
        let file_cache_capacity = config.file_cache_capacity;
        let index = Self {
            identity,
            config,
            key_width,
            value_size,
            signed,
            direction,
            layout: RecordLayout::new(value_size),
            file_ids: RwLock::new(file_ids),
            file_cache: FileCache::new(file_cache_capacity),
            min_key: RwLock::new(None),
            max_key: RwLock::new(None),
        };
        let (min, max) = index.scan_extrema()?;
        *index.min_key.write() = min;
        *index.max_key.write() = max;
        Ok(index)
    }

    pub fn identity(&self) -> IndexIdentity {
        self.identity
    }

    fn validate_key(&self, key: &[u8]) -> Result<()> {
        if key.len() != self.key_width {
            return Err(StorageError::InvalidKeySize { actual: key.len() });
        }
        Ok(())
    }

    fn validate_value(&self, value: &[u8]) -> Result<()> {
        if value.len() != self.value_size {
            return Err(StorageError::InvalidValueSize {
                actual: value.len(),
                max: self.value_size,
            });
        }
        Ok(())
    }

    fn numeric(&self, key: &[u8]) -> u64 {
        decode_key(key, self.key_width, self.signed)
    }

    fn denumeric(&self, key: u64) -> Vec<u8> {
        let mut out = vec![0u8; self.key_width];
        encode_key(key, self.key_width, self.signed, &mut out);
        out
    }

    fn max_possible(&self) -> u64 {
        if self.key_width == 8 {
            u64::MAX
        } else {
            (1u64 << (self.key_width * 8)) - 1
        }
    }

    fn address(&self, k: u64) -> FileAddress {
        FileAddress::for_key(k, self.layout.records_per_node, self.config.linear_nodes_per_file)
    }

    fn first_key_of_file(&self, file_id: u64) -> u64 {
        (file_id - 1) * self.config.linear_nodes_per_file * self.layout.records_per_node
    }

    fn last_key_of_file(&self, file_id: u64) -> u64 {
        file_id * self.config.linear_nodes_per_file * self.layout.records_per_node - 1
    }

    /// Opens (without creating) the file backing `file_id`, if it exists on
    /// disk or is already resident. `None` means the key space it would
    /// cover has never been written.
    fn file_for_read(&self, file_id: u64) -> Result<Option<Arc<FileData>>> {
        if let Some(fd) = self.file_cache.get(file_id) {
            return Ok(Some(fd));
        }
        if !self.file_ids.read().contains(&file_id) {
            return Ok(None);
        }
        let path = self.config.data_file_path(file_id);
        let file = fsutil::open_data_file(&path, self.config.sync_on_write)?;
        self.validate_file_header(&file, &path)?;
        let fd = Arc::new(FileData::new(
            self.identity,
            file_id,
            file,
            path,
            self.config.node_cache_capacity,
        ));
        self.file_cache.insert(file_id, fd.clone());
        Ok(Some(fd))
    }

    /// Opens the file backing `file_id`, creating it (header + zero-filled
    /// nodes) if this is the first touch (§4.3 Creation).
    fn file_for_insert(&self, file_id: u64) -> Result<Arc<FileData>> {
        if let Some(fd) = self.file_cache.get(file_id) {
            return Ok(fd);
        }
        let path = self.config.data_file_path(file_id);
        let is_new = !self.file_ids.read().contains(&file_id);
        let file = if is_new {
            self.create_file(&path)?
        } else {
            let file = fsutil::open_data_file(&path, self.config.sync_on_write)?;
            self.validate_file_header(&file, &path)?;
            file
        };
        let fd = Arc::new(FileData::new(
            self.identity,
            file_id,
            file,
            path,
            self.config.node_cache_capacity,
        ));
        self.file_cache.insert(file_id, fd.clone());
        self.file_ids.write().insert(file_id);
        Ok(fd)
    }

    fn create_file(&self, path: &std::path::Path) -> Result<std::fs::File> {
        use std::io::{Seek, SeekFrom, Write};
        let size = (self.config.linear_nodes_per_file + 1) * NODE_SIZE as u64;
        let file = fsutil::create_data_file(&self.config.data_dir, path, size, self.config.sync_on_write)?;
        let mut header_buf = NodeBuf::zeroed();
        let header = IndexFileHeaderBase::new(
            IndexType::UniqueLinear,
            self.identity.database_uuid,
            self.identity.table_id,
            self.identity.index_id,
        );
        header.serialize(&mut header_buf.as_bytes_mut()[..INDEX_FILE_HEADER_SIZE]);
        {
            let mut f = file.try_clone()?;
            f.seek(SeekFrom::Start(0))
                .map_err(|e| StorageError::cannot_write(path.to_path_buf(), 0, NODE_SIZE, e))?;
            f.write_all(header_buf.as_bytes())
                .map_err(|e| StorageError::cannot_write(path.to_path_buf(), 0, NODE_SIZE, e))?;
            f.sync_data().map_err(StorageError::from)?;
        }
        // `set_len` already zero-fills the remaining nodes; nothing further to write.
        Ok(file)
    }

    /// Per-file header is not overwritten the way the B+ tree's node 0 is,
    /// so it is validated in full on every open.
    fn validate_file_header(&self, file: &std::fs::File, path: &std::path::Path) -> Result<()> {
        use std::io::{Read, Seek, SeekFrom};
        let mut buf = [0u8; INDEX_FILE_HEADER_SIZE];
        let mut f = file.try_clone()?;
        f.seek(SeekFrom::Start(0))
            .map_err(|e| StorageError::cannot_read(path.to_path_buf(), 0, INDEX_FILE_HEADER_SIZE, e))?;
        f.read_exact(&mut buf)
            .map_err(|e| StorageError::cannot_read(path.to_path_buf(), 0, INDEX_FILE_HEADER_SIZE, e))?;
        let header = IndexFileHeaderBase::deserialize(&buf, IndexType::UniqueLinear, path)?;
        if header.database_uuid != self.identity.database_uuid
            || header.table_id != self.identity.table_id
            || header.index_id != self.identity.index_id
        {
            return Err(StorageError::file_corrupted(
                path.to_path_buf(),
                "file header identity does not match this index",
            ));
        }
        Ok(())
    }

    /// `insert(key, value, replace_existing)` (§4.3 Operations table).
    pub fn insert(&self, key: &[u8], value: &[u8], replace_existing: bool) -> Result<bool> {
        self.validate_key(key)?;
        self.validate_value(value)?;
        let k = self.numeric(key);
        let addr = self.address(k);
        let fd = self.file_for_insert(addr.file_id)?;
        let entry = fd.cache().get(addr.node_id_in_file)?;
        let was_exists = {
            let mut guard = entry.write();
            let offset = self.layout.offset_in_node(k);
            let status = ValueState::from_byte(guard.buf.as_bytes()[offset]);
            let was_exists = status == Some(ValueState::Exists);
            if !was_exists || replace_existing {
                guard.buf.as_bytes_mut()[offset] = ValueState::Exists as u8;
                let value_start = offset + 1;
                guard.buf.as_bytes_mut()[value_start..value_start + self.value_size].copy_from_slice(value);
                guard.modified = true;
            }
            was_exists
        };
        let inserted = !was_exists;
        if inserted {
            self.extend_min_max(k);
        }
        Ok(inserted)
    }

    pub fn erase(&self, key: &[u8]) -> Result<usize> {
        self.validate_key(key)?;
        let k = self.numeric(key);
        let addr = self.address(k);
        let Some(fd) = self.file_for_read(addr.file_id)? else {
            return Ok(0);
        };
        let entry = fd.cache().get(addr.node_id_in_file)?;
        let had_entry = {
            let mut guard = entry.write();
            let offset = self.layout.offset_in_node(k);
            if ValueState::from_byte(guard.buf.as_bytes()[offset]) != Some(ValueState::Exists) {
                false
            } else {
                guard.buf.as_bytes_mut()[offset] = ValueState::Free as u8;
                guard.modified = true;
                true
            }
        };
        if had_entry {
            self.update_min_max_after_removal(k)?;
            Ok(1)
        } else {
            Ok(0)
        }
    }

    pub fn update(&self, key: &[u8], value: &[u8]) -> Result<usize> {
        self.validate_key(key)?;
        self.validate_value(value)?;
        let k = self.numeric(key);
        let addr = self.address(k);
        let Some(fd) = self.file_for_read(addr.file_id)? else {
            return Ok(0);
        };
        let entry = fd.cache().get(addr.node_id_in_file)?;
        let mut guard = entry.write();
        let offset = self.layout.offset_in_node(k);
        if ValueState::from_byte(guard.buf.as_bytes()[offset]) != Some(ValueState::Exists) {
            return Ok(0);
        }
        let value_start = offset + 1;
        guard.buf.as_bytes_mut()[value_start..value_start + self.value_size].copy_from_slice(value);
        guard.modified = true;
        Ok(1)
    }

    pub fn mark_as_deleted(&self, key: &[u8], value: &[u8]) -> Result<usize> {
        self.validate_key(key)?;
        self.validate_value(value)?;
        let k = self.numeric(key);
        let addr = self.address(k);
        let Some(fd) = self.file_for_read(addr.file_id)? else {
            return Ok(0);
        };
        let entry = fd.cache().get(addr.node_id_in_file)?;
        let had_entry = {
            let mut guard = entry.write();
            let offset = self.layout.offset_in_node(k);
            if ValueState::from_byte(guard.buf.as_bytes()[offset]) != Some(ValueState::Exists) {
                false
            } else {
                let value_start = offset + 1;
                guard.buf.as_bytes_mut()[value_start..value_start + self.value_size].copy_from_slice(value);
                guard.buf.as_bytes_mut()[offset] = ValueState::Deleted as u8;
                guard.modified = true;
                true
            }
        };
        if had_entry {
            self.update_min_max_after_removal(k)?;
            Ok(1)
        } else {
            Ok(0)
        }
    }

    pub fn find(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.validate_key(key)?;
        let k = self.numeric(key);
        let addr = self.address(k);
        let Some(fd) = self.file_for_read(addr.file_id)? else {
            return Ok(None);
        };
        let entry = fd.cache().get(addr.node_id_in_file)?;
        let guard = entry.read();
        let offset = self.layout.offset_in_node(k);
        if ValueState::from_byte(guard.buf.as_bytes()[offset]) == Some(ValueState::Exists) {
            let value_start = offset + 1;
            Ok(Some(guard.buf.as_bytes()[value_start..value_start + self.value_size].to_vec()))
        } else {
            Ok(None)
        }
    }

    pub fn count(&self, key: &[u8]) -> Result<usize> {
        Ok(self.find(key)?.map(|_| 1).unwrap_or(0))
    }

    pub fn get_min_key(&self) -> Option<Vec<u8>> {
        self.min_key.read().map(|k| self.denumeric(k))
    }

    pub fn get_max_key(&self) -> Option<Vec<u8>> {
        self.max_key.read().map(|k| self.denumeric(k))
    }

    fn extend_min_max(&self, k: u64) {
        let mut min = self.min_key.write();
        *min = Some(min.map_or(k, |m| m.min(k)));
        drop(min);
        let mut max = self.max_key.write();
        *max = Some(max.map_or(k, |m| m.max(k)));
    }

    /// Exception-safe per §4.3: compute both new extrema into locals before
    /// swapping either into state.
    fn update_min_max_after_removal(&self, removed: u64) -> Result<()> {
        let is_min = *self.min_key.read() == Some(removed);
        let is_max = *self.max_key.read() == Some(removed);
        if !is_min && !is_max {
            return Ok(());
        }
        let mut new_min = *self.min_key.read();
        let mut new_max = *self.max_key.read();
        if is_min {
            new_min = self.key_after_numeric(removed)?;
        }
        if is_max {
            new_max = self.key_before_numeric(removed)?;
        }
        match (new_min, new_max) {
            (Some(lo), Some(hi)) => {
                *self.min_key.write() = Some(lo);
                *self.max_key.write() = Some(hi);
            }
            _ => {
                *self.min_key.write() = None;
                *self.max_key.write() = None;
            }
        }
        Ok(())
    }

    fn key_before_numeric(&self, key: u64) -> Result<Option<u64>> {
        if key == 0 || *self.min_key.read() == Some(key) {
            return Ok(None);
        }
        let rpn = self.layout.records_per_node;
        let mut cursor = key - 1;
        loop {
            let addr = self.address(cursor);
            let has_file = self.file_ids.read().contains(&addr.file_id);
            if !has_file {
                let prev = self.file_ids.read().range(..addr.file_id).next_back().copied();
                match prev {
                    Some(prev_file_id) => {
                        cursor = self.last_key_of_file(prev_file_id);
                        continue;
                    }
                    None => return Ok(None),
                }
            }
            let fd = self.file_for_read(addr.file_id)?.ok_or_else(|| {
                StorageError::missing_node(self.config.data_file_path(addr.file_id), addr.node_id_in_file)
            })?;
            let entry = fd.cache().get(addr.node_id_in_file)?;
            let guard = entry.read();
            let node_start = (addr.node_id_global - 1) * rpn;
            let mut probe = cursor;
            loop {
                let offset = self.layout.offset_in_node(probe);
                if ValueState::from_byte(guard.buf.as_bytes()[offset]) == Some(ValueState::Exists) {
                    return Ok(Some(probe));
                }
                if probe == node_start {
                    break;
                }
                probe -= 1;
            }
            drop(guard);
            if node_start == 0 {
                return Ok(None);
            }
            cursor = node_start - 1;
        }
    }

    fn key_after_numeric(&self, key: u64) -> Result<Option<u64>> {
        if key == self.max_possible() || *self.max_key.read() == Some(key) {
            return Ok(None);
        }
        let rpn = self.layout.records_per_node;
        let mut cursor = key + 1;
        loop {
            let addr = self.address(cursor);
            let has_file = self.file_ids.read().contains(&addr.file_id);
            if !has_file {
                let next = self.file_ids.read().range(addr.file_id..).next().copied();
                match next {
                    Some(next_file_id) => {
                        cursor = self.first_key_of_file(next_file_id);
                        continue;
                    }
                    None => return Ok(None),
                }
            }
            let fd = self.file_for_read(addr.file_id)?.ok_or_else(|| {
                StorageError::missing_node(self.config.data_file_path(addr.file_id), addr.node_id_in_file)
            })?;
            let entry = fd.cache().get(addr.node_id_in_file)?;
            let guard = entry.read();
            let node_end = addr.node_id_global * rpn - 1;
            let mut probe = cursor;
            loop {
                let offset = self.layout.offset_in_node(probe);
                if ValueState::from_byte(guard.buf.as_bytes()[offset]) == Some(ValueState::Exists) {
                    return Ok(Some(probe));
                }
                if probe == node_end {
                    break;
                }
                probe += 1;
            }
            drop(guard);
            cursor = node_end + 1;
        }
    }

    pub fn get_key_before(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.validate_key(key)?;
        Ok(self.key_before_numeric(self.numeric(key))?.map(|k| self.denumeric(k)))
    }

    pub fn get_key_after(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.validate_key(key)?;
        Ok(self.key_after_numeric(self.numeric(key))?.map(|k| self.denumeric(k)))
    }

    /// Logical first/last/prev/next compose the physical min/max/before/after
    /// primitives with the column's sort direction (§4.3 Sort direction).
    pub fn get_first_key(&self) -> Option<Vec<u8>> {
        match self.direction {
            SortDirection::Ascending => self.get_min_key(),
            SortDirection::Descending => self.get_max_key(),
        }
    }

    pub fn get_last_key(&self) -> Option<Vec<u8>> {
        match self.direction {
            SortDirection::Ascending => self.get_max_key(),
            SortDirection::Descending => self.get_min_key(),
        }
    }

    pub fn get_prev_key(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.direction {
            SortDirection::Ascending => self.get_key_before(key),
            SortDirection::Descending => self.get_key_after(key),
        }
    }

    pub fn get_next_key(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.direction {
            SortDirection::Ascending => self.get_key_after(key),
            SortDirection::Descending => self.get_key_before(key),
        }
    }

    fn scan_extrema(&self) -> Result<(Option<u64>, Option<u64>)> {
        let mut min = None;
        let mut max = None;
        let file_ids: Vec<u64> = self.file_ids.read().iter().copied().collect();
        for file_id in file_ids {
            let Some(fd) = self.file_for_read(file_id)? else { continue };
            for node_in_file in 1..=self.config.linear_nodes_per_file {
                let entry = fd.cache().get(node_in_file)?;
                let guard = entry.read();
                let node_global = (file_id - 1) * self.config.linear_nodes_per_file + node_in_file;
                let base = (node_global - 1) * self.layout.records_per_node;
                for r in 0..self.layout.records_per_node {
                    let offset = self.layout.offset_in_node(base + r);
                    if ValueState::from_byte(guard.buf.as_bytes()[offset]) == Some(ValueState::Exists) {
                        let k = base + r;
                        min = Some(min.map_or(k, |m: u64| m.min(k)));
                        max = Some(max.map_or(k, |m: u64| m.max(k)));
                    }
                }
            }
        }
        Ok((min, max))
    }

    pub fn flush(&self) -> Result<()> {
        let mut failed_count = 0usize;
        for fd in self.file_cache.resident() {
            if fd.flush().is_err() {
                failed_count += 1;
            }
        }
        if failed_count > 0 {
            Err(StorageError::CacheFlushFailed { failed_count })
        } else {
            Ok(())
        }
    }
}

fn scan_file_ids(config: &StorageConfig) -> Result<BTreeSet<u64>> {
    let mut ids = BTreeSet::new();
    for entry in fs::read_dir(&config.data_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(id) = parse_file_id(name, &config.file_prefix, &config.file_extension) {
            ids.insert(id);
        }
    }
    Ok(ids)
}

fn parse_file_id(name: &str, prefix: &str, ext: &str) -> Option<u64> {
    let rest = name.strip_prefix(prefix)?;
    let digits = rest.strip_suffix(ext)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_fresh(nodes_per_file: u64) -> (tempfile::TempDir, UniqueLinearIndex) {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(dir.path()).with_linear_nodes_per_file(nodes_per_file);
        let identity = IndexIdentity::new([9u8; 16], 1, 1);
        let index = UniqueLinearIndex::create(
            config,
            identity,
            8,
            8,
            false,
            SortDirection::Ascending,
        )
        .unwrap();
        (dir, index)
    }

    #[test]
    fn test_parse_file_id() {
        assert_eq!(parse_file_id("idx3.dat", "idx", ".dat"), Some(3));
        assert_eq!(parse_file_id(".initialized", "idx", ".dat"), None);
        assert_eq!(parse_file_id("idxabc.dat", "idx", ".dat"), None);
    }

    #[test]
    fn test_insert_find_across_files() {
        let (_dir, index) = open_fresh(2);
        let rpn = index.layout.records_per_node;
        let far_key = (rpn * 5).to_be_bytes();
        assert!(index.insert(&1u64.to_be_bytes(), &100u64.to_be_bytes(), false).unwrap());
        assert!(index.insert(&far_key, &200u64.to_be_bytes(), false).unwrap());
        assert_eq!(
            index.find(&1u64.to_be_bytes()).unwrap(),
            Some(100u64.to_be_bytes().to_vec())
        );
        assert_eq!(
            index.find(&far_key).unwrap(),
            Some(200u64.to_be_bytes().to_vec())
        );
    }

    #[test]
    fn test_duplicate_insert_without_replace() {
        let (_dir, index) = open_fresh(2);
        assert!(index.insert(&1u64.to_be_bytes(), &1u64.to_be_bytes(), false).unwrap());
        assert!(!index.insert(&1u64.to_be_bytes(), &2u64.to_be_bytes(), false).unwrap());
        assert_eq!(
            index.find(&1u64.to_be_bytes()).unwrap(),
            Some(1u64.to_be_bytes().to_vec())
        );
    }

    #[test]
    fn test_erase_resets_extrema_when_empty() {
        let (_dir, index) = open_fresh(2);
        index.insert(&5u64.to_be_bytes(), &0u64.to_be_bytes(), false).unwrap();
        assert_eq!(index.erase(&5u64.to_be_bytes()).unwrap(), 1);
        assert_eq!(index.get_min_key(), None);
        assert_eq!(index.get_max_key(), None);
    }

    #[test]
    fn test_min_max_promote_on_removal() {
        let (_dir, index) = open_fresh(4);
        for k in [2u64, 5, 9] {
            index.insert(&k.to_be_bytes(), &0u64.to_be_bytes(), false).unwrap();
        }
        index.erase(&2u64.to_be_bytes()).unwrap();
        assert_eq!(index.get_min_key(), Some(5u64.to_be_bytes().to_vec()));
        index.erase(&9u64.to_be_bytes()).unwrap();
        assert_eq!(index.get_max_key(), Some(5u64.to_be_bytes().to_vec()));
    }

    #[test]
    fn test_key_before_and_after() {
        let (_dir, index) = open_fresh(4);
        for k in [2u64, 5, 9] {
            index.insert(&k.to_be_bytes(), &0u64.to_be_bytes(), false).unwrap();
        }
        assert_eq!(
            index.get_key_before(&9u64.to_be_bytes()).unwrap(),
            Some(5u64.to_be_bytes().to_vec())
        );
        assert_eq!(
            index.get_key_after(&2u64.to_be_bytes()).unwrap(),
            Some(5u64.to_be_bytes().to_vec())
        );
        assert_eq!(index.get_key_before(&2u64.to_be_bytes()).unwrap(), None);
    }

    #[test]
    fn test_reopen_preserves_data_and_extrema() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(dir.path()).with_linear_nodes_per_file(2);
        let identity = IndexIdentity::new([1u8; 16], 2, 3);
        {
            let index = UniqueLinearIndex::create(
                config.clone(),
                identity,
                8,
                8,
                false,
                SortDirection::Ascending,
            )
            .unwrap();
            index.insert(&3u64.to_be_bytes(), &30u64.to_be_bytes(), false).unwrap();
            index.insert(&7u64.to_be_bytes(), &70u64.to_be_bytes(), false).unwrap();
            index.flush().unwrap();
        }
        let index = UniqueLinearIndex::open(config, identity, 8, 8, false, SortDirection::Ascending).unwrap();
        assert_eq!(
            index.find(&3u64.to_be_bytes()).unwrap(),
            Some(30u64.to_be_bytes().to_vec())
        );
        assert_eq!(index.get_min_key(), Some(3u64.to_be_bytes().to_vec()));
        assert_eq!(index.get_max_key(), Some(7u64.to_be_bytes().to_vec()));
    }

    #[test]
    fn test_mark_as_deleted_removes_from_extrema() {
        let (_dir, index) = open_fresh(4);
        index.insert(&5u64.to_be_bytes(), &1u64.to_be_bytes(), false).unwrap();
        assert_eq!(index.mark_as_deleted(&5u64.to_be_bytes(), &2u64.to_be_bytes()).unwrap(), 1);
        assert_eq!(index.find(&5u64.to_be_bytes()).unwrap(), None);
        assert_eq!(index.get_min_key(), None);
    }
}
