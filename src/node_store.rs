//! A single data file addressed as a sequence of fixed-size nodes, shared
//! by the B+ tree (one file) and the linear index (one `FileNodeStore` per
//! data file, owned by that file's `FileData`).

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::cache::NodeCacheBackend;
use crate::config::NODE_SIZE;
use crate::error::{Result, StorageError};
use crate::page::NodeBuf;

pub struct FileNodeStore {
    file: Mutex<File>,
    path: PathBuf,
}

impl FileNodeStore {
    pub fn new(file: File, path: impl Into<PathBuf>) -> Self {
        Self {
            file: Mutex::new(file),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn node_offset(node_id: u64) -> u64 {
        node_id * NODE_SIZE as u64
    }

    pub fn sync(&self) -> Result<()> {
        self.file.lock().sync_data().map_err(StorageError::from)
    }
}

impl NodeCacheBackend for FileNodeStore {
    fn read_node(&self, node_id: u64) -> Result<NodeBuf> {
        let offset = Self::node_offset(node_id);
        let mut buf = NodeBuf::zeroed();
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| StorageError::cannot_read(self.path.clone(), offset, NODE_SIZE, e))?;
        file.read_exact(buf.as_bytes_mut())
            .map_err(|e| StorageError::cannot_read(self.path.clone(), offset, NODE_SIZE, e))?;
        Ok(buf)
    }

    fn write_node(&self, node_id: u64, buf: &NodeBuf) -> Result<()> {
        let offset = Self::node_offset(node_id);
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| StorageError::cannot_write(self.path.clone(), offset, NODE_SIZE, e))?;
        file.write_all(buf.as_bytes())
            .map_err(|e| StorageError::cannot_write(self.path.clone(), offset, NODE_SIZE, e))?;
        Ok(())
    }
}
