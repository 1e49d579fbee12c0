//! Configuration for the storage engine, following the same builder-style
//! pattern the rest of this crate's ancestry uses for its config structs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default node (and page) size: 8 KiB, fixed for both index kinds.
pub const NODE_SIZE: usize = 8192;

/// Default capacity of a single `NodeCache` (§5 Resource Policy).
pub const DEFAULT_NODE_CACHE_CAPACITY: usize = 16;

/// Default capacity of the linear index's `FileCache`.
pub const DEFAULT_FILE_CACHE_CAPACITY: usize = 20;

/// Default node count per linear-index data file (excludes the header node).
pub const DEFAULT_LINEAR_NODES_PER_FILE: u64 = 256;

/// Name of the sentinel file written after a successful create.
pub const INIT_FLAG_FILE_NAME: &str = ".initialized";

/// Extension appended to the final path during the named-temp-file
/// creation fallback.
pub const TEMP_FILE_EXTENSION: &str = ".tmp";

/// Configuration shared by both index kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the index's data file(s) and initialization flag file.
    pub data_dir: PathBuf,
    /// Capacity (entry count) of a node cache.
    pub node_cache_capacity: usize,
    /// Capacity (file count) of the linear index's file cache.
    pub file_cache_capacity: usize,
    /// Whether data files are opened with synchronous-data-write semantics.
    pub sync_on_write: bool,
    /// Prefix for linear-index data file names: `<prefix><fileId><ext>`.
    pub file_prefix: String,
    /// Extension for linear-index data file names.
    pub file_extension: String,
    /// Node count per linear-index data file (excludes the header node).
    pub linear_nodes_per_file: u64,
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            node_cache_capacity: DEFAULT_NODE_CACHE_CAPACITY,
            file_cache_capacity: DEFAULT_FILE_CACHE_CAPACITY,
            sync_on_write: true,
            file_prefix: "idx".to_string(),
            file_extension: ".dat".to_string(),
            linear_nodes_per_file: DEFAULT_LINEAR_NODES_PER_FILE,
        }
    }

    pub fn with_linear_nodes_per_file(mut self, nodes_per_file: u64) -> Self {
        self.linear_nodes_per_file = nodes_per_file;
        self
    }

    pub fn with_node_cache_capacity(mut self, capacity: usize) -> Self {
        self.node_cache_capacity = capacity;
        self
    }

    pub fn with_file_cache_capacity(mut self, capacity: usize) -> Self {
        self.file_cache_capacity = capacity;
        self
    }

    pub fn with_sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    pub fn with_file_naming(mut self, prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self.file_extension = extension.into();
        self
    }

    pub fn data_file_path(&self, file_id: u64) -> PathBuf {
        self.data_dir
            .join(format!("{}{}{}", self.file_prefix, file_id, self.file_extension))
    }

    pub fn init_flag_path(&self) -> PathBuf {
        self.data_dir.join(INIT_FLAG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = StorageConfig::new("/tmp/db");
        assert_eq!(cfg.node_cache_capacity, DEFAULT_NODE_CACHE_CAPACITY);
        assert_eq!(cfg.file_cache_capacity, DEFAULT_FILE_CACHE_CAPACITY);
        assert!(cfg.sync_on_write);
    }

    #[test]
    fn test_data_file_path() {
        let cfg = StorageConfig::new("/tmp/db").with_file_naming("tbl_idx_", ".idx");
        assert_eq!(cfg.data_file_path(3), PathBuf::from("/tmp/db/tbl_idx_3.idx"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let cfg = StorageConfig::new("/tmp/db");
        let json = serde_json::to_string(&cfg).unwrap();
        let back: StorageConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data_dir, cfg.data_dir);
    }
}
