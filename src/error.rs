//! Error types for the storage engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Identity of an index (database, table, index triple), carried by every
/// index instance and attached to errors that originate from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexIdentity {
    pub database_uuid: [u8; 16],
    pub table_id: u32,
    pub index_id: u64,
}

impl IndexIdentity {
    pub fn new(database_uuid: [u8; 16], table_id: u32, index_id: u64) -> Self {
        Self {
            database_uuid,
            table_id,
            index_id,
        }
    }
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur in the storage engine.
///
/// Variants map onto the I/O, structural and logical error categories of the
/// index layer; message-catalog and SQL-layer errors are not represented
/// here since those layers live outside this crate.
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error from the underlying file system not otherwise classified.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot read index file {path}: offset {offset}, size {size}: {source}")]
    CannotReadIndexFile {
        path: PathBuf,
        offset: u64,
        size: usize,
        #[source]
        source: io::Error,
    },

    #[error("cannot write index file {path}: offset {offset}, size {size}: {source}")]
    CannotWriteIndexFile {
        path: PathBuf,
        offset: u64,
        size: usize,
        #[source]
        source: io::Error,
    },

    #[error("cannot create index file {path}: {source}")]
    CannotCreateIndexFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot link index file {path}: {source}")]
    CannotLinkIndexFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot rename index file {from} to {to}: {source}")]
    CannotRenameIndexFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File size is not a multiple of the node size, or is shorter than two nodes.
    #[error("index file {path} is corrupted: {reason}")]
    IndexFileCorrupted { path: PathBuf, reason: String },

    /// Node type byte out of range, missing root, or descent fell through.
    #[error("index node {node_id} of file {path} is corrupted: {reason}")]
    IndexNodeCorrupted {
        path: PathBuf,
        node_id: u64,
        reason: String,
    },

    /// A node expected to exist (by the linear index's own addressing) is absent.
    #[error("missing node {node_id} of file {path} when expected")]
    MissingNodeWhenExpected { path: PathBuf, node_id: u64 },

    /// Reserved for callers layered on top of `insert`'s boolean return.
    #[error("key already exists")]
    KeyAlreadyExists,

    /// Reserved for callers layered on top of `find`/`update`'s return value.
    #[error("key not found")]
    KeyNotFound,

    #[error("invalid key size: {actual}")]
    InvalidKeySize { actual: usize },

    #[error("invalid value size: {actual} (max {max})")]
    InvalidValueSize { actual: usize, max: usize },

    /// Aggregated failure indicator from `NodeCache::flush`.
    #[error("node cache flush failed for {failed_count} node(s)")]
    CacheFlushFailed { failed_count: usize },

    /// Eviction found no evictable entry even after last-chance cleanup.
    #[error("node cache at capacity has no evictable entry")]
    CacheCapacityExceeded,

    /// The initialization flag file is absent: creation never completed.
    #[error("index at {path} is not initialized")]
    NotInitialized { path: PathBuf },

    /// Operation named in §9 as a design hole in the supplied source
    /// (full-node split, erase, update, ordered traversal).
    #[error("operation not implemented: {operation}")]
    NotImplemented { operation: &'static str },
}

impl StorageError {
    pub fn cannot_read(
        path: impl Into<PathBuf>,
        offset: u64,
        size: usize,
        source: io::Error,
    ) -> Self {
        Self::CannotReadIndexFile {
            path: path.into(),
            offset,
            size,
            source,
        }
    }

    pub fn cannot_write(
        path: impl Into<PathBuf>,
        offset: u64,
        size: usize,
        source: io::Error,
    ) -> Self {
        Self::CannotWriteIndexFile {
            path: path.into(),
            offset,
            size,
            source,
        }
    }

    pub fn file_corrupted(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::IndexFileCorrupted {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn node_corrupted(path: impl Into<PathBuf>, node_id: u64, reason: impl Into<String>) -> Self {
        Self::IndexNodeCorrupted {
            path: path.into(),
            node_id,
            reason: reason.into(),
        }
    }

    pub fn missing_node(path: impl Into<PathBuf>, node_id: u64) -> Self {
        Self::MissingNodeWhenExpected {
            path: path.into(),
            node_id,
        }
    }
}
