//! # siodb-storage-core
//!
//! Paged-node-cached index storage for a relational database server: a
//! B+ tree ordered index and a unique linear (numeric-key-addressed) index,
//! both built on a shared fixed-size-node cache and plain-binary codec.
//!
//! ## Architecture
//!
//! - **Cache layer** (`cache`): bounded LRU of fixed-size node images, shared
//!   by both index kinds, with dirty write-back on eviction and flush.
//! - **Codec layer** (`codec`): plain big-endian binary encoding for every
//!   on-disk header and pointer.
//! - **B+ tree** (`btree`): ordered map over a fixed-size key, one file of
//!   fixed-size nodes.
//! - **Unique linear index** (`linear`): numeric-key-addressed records spread
//!   across one or more fixed-size data files.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use siodb_storage_core::{BPlusTree, StorageConfig, IndexIdentity};
//! use std::sync::Arc;
//!
//! let config = StorageConfig::new("/var/lib/siodb/idx1");
//! let identity = IndexIdentity::new([0u8; 16], 1, 1);
//! let compare = Arc::new(|a: &[u8], b: &[u8]| a.cmp(b));
//! let tree = BPlusTree::create(&config, identity, 8, 8, compare).unwrap();
//! tree.insert(&1u64.to_be_bytes(), &42u64.to_be_bytes()).unwrap();
//! ```

pub mod btree;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod linear;
pub mod node_store;
pub mod page;

pub use config::StorageConfig;
pub use error::{IndexIdentity, Result, StorageError};

// Re-export main public API
pub use btree::BPlusTree;
pub use linear::{SortDirection, UniqueLinearIndex};
