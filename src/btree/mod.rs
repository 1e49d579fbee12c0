//! B+ tree index (§4.2): ordered map over a fixed-size key type to a
//! fixed-size value, persisted in a single file of fixed-size nodes.

pub mod header;
pub mod node;
mod tree;

pub use node::BTreeLayout;
pub use tree::{BPlusTree, CompareFn, DebugNode};
