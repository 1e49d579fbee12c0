//! Node entry layout: branching factor derivation (§3) and raw accessors
//! for the fixed-stride `(key, value)` / `(key, child id)` pairs. Entries
//! are exposed as an index-and-stride pair rather than a pointer-bearing
//! iterator (§9), since the node buffer they address is mutated in place.

use crate::codec::{decode_u64, encode_u64};
use crate::config::NODE_SIZE;
use crate::page::NodeBuf;

use super::header::{INTERNAL_HEADER_SIZE, LEAF_HEADER_SIZE};

/// Derived sizing for a B+ tree parameterized by `key_size`/`value_size`.
#[derive(Debug, Clone, Copy)]
pub struct BTreeLayout {
    pub key_size: usize,
    pub value_size: usize,
    pub kv_pair_size: usize,
    pub child_pair_size: usize,
    pub branching_factor: usize,
    pub split_threshold: usize,
}

impl BTreeLayout {
    pub fn new(key_size: usize, value_size: usize) -> Self {
        let kv_pair_size = key_size + value_size;
        let child_pair_size = key_size + 8;
        let leaf_capacity = (NODE_SIZE - LEAF_HEADER_SIZE) / kv_pair_size;
        let internal_capacity = (NODE_SIZE - INTERNAL_HEADER_SIZE) / child_pair_size;
        let branching_factor = leaf_capacity.min(internal_capacity);
        let split_threshold = (branching_factor + 1) / 2;
        Self {
            key_size,
            value_size,
            kv_pair_size,
            child_pair_size,
            branching_factor,
            split_threshold,
        }
    }
}

/// Read-only view of a leaf node's `(key, value)` entries.
pub struct LeafEntries<'a> {
    buf: &'a [u8],
    layout: &'a BTreeLayout,
    count: usize,
}

impl<'a> LeafEntries<'a> {
    pub fn new(buf: &'a NodeBuf, layout: &'a BTreeLayout, count: usize) -> Self {
        Self {
            buf: buf.as_bytes(),
            layout,
            count,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn key(&self, i: usize) -> &[u8] {
        let start = LEAF_HEADER_SIZE + i * self.layout.kv_pair_size;
        &self.buf[start..start + self.layout.key_size]
    }

    pub fn value(&self, i: usize) -> &[u8] {
        let start = LEAF_HEADER_SIZE + i * self.layout.kv_pair_size + self.layout.key_size;
        &self.buf[start..start + self.layout.value_size]
    }

    /// Binary search by key, same ordering contract as `key_compare`.
    pub fn binary_search_by(&self, mut compare: impl FnMut(&[u8]) -> std::cmp::Ordering) -> std::result::Result<usize, usize> {
        let mut lo = 0usize;
        let mut hi = self.count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match compare(self.key(mid)) {
                std::cmp::Ordering::Equal => return Ok(mid),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }
        Err(lo)
    }
}

/// Mutating entry operations on a leaf node's buffer.
pub fn leaf_insert_at(buf: &mut NodeBuf, layout: &BTreeLayout, count: usize, index: usize, key: &[u8], value: &[u8]) {
    let stride = layout.kv_pair_size;
    let base = LEAF_HEADER_SIZE;
    if index < count {
        let src_start = base + index * stride;
        let src_end = base + count * stride;
        let dst_start = src_start + stride;
        buf.as_bytes_mut().copy_within(src_start..src_end, dst_start);
    }
    let entry_start = base + index * stride;
    let entry = &mut buf.as_bytes_mut()[entry_start..entry_start + stride];
    entry[..layout.key_size].copy_from_slice(key);
    entry[layout.key_size..].copy_from_slice(value);
}

/// Read-only view of an internal node's `(key, child id)` entries.
pub struct InternalEntries<'a> {
    buf: &'a [u8],
    layout: &'a BTreeLayout,
    count: usize,
}

impl<'a> InternalEntries<'a> {
    pub fn new(buf: &'a NodeBuf, layout: &'a BTreeLayout, count: usize) -> Self {
        Self {
            buf: buf.as_bytes(),
            layout,
            count,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn key(&self, i: usize) -> &[u8] {
        let start = INTERNAL_HEADER_SIZE + i * self.layout.child_pair_size;
        &self.buf[start..start + self.layout.key_size]
    }

    pub fn child(&self, i: usize) -> u64 {
        let start = INTERNAL_HEADER_SIZE + i * self.layout.child_pair_size + self.layout.key_size;
        let (child, _) = decode_u64(&self.buf[start..start + 8]);
        child
    }
}

pub fn internal_insert_at(
    buf: &mut NodeBuf,
    layout: &BTreeLayout,
    count: usize,
    index: usize,
    key: &[u8],
    child: u64,
) {
    let stride = layout.child_pair_size;
    let base = INTERNAL_HEADER_SIZE;
    if index < count {
        let src_start = base + index * stride;
        let src_end = base + count * stride;
        let dst_start = src_start + stride;
        buf.as_bytes_mut().copy_within(src_start..src_end, dst_start);
    }
    let entry_start = base + index * stride;
    let key_slice = &mut buf.as_bytes_mut()[entry_start..entry_start + layout.key_size];
    key_slice.copy_from_slice(key);
    let child_slice_start = entry_start + layout.key_size;
    encode_u64(child, &mut buf.as_bytes_mut()[child_slice_start..child_slice_start + 8]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btree::header::{CommonNodeHeader, LeafHeader, NodeType};

    fn make_layout() -> BTreeLayout {
        BTreeLayout::new(8, 8)
    }

    #[test]
    fn test_branching_factor_derivation() {
        let layout = make_layout();
        assert!(layout.branching_factor > 0);
        assert_eq!(layout.split_threshold, (layout.branching_factor + 1) / 2);
    }

    #[test]
    fn test_leaf_insert_and_read_back() {
        let layout = make_layout();
        let mut buf = NodeBuf::zeroed();
        let header = LeafHeader {
            common: CommonNodeHeader {
                node_type: NodeType::RootLeaf,
                node_id: 1,
                entry_count: 0,
            },
            prev_node_id: 0,
            next_node_id: 0,
        };
        header.serialize(buf.as_bytes_mut());

        leaf_insert_at(&mut buf, &layout, 0, 0, &10u64.to_be_bytes(), &100u64.to_be_bytes());
        leaf_insert_at(&mut buf, &layout, 1, 1, &20u64.to_be_bytes(), &200u64.to_be_bytes());
        leaf_insert_at(&mut buf, &layout, 2, 1, &15u64.to_be_bytes(), &150u64.to_be_bytes());

        let entries = LeafEntries::new(&buf, &layout, 3);
        assert_eq!(entries.key(0), &10u64.to_be_bytes());
        assert_eq!(entries.key(1), &15u64.to_be_bytes());
        assert_eq!(entries.key(2), &20u64.to_be_bytes());
        assert_eq!(entries.value(1), &150u64.to_be_bytes());
    }

    #[test]
    fn test_binary_search() {
        let layout = make_layout();
        let mut buf = NodeBuf::zeroed();
        for (i, k) in [10u64, 20, 30].iter().enumerate() {
            leaf_insert_at(&mut buf, &layout, i, i, &k.to_be_bytes(), &0u64.to_be_bytes());
        }
        let entries = LeafEntries::new(&buf, &layout, 3);
        let found = entries.binary_search_by(|k| {
            let v = u64::from_be_bytes(k.try_into().unwrap());
            v.cmp(&20)
        });
        assert_eq!(found, Ok(1));
        let not_found = entries.binary_search_by(|k| {
            let v = u64::from_be_bytes(k.try_into().unwrap());
            v.cmp(&25)
        });
        assert_eq!(not_found, Err(2));
    }
}
