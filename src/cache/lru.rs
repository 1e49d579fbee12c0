//! Generic least-recently-used access order tracker, shared by the node
//! cache (keyed by node id) and the linear index's file cache (keyed by
//! file id). A Vec-based doubly linked list, same shape as a plain page
//! buffer pool's LRU list, generalized over the key type.

use std::collections::HashMap;
use std::hash::Hash;

pub struct LruList<K> {
    positions: HashMap<K, usize>,
    order: Vec<LruNode<K>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_slots: Vec<usize>,
}

#[derive(Clone, Copy)]
struct LruNode<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<K: Copy + Eq + Hash> LruList<K> {
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_slots: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Records access to `key`, moving it to the front (most recently used).
    pub fn touch(&mut self, key: K) {
        if let Some(&pos) = self.positions.get(&key) {
            self.move_to_front(pos);
        } else {
            self.insert(key);
        }
    }

    pub fn remove(&mut self, key: &K) {
        if let Some(pos) = self.positions.remove(key) {
            self.unlink(pos);
            self.free_slots.push(pos);
        }
    }

    pub fn coldest(&self) -> Option<K> {
        self.tail.map(|pos| self.order[pos].key)
    }

    /// Keys ordered from coldest (least recently used) to warmest.
    pub fn coldest_to_warmest(&self) -> Vec<K> {
        let mut result = Vec::with_capacity(self.positions.len());
        let mut cur = self.tail;
        while let Some(pos) = cur {
            result.push(self.order[pos].key);
            cur = self.order[pos].prev;
        }
        result
    }

    pub fn pop_coldest(&mut self) -> Option<K> {
        let key = self.coldest()?;
        self.remove(&key);
        Some(key)
    }

    fn insert(&mut self, key: K) {
        let pos = if let Some(pos) = self.free_slots.pop() {
            self.order[pos] = LruNode {
                key,
                prev: None,
                next: self.head,
            };
            pos
        } else {
            let pos = self.order.len();
            self.order.push(LruNode {
                key,
                prev: None,
                next: self.head,
            });
            pos
        };

        if let Some(old_head) = self.head {
            self.order[old_head].prev = Some(pos);
        }
        self.head = Some(pos);
        if self.tail.is_none() {
            self.tail = Some(pos);
        }
        self.positions.insert(key, pos);
    }

    fn move_to_front(&mut self, pos: usize) {
        if self.head == Some(pos) {
            return;
        }
        self.unlink(pos);
        self.order[pos].prev = None;
        self.order[pos].next = self.head;
        if let Some(old_head) = self.head {
            self.order[old_head].prev = Some(pos);
        }
        self.head = Some(pos);
        if self.tail.is_none() {
            self.tail = Some(pos);
        }
    }

    fn unlink(&mut self, pos: usize) {
        let node = self.order[pos];
        if let Some(prev) = node.prev {
            self.order[prev].next = node.next;
        } else {
            self.head = node.next;
        }
        if let Some(next) = node.next {
            self.order[next].prev = node.prev;
        } else {
            self.tail = node.prev;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_basic() {
        let mut list: LruList<u64> = LruList::new(3);
        list.touch(1);
        list.touch(2);
        list.touch(3);
        assert_eq!(list.coldest(), Some(1));
        list.touch(1);
        assert_eq!(list.coldest(), Some(2));
        assert_eq!(list.pop_coldest(), Some(2));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_lru_remove() {
        let mut list: LruList<u64> = LruList::new(3);
        list.touch(1);
        list.touch(2);
        list.touch(3);
        list.remove(&2);
        assert_eq!(list.len(), 2);
        assert_eq!(list.coldest(), Some(1));
    }

    #[test]
    fn test_coldest_to_warmest_order() {
        let mut list: LruList<u64> = LruList::new(4);
        list.touch(10);
        list.touch(20);
        list.touch(30);
        assert_eq!(list.coldest_to_warmest(), vec![10, 20, 30]);
        list.touch(10);
        assert_eq!(list.coldest_to_warmest(), vec![20, 30, 10]);
    }

    #[test]
    fn test_empty() {
        let list: LruList<u64> = LruList::new(3);
        assert!(list.is_empty());
        assert_eq!(list.coldest(), None);
    }
}
