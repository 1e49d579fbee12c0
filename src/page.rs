//! Fixed-size node buffer shared by both index kinds.

use crate::config::NODE_SIZE;
use std::ops::{Deref, DerefMut};

/// A single on-disk node image: exactly `NODE_SIZE` (8 KiB) bytes.
#[derive(Clone)]
pub struct NodeBuf {
    data: Box<[u8; NODE_SIZE]>,
}

impl NodeBuf {
    pub fn zeroed() -> Self {
        Self {
            data: Box::new([0u8; NODE_SIZE]),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buf = Self::zeroed();
        buf.data[..bytes.len().min(NODE_SIZE)].copy_from_slice(&bytes[..bytes.len().min(NODE_SIZE)]);
        buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.data.as_mut_slice()
    }
}

impl Deref for NodeBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data.as_slice()
    }
}

impl DerefMut for NodeBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.data.as_mut_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed() {
        let buf = NodeBuf::zeroed();
        assert_eq!(buf.len(), NODE_SIZE);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_bytes() {
        let buf = NodeBuf::from_bytes(&[1, 2, 3]);
        assert_eq!(&buf.as_bytes()[..3], &[1, 2, 3]);
        assert_eq!(buf.as_bytes()[3], 0);
    }
}
