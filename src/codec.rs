//! Plain-binary encoding: big-endian, unaligned serialization of integers
//! and byte blobs used for every on-disk header and pointer in this crate.
//!
//! Each `encode_*` writes into the front of `buf` and returns the remaining
//! slice (the advanced "pointer"); each `decode_*` reads from the front of
//! `buf` and returns the value plus the remaining slice.

use crate::error::{Result, StorageError};

pub fn encode_u16(value: u16, buf: &mut [u8]) -> &mut [u8] {
    buf[..2].copy_from_slice(&value.to_be_bytes());
    &mut buf[2..]
}

pub fn decode_u16(buf: &[u8]) -> (u16, &[u8]) {
    let value = u16::from_be_bytes(buf[..2].try_into().unwrap());
    (value, &buf[2..])
}

pub fn encode_u32(value: u32, buf: &mut [u8]) -> &mut [u8] {
    buf[..4].copy_from_slice(&value.to_be_bytes());
    &mut buf[4..]
}

pub fn decode_u32(buf: &[u8]) -> (u32, &[u8]) {
    let value = u32::from_be_bytes(buf[..4].try_into().unwrap());
    (value, &buf[4..])
}

pub fn encode_u64(value: u64, buf: &mut [u8]) -> &mut [u8] {
    buf[..8].copy_from_slice(&value.to_be_bytes());
    &mut buf[8..]
}

pub fn decode_u64(buf: &[u8]) -> (u64, &[u8]) {
    let value = u64::from_be_bytes(buf[..8].try_into().unwrap());
    (value, &buf[8..])
}

pub fn encode_i16(value: i16, buf: &mut [u8]) -> &mut [u8] {
    encode_u16(value as u16, buf)
}

pub fn decode_i16(buf: &[u8]) -> (i16, &[u8]) {
    let (v, rest) = decode_u16(buf);
    (v as i16, rest)
}

pub fn encode_i32(value: i32, buf: &mut [u8]) -> &mut [u8] {
    encode_u32(value as u32, buf)
}

pub fn decode_i32(buf: &[u8]) -> (i32, &[u8]) {
    let (v, rest) = decode_u32(buf);
    (v as i32, rest)
}

pub fn encode_i64(value: i64, buf: &mut [u8]) -> &mut [u8] {
    encode_u64(value as u64, buf)
}

pub fn decode_i64(buf: &[u8]) -> (i64, &[u8]) {
    let (v, rest) = decode_u64(buf);
    (v as i64, rest)
}

pub fn encode_binary<'a>(data: &[u8], buf: &'a mut [u8]) -> &'a mut [u8] {
    buf[..data.len()].copy_from_slice(data);
    &mut buf[data.len()..]
}

pub fn decode_binary<'a>(buf: &'a [u8], len: usize) -> (&'a [u8], &'a [u8]) {
    (&buf[..len], &buf[len..])
}

/// Index type tag stored in every index file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IndexType {
    BPlusTree = 0,
    UniqueLinear = 1,
}

impl IndexType {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::BPlusTree),
            1 => Some(Self::UniqueLinear),
            _ => None,
        }
    }
}

/// `version(u32) + index_type(u8) + database_uuid(16) + table_id(u32) + index_id(u64)`: 33 bytes.
pub const INDEX_FILE_HEADER_SIZE: usize = 4 + 1 + 16 + 4 + 8;

pub const CURRENT_HEADER_VERSION: u32 = 1;

/// Identity and version record written at offset 0 of every index data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexFileHeaderBase {
    pub version: u32,
    pub index_type: IndexType,
    pub database_uuid: [u8; 16],
    pub table_id: u32,
    pub index_id: u64,
}

impl IndexFileHeaderBase {
    pub fn new(index_type: IndexType, database_uuid: [u8; 16], table_id: u32, index_id: u64) -> Self {
        Self {
            version: CURRENT_HEADER_VERSION,
            index_type,
            database_uuid,
            table_id,
            index_id,
        }
    }

    pub fn serialize(&self, buf: &mut [u8]) {
        assert!(buf.len() >= INDEX_FILE_HEADER_SIZE);
        let buf = encode_u32(self.version, buf);
        buf[0] = self.index_type as u8;
        let buf = &mut buf[1..];
        let buf = encode_binary(&self.database_uuid, buf);
        let buf = encode_u32(self.table_id, buf);
        encode_u64(self.index_id, buf);
    }

    /// Validates that the stored version is supported and the index type tag
    /// matches `expected`. Returns `IndexFileCorrupted` otherwise.
    pub fn deserialize(buf: &[u8], expected: IndexType, path: &std::path::Path) -> Result<Self> {
        assert!(buf.len() >= INDEX_FILE_HEADER_SIZE);
        let (version, buf) = decode_u32(buf);
        if version > CURRENT_HEADER_VERSION {
            return Err(StorageError::file_corrupted(
                path.to_path_buf(),
                format!("unsupported header version {version}"),
            ));
        }
        let index_type = IndexType::from_byte(buf[0]).ok_or_else(|| {
            StorageError::file_corrupted(path.to_path_buf(), "invalid index type tag")
        })?;
        if index_type != expected {
            return Err(StorageError::file_corrupted(
                path.to_path_buf(),
                "index type tag does not match expected index type",
            ));
        }
        let buf = &buf[1..];
        let (database_uuid, buf) = decode_binary(buf, 16);
        let (table_id, buf) = decode_u32(buf);
        let (index_id, _) = decode_u64(buf);
        Ok(Self {
            version,
            index_type,
            database_uuid: database_uuid.try_into().unwrap(),
            table_id,
            index_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_roundtrip() {
        let mut buf = [0u8; 2];
        encode_u16(0xABCD, &mut buf);
        assert_eq!(buf, [0xAB, 0xCD]);
        let (v, rest) = decode_u16(&buf);
        assert_eq!(v, 0xABCD);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_u64_roundtrip() {
        let mut buf = [0u8; 8];
        encode_u64(0x0102030405060708, &mut buf);
        let (v, _) = decode_u64(&buf);
        assert_eq!(v, 0x0102030405060708);
    }

    #[test]
    fn test_signed_roundtrip() {
        let mut buf = [0u8; 4];
        encode_i32(-12345, &mut buf);
        let (v, _) = decode_i32(&buf);
        assert_eq!(v, -12345);
    }

    #[test]
    fn test_header_roundtrip() {
        let header = IndexFileHeaderBase::new(IndexType::UniqueLinear, [7u8; 16], 42, 99);
        let mut buf = [0u8; INDEX_FILE_HEADER_SIZE];
        header.serialize(&mut buf);
        let path = std::path::Path::new("test.dat");
        let decoded = IndexFileHeaderBase::deserialize(&buf, IndexType::UniqueLinear, path).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_header_rejects_wrong_type() {
        let header = IndexFileHeaderBase::new(IndexType::BPlusTree, [0u8; 16], 1, 1);
        let mut buf = [0u8; INDEX_FILE_HEADER_SIZE];
        header.serialize(&mut buf);
        let path = std::path::Path::new("test.dat");
        assert!(IndexFileHeaderBase::deserialize(&buf, IndexType::UniqueLinear, path).is_err());
    }

    #[test]
    fn test_header_rejects_future_version() {
        let mut header = IndexFileHeaderBase::new(IndexType::BPlusTree, [0u8; 16], 1, 1);
        header.version = CURRENT_HEADER_VERSION + 1;
        let mut buf = [0u8; INDEX_FILE_HEADER_SIZE];
        header.serialize(&mut buf);
        let path = std::path::Path::new("test.dat");
        assert!(IndexFileHeaderBase::deserialize(&buf, IndexType::BPlusTree, path).is_err());
    }
}
