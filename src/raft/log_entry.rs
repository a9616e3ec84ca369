use crate::commitlog;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// GroupLogEntry is a single entry of the local group's commit log.
///
/// | 8 bytes | variable length |
/// |  term   |   data          |
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GroupLogEntry {
    pub(crate) term: u64,
    pub(crate) data: Bytes,
}

impl commitlog::Entry for GroupLogEntry {}

impl From<Vec<u8>> for GroupLogEntry {
    fn from(raw: Vec<u8>) -> Self {
        // Only ever called on bytes produced by `Into<Vec<u8>>` below.
        let mut bytes = Bytes::from(raw);
        let term = bytes.get_u64();

        GroupLogEntry { term, data: bytes }
    }
}

impl From<GroupLogEntry> for Vec<u8> {
    fn from(entry: GroupLogEntry) -> Self {
        let mut bytes = BytesMut::with_capacity(8 + entry.data.len());
        bytes.put_u64(entry.term);
        bytes.put_slice(&entry.data);

        bytes.to_vec()
    }
}
