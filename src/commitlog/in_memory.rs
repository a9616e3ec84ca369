use crate::commitlog::{Entry, Index, Log};
use std::collections::VecDeque;
use std::io;
use std::marker::PhantomData;

/// InMemoryLog keeps the most recent `retention` entries of an unbounded sequence.
///
/// Everything the local raft group appends is applied before the append returns, so only the
/// tail is ever read back. Older entries, reads included, are dropped to keep memory bounded.
pub struct InMemoryLog<E: Entry> {
    entries: VecDeque<Vec<u8>>,
    // Index of `entries[0]`.
    first_index: Index,
    retention: usize,
    _pd: PhantomData<E>,
}

impl<E: Entry> InMemoryLog<E> {
    pub fn with_retention(retention: usize) -> Result<Self, io::Error> {
        if retention == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "In-memory log must retain at least one entry",
            ));
        }

        Ok(InMemoryLog {
            entries: VecDeque::with_capacity(retention),
            first_index: Index::start_index(),
            retention,
            _pd: PhantomData::default(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<E: Entry> Log<E> for InMemoryLog<E> {
    fn append(&mut self, entry: E) -> Result<Index, io::Error> {
        let index = self.next_index();
        self.entries.push_back(entry.into());

        if self.entries.len() > self.retention {
            self.entries.pop_front();
            self.first_index = self.first_index.next();
        }

        Ok(index)
    }

    fn read(&self, index: Index) -> Result<Option<E>, io::Error> {
        if index < self.first_index {
            return Ok(None);
        }

        let offset = (index.as_u64() - self.first_index.as_u64()) as usize;

        Ok(self.entries.get(offset).cloned().map(E::from))
    }

    fn next_index(&self) -> Index {
        Index::new(self.first_index.as_u64() + self.entries.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Blob(Vec<u8>);

    impl From<Vec<u8>> for Blob {
        fn from(bytes: Vec<u8>) -> Self {
            Blob(bytes)
        }
    }

    impl From<Blob> for Vec<u8> {
        fn from(blob: Blob) -> Self {
            blob.0
        }
    }

    impl Entry for Blob {}

    #[test]
    fn indexes_start_from_one() {
        let mut log = InMemoryLog::<Blob>::with_retention(8).unwrap();
        assert_eq!(log.next_index(), Index::start_index());

        let index = log.append(Blob(vec![1, 2, 3])).unwrap();

        assert_eq!(index, Index::new(1));
        assert_eq!(log.next_index(), Index::new(2));
        assert_eq!(log.read(index).unwrap(), Some(Blob(vec![1, 2, 3])));
        assert_eq!(log.read(Index::new(2)).unwrap(), None);
    }

    #[test]
    fn old_entries_are_dropped_past_retention() {
        let mut log = InMemoryLog::<Blob>::with_retention(2).unwrap();

        for i in 1..=5u8 {
            assert_eq!(log.append(Blob(vec![i])).unwrap(), Index::new(u64::from(i)));
        }

        assert_eq!(log.len(), 2);
        assert_eq!(log.next_index(), Index::new(6));
        assert_eq!(log.read(Index::new(3)).unwrap(), None);
        assert_eq!(log.read(Index::new(4)).unwrap(), Some(Blob(vec![4])));
        assert_eq!(log.read(Index::new(5)).unwrap(), Some(Blob(vec![5])));
    }

    #[test]
    fn zero_retention_is_refused() {
        assert!(InMemoryLog::<Blob>::with_retention(0).is_err());
    }
}
