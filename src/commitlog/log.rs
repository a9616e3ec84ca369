use std::{fmt, io};

/// Position of an entry in a `Log`. The first entry ever appended sits at 1.
#[derive(Copy, Clone, PartialOrd, PartialEq, Ord, Eq)]
pub struct Index(u64);

impl Index {
    pub fn new(index: u64) -> Self {
        assert_ne!(index, 0, "Log indexes start from 1");
        Index(index)
    }

    pub fn start_index() -> Self {
        Self::new(1)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Index(self.0 + 1)
    }
}

impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Append-only, totally ordered sequence of committed entries.
///
/// Indexes are never reused. An implementation may forget old entries: reading one of them returns
/// `Ok(None)`, exactly like reading past the end.
pub trait Log<E: Entry> {
    /// Appends `entry` at `next_index()` and returns that index.
    fn append(&mut self, entry: E) -> Result<Index, io::Error>;

    fn read(&self, index: Index) -> Result<Option<E>, io::Error>;

    fn next_index(&self) -> Index;
}

/// Entries are stored in their serialized form.
pub trait Entry: Clone + From<Vec<u8>> + Into<Vec<u8>> {}
