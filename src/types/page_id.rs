//! Page identifier type.

use std::fmt;

/// Unique identifier for a page in a storage file.
///
/// Page IDs are 0-indexed; page 0 is an ordinary data page. A page's
/// position in the file is `id * PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PageId(pub u32);

impl PageId {
    /// Create a new page ID
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw page ID value
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Calculate the byte offset of this page in the file
    pub const fn file_offset(self, page_size: usize) -> u64 {
        self.0 as u64 * page_size as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PageId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<PageId> for u32 {
    fn from(id: PageId) -> Self {
        id.0
    }
}
