//! Record identifier type.

use crate::types::PageId;
use std::fmt;

/// Logical handle for a record: the page and slot it was inserted into.
///
/// A RecordId stays valid across updates; the slot it was allocated in
/// may turn into a forwarding entry, but resolution always reaches the
/// record's current physical location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    /// Page the record was allocated on
    pub page: PageId,
    /// Slot number within that page's directory
    pub slot: u32,
}

impl RecordId {
    /// Create a new record ID
    pub const fn new(page: u32, slot: u32) -> Self {
        Self {
            page: PageId::new(page),
            slot,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.page, self.slot)
    }
}
