//! Slotted page implementation.
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ Header (8 bytes)                                   │
//! ├────────────────────────────────────────────────────┤
//! │ Record area                                        │
//! │ [record0][record1]...        →                     │
//! ├────────────────────────────────────────────────────┤
//! │ Free space                                         │
//! ├────────────────────────────────────────────────────┤
//! │ Slot directory                                     │
//! │        ←  [slot2][slot1][slot0]                    │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Records grow forward from offset 8; the slot directory grows backward
//! from the end of the page, slot `i` at `[4096-(i+1)*8, 4096-i*8)`.
//! Slots are never removed, so slot numbers are stable handles for the
//! lifetime of the page.

use crate::page::{PageBuf, PageHeader};
use crate::types::{PageId, PAGE_SIZE, SLOT_SIZE};

/// A slot directory entry.
///
/// The on-disk encoding is a pair of i32s, `offset` then `length`:
/// - `offset > 0`: live record at `[offset, offset + length)`
/// - `offset == 0`: tombstone (deleted record)
/// - `offset < 0`: forward; `-offset` is the page and `-length` the slot
///   of the record's current location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Live record bytes within this page
    Live { offset: usize, length: usize },
    /// Deleted record; the slot is retained as a placeholder
    Tombstone,
    /// Record relocated by an update; resolution continues at the target
    Forward { page: PageId, slot: u32 },
}

impl Slot {
    /// Decode a slot from its directory entry pair
    pub fn decode(offset: i32, length: i32) -> Self {
        if offset > 0 {
            Self::Live {
                offset: offset as usize,
                length: length as usize,
            }
        } else if offset == 0 {
            Self::Tombstone
        } else {
            Self::Forward {
                page: PageId::new((-offset) as u32),
                slot: (-length) as u32,
            }
        }
    }

    /// Encode this slot as its directory entry pair
    pub fn encode(self) -> (i32, i32) {
        match self {
            Self::Live { offset, length } => (offset as i32, length as i32),
            Self::Tombstone => (0, 0),
            Self::Forward { page, slot } => (-(page.value() as i32), -(slot as i32)),
        }
    }
}

/// A slotted page holding variable-length records
pub struct SlottedPage {
    /// The raw page data
    data: PageBuf,
    /// Cached header (kept in sync with data)
    header: PageHeader,
}

impl SlottedPage {
    /// Create a new empty page with an initialized header
    pub fn new() -> Self {
        let mut data = PageBuf::new();
        let header = PageHeader::new();
        header.write(&mut data);
        Self { data, header }
    }

    /// Load a page from a raw buffer
    pub fn from_buf(data: PageBuf) -> Self {
        let header = PageHeader::read(&data);
        Self { data, header }
    }

    /// Get the raw bytes of this page
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Number of slots allocated on this page
    pub fn record_count(&self) -> u32 {
        self.header.record_count as u32
    }

    /// Offset one past the last record byte
    pub fn end_of_records(&self) -> usize {
        self.header.end_of_records as usize
    }

    /// Byte offset of slot `index` in the directory
    fn slot_offset(index: u32) -> usize {
        PAGE_SIZE - (index as usize + 1) * SLOT_SIZE
    }

    /// Read the slot directory entry at the given index
    pub fn slot(&self, index: u32) -> Slot {
        let pos = Self::slot_offset(index);
        Slot::decode(self.data.read_i32(pos), self.data.read_i32(pos + 4))
    }

    /// Rewrite the slot directory entry at the given index
    pub fn set_slot(&mut self, index: u32, slot: Slot) {
        let (offset, length) = slot.encode();
        let pos = Self::slot_offset(index);
        self.data.write_i32(pos, offset);
        self.data.write_i32(pos + 4, length);
    }

    /// Free bytes between the record area and the slot directory
    pub fn free_space(&self) -> usize {
        let directory_start = PAGE_SIZE - self.record_count() as usize * SLOT_SIZE;
        directory_start.saturating_sub(self.end_of_records())
    }

    /// Whether a record of the given size fits, counting the directory
    /// entry its slot will occupy
    pub fn can_fit(&self, record_len: usize) -> bool {
        self.free_space() >= record_len + SLOT_SIZE
    }

    /// Append a record to this page, allocating the next slot.
    ///
    /// Returns the new slot number. Callers must check [`can_fit`] first.
    ///
    /// [`can_fit`]: SlottedPage::can_fit
    pub fn append_record(&mut self, record: &[u8]) -> u32 {
        debug_assert!(self.can_fit(record.len()));
        let offset = self.end_of_records();
        let slot = self.record_count();

        self.data.as_bytes_mut()[offset..offset + record.len()].copy_from_slice(record);
        self.set_slot(
            slot,
            Slot::Live {
                offset,
                length: record.len(),
            },
        );

        self.header.record_count += 1;
        self.header.end_of_records += record.len() as i32;
        self.sync_header();

        slot
    }

    /// Record bytes at a live slot's location
    pub fn record_bytes(&self, offset: usize, length: usize) -> &[u8] {
        &self.data[offset..offset + length]
    }

    /// Sync the cached header to the raw page data
    fn sync_header(&mut self) {
        self.header.write(&mut self.data);
    }
}

impl Default for SlottedPage {
    fn default() -> Self {
        Self::new()
    }
}
