//! Page header structure.
//!
//! The header occupies the first 8 bytes of every page:
//!
//! ```text
//! Offset  Size  Description
//! 0       4     record_count: live-insert count (never decremented)
//! 4       4     end_of_records: offset one past the last record byte
//! ```
//!
//! `end_of_records` starts at 8 (just past the header) and only grows;
//! space from deleted or relocated records is never reclaimed.

use crate::page::PageBuf;
use crate::types::PAGE_HEADER_SIZE;

/// Page header structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Number of slots allocated on this page (monotonically increasing)
    pub record_count: i32,
    /// Byte offset, relative to page start, one past the last record byte
    pub end_of_records: i32,
}

impl PageHeader {
    /// Header of a fresh, empty page
    pub fn new() -> Self {
        Self {
            record_count: 0,
            end_of_records: PAGE_HEADER_SIZE as i32,
        }
    }

    /// Read a page header from a page buffer
    pub fn read(page: &PageBuf) -> Self {
        Self {
            record_count: page.read_i32(0),
            end_of_records: page.read_i32(4),
        }
    }

    /// Write this header to a page buffer
    pub fn write(&self, page: &mut PageBuf) {
        page.write_i32(0, self.record_count);
        page.write_i32(4, self.end_of_records);
    }
}

impl Default for PageHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_header() {
        let header = PageHeader::new();
        assert_eq!(header.record_count, 0);
        assert_eq!(header.end_of_records, 8);
    }

    #[test]
    fn test_header_roundtrip() {
        let header = PageHeader {
            record_count: 5,
            end_of_records: 300,
        };

        let mut page = PageBuf::new();
        header.write(&mut page);
        assert_eq!(PageHeader::read(&page), header);
    }
}
