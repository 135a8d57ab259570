//! Page layer: slotted page format for variable-length records.
//!
//! Each 4096-byte page holds:
//! - An 8-byte header: live-insert count and end-of-records offset
//! - Records appended contiguously from offset 8, growing forward
//! - A slot directory growing backward from the end of the page
//!
//! Slot entries are tri-state: live, tombstoned, or forwarding to the
//! record's current location on another page/slot.

pub mod bitmap;
mod header;
mod slotted;

pub use header::PageHeader;
pub use slotted::{Slot, SlottedPage};

use crate::types::{codec, PAGE_SIZE};

/// A raw page buffer
#[derive(Clone)]
pub struct PageBuf {
    data: [u8; PAGE_SIZE],
}

impl PageBuf {
    /// Create a new zeroed page buffer
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Create a page buffer from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut data = [0u8; PAGE_SIZE];
        let len = bytes.len().min(PAGE_SIZE);
        data[..len].copy_from_slice(&bytes[..len]);
        Self { data }
    }

    /// Get a reference to the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the raw bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Read a big-endian i32 at the given byte offset
    pub fn read_i32(&self, offset: usize) -> i32 {
        codec::decode_i32(&self.data[offset..offset + 4])
    }

    /// Write a big-endian i32 at the given byte offset
    pub fn write_i32(&mut self, offset: usize, value: i32) {
        self.data[offset..offset + 4].copy_from_slice(&codec::encode_i32(value));
    }
}

impl Default for PageBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for PageBuf {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl std::ops::DerefMut for PageBuf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl AsRef<[u8]> for PageBuf {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl AsMut<[u8]> for PageBuf {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i32_access() {
        let mut buf = PageBuf::new();
        buf.write_i32(100, -42);
        assert_eq!(buf.read_i32(100), -42);
        assert_eq!(buf.read_i32(0), 0);
    }

    #[test]
    fn test_from_bytes_pads_short_input() {
        let buf = PageBuf::from_bytes(b"abc");
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(buf[3], 0);
        assert_eq!(buf.as_bytes().len(), PAGE_SIZE);
    }
}
