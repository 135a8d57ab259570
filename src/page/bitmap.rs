//! Null bitmap: per-record bit vector marking which attributes hold a
//! value.
//!
//! The bitmap occupies `ceil(attribute_count / 8)` bytes at the front of
//! every record. Bit `i` (byte `i / 8`, bit `i % 8`) set to 1 means
//! attribute `i` is present; 0 means it is null. Indexing is per byte,
//! so descriptors with more than 31 attributes work the same as small
//! ones.

/// Bitmap size in bytes for the given attribute count
pub fn size(attribute_count: usize) -> usize {
    attribute_count.div_ceil(8)
}

/// Whether attribute `index` is null (bit not set)
pub fn is_null(bitmap: &[u8], index: usize) -> bool {
    bitmap[index / 8] & (1 << (index % 8)) == 0
}

/// Mark attribute `index` as present or null
pub fn set_present(bitmap: &mut [u8], index: usize, present: bool) {
    let mask = 1 << (index % 8);
    if present {
        bitmap[index / 8] |= mask;
    } else {
        bitmap[index / 8] &= !mask;
    }
}
