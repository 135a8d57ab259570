//! Common types used throughout the storage engine.

pub mod codec;
mod page_id;
mod record_id;

pub use page_id::PageId;
pub use record_id::RecordId;

use crate::page::bitmap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Size of the per-page header: `record_count: i32`, `end_of_records: i32`
pub const PAGE_HEADER_SIZE: usize = 8;

/// Size of a slot directory entry: `offset: i32`, `length: i32`
pub const SLOT_SIZE: usize = 8;

/// Maximum record payload: a full page minus the header and one slot entry
pub const MAX_RECORD_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE - SLOT_SIZE;

/// Storage type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeType {
    /// Fixed-width character data, padded/truncated to the declared length
    Varchar,
    /// 32-bit signed integer
    Int,
    /// 64-bit IEEE-754 floating point
    Real,
}

/// A single column of a record: type, fixed storage width, and name.
///
/// Immutable once part of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name, unique within a descriptor (caller responsibility)
    pub name: String,
    /// Storage type
    pub attr_type: AttributeType,
    /// Fixed storage width in bytes
    pub length: u32,
}

impl Attribute {
    /// A 4-byte INT attribute
    pub fn int(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attr_type: AttributeType::Int,
            length: 4,
        }
    }

    /// An 8-byte REAL attribute
    pub fn real(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attr_type: AttributeType::Real,
            length: 8,
        }
    }

    /// A VARCHAR attribute stored at the given fixed width
    pub fn varchar(name: impl Into<String>, length: u32) -> Self {
        Self {
            name: name.into(),
            attr_type: AttributeType::Varchar,
            length,
        }
    }
}

/// Ordered attribute list defining the on-disk field order of a record.
///
/// Field offsets are statically computable from the descriptor alone:
/// `offset(i) = null_bitmap_size + sum(length(j) for j < i)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDescriptor {
    attributes: Vec<Attribute>,
}

impl RecordDescriptor {
    /// Create a descriptor from an ordered attribute list
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the descriptor has no attributes
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterate over the attributes in on-disk order
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    /// Get the attribute at the given position
    pub fn get(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    /// Find the position of an attribute by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// Size of the null bitmap for records of this descriptor
    pub fn bitmap_size(&self) -> usize {
        bitmap::size(self.attributes.len())
    }

    /// Byte offset of field `index` within a record
    pub fn field_offset(&self, index: usize) -> usize {
        self.bitmap_size()
            + self.attributes[..index]
                .iter()
                .map(|a| a.length as usize)
                .sum::<usize>()
    }

    /// Total record size: bitmap plus every fixed-width field
    pub fn record_size(&self) -> usize {
        self.field_offset(self.attributes.len())
    }
}

/// Comparison operator for scan conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Whether an ordering between attribute and threshold satisfies the
    /// operator
    pub fn matches(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new(vec![
            Attribute::int("id"),
            Attribute::varchar("name", 10),
            Attribute::real("score"),
        ])
    }

    #[test]
    fn test_field_offsets() {
        let desc = descriptor();
        // 3 attributes -> 1 bitmap byte
        assert_eq!(desc.bitmap_size(), 1);
        assert_eq!(desc.field_offset(0), 1);
        assert_eq!(desc.field_offset(1), 5);
        assert_eq!(desc.field_offset(2), 15);
        assert_eq!(desc.record_size(), 23);
    }

    #[test]
    fn test_index_of() {
        let desc = descriptor();
        assert_eq!(desc.index_of("name"), Some(1));
        assert_eq!(desc.index_of("missing"), None);
    }

    #[test]
    fn test_compare_op_matches() {
        use Ordering::*;
        assert!(CompareOp::Eq.matches(Equal));
        assert!(!CompareOp::Eq.matches(Less));
        assert!(CompareOp::Ne.matches(Greater));
        assert!(CompareOp::Lt.matches(Less));
        assert!(CompareOp::Le.matches(Equal));
        assert!(CompareOp::Gt.matches(Greater));
        assert!(CompareOp::Ge.matches(Equal));
        assert!(!CompareOp::Ge.matches(Less));
    }

    #[test]
    fn test_descriptor_serde_roundtrip() {
        let desc = descriptor();
        let json = serde_json::to_string(&desc).unwrap();
        let back: RecordDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }
}
