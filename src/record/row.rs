//! Row encoding: typed values to and from the record wire format.
//!
//! A record is `[null bitmap][field 0][field 1]...` with every field at
//! its fixed declared width, in descriptor order. Null fields are
//! zero-filled so all offsets stay statically computable. VARCHAR values
//! are padded with NULs (or truncated) to the declared length.

use crate::error::{Result, StorageError};
use crate::page::bitmap;
use crate::types::{codec, Attribute, AttributeType, RecordDescriptor};

/// A typed attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit float
    Real(f64),
    /// Character data
    Varchar(String),
}

impl Value {
    /// The storage type of this value
    pub fn attr_type(&self) -> AttributeType {
        match self {
            Self::Int(_) => AttributeType::Int,
            Self::Real(_) => AttributeType::Real,
            Self::Varchar(_) => AttributeType::Varchar,
        }
    }

    /// Encode this value at the attribute's fixed width
    pub fn encode(&self, attribute: &Attribute) -> Result<Vec<u8>> {
        if self.attr_type() != attribute.attr_type {
            return Err(StorageError::invalid_operation(format!(
                "value {:?} does not match attribute {:?} of type {:?}",
                self, attribute.name, attribute.attr_type
            )));
        }

        let width = attribute.length as usize;
        let bytes = match self {
            Self::Int(v) => codec::encode_i32(*v).to_vec(),
            Self::Real(v) => codec::encode_f64(*v).to_vec(),
            Self::Varchar(s) => {
                let mut field = s.as_bytes().to_vec();
                field.resize(width, 0);
                field
            }
        };

        if bytes.len() != width {
            return Err(StorageError::invalid_operation(format!(
                "attribute {:?} declares width {} but {:?} encodes to {} bytes",
                attribute.name,
                width,
                attribute.attr_type,
                bytes.len()
            )));
        }
        Ok(bytes)
    }

    /// Decode a fixed-width field back into a value
    pub fn decode(attribute: &Attribute, field: &[u8]) -> Self {
        match attribute.attr_type {
            AttributeType::Int => Self::Int(codec::decode_i32(field)),
            AttributeType::Real => Self::Real(codec::decode_f64(field)),
            AttributeType::Varchar => {
                Self::Varchar(String::from_utf8_lossy(strip_padding(field)).into_owned())
            }
        }
    }
}

/// Strip trailing NUL padding from a fixed-width VARCHAR field
pub fn strip_padding(field: &[u8]) -> &[u8] {
    let end = field
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |pos| pos + 1);
    &field[..end]
}

/// Encode a row of optional values into record bytes.
///
/// `values` must supply one entry per descriptor attribute; `None` marks
/// the attribute null (its field bytes are zero-filled).
pub fn encode_row(descriptor: &RecordDescriptor, values: &[Option<Value>]) -> Result<Vec<u8>> {
    if values.len() != descriptor.len() {
        return Err(StorageError::invalid_operation(format!(
            "descriptor has {} attributes but row supplies {} values",
            descriptor.len(),
            values.len()
        )));
    }

    let mut record = vec![0u8; descriptor.record_size()];
    let bitmap_size = descriptor.bitmap_size();

    for (index, (attribute, value)) in descriptor.iter().zip(values).enumerate() {
        if let Some(value) = value {
            let field = value.encode(attribute)?;
            let offset = descriptor.field_offset(index);
            record[offset..offset + field.len()].copy_from_slice(&field);
            bitmap::set_present(&mut record[..bitmap_size], index, true);
        }
    }

    Ok(record)
}

/// Decode record bytes back into a row of optional values
pub fn decode_row(descriptor: &RecordDescriptor, record: &[u8]) -> Result<Vec<Option<Value>>> {
    if record.len() != descriptor.record_size() {
        return Err(StorageError::invalid_operation(format!(
            "descriptor expects {}-byte records, got {} bytes",
            descriptor.record_size(),
            record.len()
        )));
    }

    let bitmap = &record[..descriptor.bitmap_size()];
    let mut row = Vec::with_capacity(descriptor.len());

    for (index, attribute) in descriptor.iter().enumerate() {
        if bitmap::is_null(bitmap, index) {
            row.push(None);
        } else {
            let offset = descriptor.field_offset(index);
            let field = &record[offset..offset + attribute.length as usize];
            row.push(Some(Value::decode(attribute, field)));
        }
    }

    Ok(row)
}
