//! Condition evaluation: typed comparison of an attribute value against
//! a threshold.

use crate::record::row::strip_padding;
use crate::types::{codec, AttributeType, CompareOp};

/// Evaluate `attribute <op> threshold` for the given attribute type.
///
/// VARCHAR compares lexicographically after stripping NUL padding from
/// both sides; INT compares as i32, REAL as f64. REAL comparisons where
/// either side is NaN never match.
pub fn evaluate(
    attr_type: AttributeType,
    attribute: &[u8],
    op: CompareOp,
    threshold: &[u8],
) -> bool {
    match attr_type {
        AttributeType::Varchar => {
            op.matches(strip_padding(attribute).cmp(strip_padding(threshold)))
        }
        AttributeType::Int => {
            op.matches(codec::decode_i32(attribute).cmp(&codec::decode_i32(threshold)))
        }
        AttributeType::Real => {
            match codec::decode_f64(attribute).partial_cmp(&codec::decode_f64(threshold)) {
                Some(ordering) => op.matches(ordering),
                None => false,
            }
        }
    }
}
