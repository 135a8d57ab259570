//! Fixed-width binary encodings for stored values.
//!
//! All integers are stored as big-endian two's complement and REAL
//! values as big-endian IEEE-754 doubles. Decoders are pure functions of
//! already-validated slices: callers guarantee the width.

/// Encode an i32 as 4 big-endian bytes.
pub fn encode_i32(value: i32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Decode an i32 from the first 4 bytes of a slice.
pub fn decode_i32(bytes: &[u8]) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    i32::from_be_bytes(buf)
}

/// Encode an f64 as 8 big-endian bytes.
pub fn encode_f64(value: f64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decode an f64 from the first 8 bytes of a slice.
pub fn decode_f64(bytes: &[u8]) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    f64::from_be_bytes(buf)
}

/// Concatenate byte slices into one buffer.
pub fn concat(pieces: &[&[u8]]) -> Vec<u8> {
    let total: usize = pieces.iter().map(|p| p.len()).sum();
    let mut buf = Vec::with_capacity(total);
    for piece in pieces {
        buf.extend_from_slice(piece);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i32_roundtrip() {
        for value in [0, 1, -1, 42, i32::MIN, i32::MAX] {
            assert_eq!(decode_i32(&encode_i32(value)), value);
        }
    }

    #[test]
    fn test_i32_is_big_endian() {
        assert_eq!(encode_i32(1), [0, 0, 0, 1]);
        assert_eq!(encode_i32(-1), [0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_f64_roundtrip() {
        for value in [0.0, 1.5, -273.15, f64::MIN, f64::MAX] {
            assert_eq!(decode_f64(&encode_f64(value)), value);
        }
    }

    #[test]
    fn test_f64_is_native_float_encoding() {
        // REAL values are stored as IEEE-754 doubles, not reinterpreted
        // integers.
        assert_eq!(encode_f64(1.0), 1.0f64.to_be_bytes());
        assert!(decode_f64(&encode_f64(f64::NAN)).is_nan());
    }

    #[test]
    fn test_concat() {
        assert_eq!(concat(&[b"ab", b"", b"cde"]), b"abcde");
        assert!(concat(&[]).is_empty());
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let bytes = concat(&[&encode_i32(7), b"rest"]);
        assert_eq!(decode_i32(&bytes), 7);
    }
}
