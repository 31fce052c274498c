//! Bit-exact text codec for `f64`.
//!
//! Decimal formatting of doubles is only round-trip safe when every reader and
//! writer agrees on the shortest-representation algorithm, and it says nothing
//! about NaN payloads or the sign of zero. This codec sidesteps the problem by
//! writing the IEEE-754 bit pattern itself as a decimal `i64`, followed by
//! [`BIT_PATTERN_MARKER`]:
//!
//! ```rust
//! use bitplist::{decode_real, encode_real};
//!
//! assert_eq!(encode_real(1.0), "4607182418800017408L");
//! assert_eq!(decode_real("4607182418800017408L").unwrap(), 1.0);
//!
//! // Legacy documents carry plain decimals, which still decode.
//! assert_eq!(decode_real("2.5").unwrap(), 2.5);
//! ```

use crate::{Error, Result};

/// Suffix that marks a `real` payload as a raw bit pattern rather than a decimal.
pub const BIT_PATTERN_MARKER: char = 'L';

/// Encodes `v` as the signed decimal of its bit pattern plus [`BIT_PATTERN_MARKER`].
#[must_use]
pub fn encode_real(v: f64) -> String {
    let mut out = (v.to_bits() as i64).to_string();
    out.push(BIT_PATTERN_MARKER);
    out
}

/// Decodes a `real` payload.
///
/// Payloads ending in [`BIT_PATTERN_MARKER`] are reinterpreted bit for bit.
/// Anything else goes through the decimal parser, which is exact only for
/// values whose decimal text maps back to the same double.
///
/// # Errors
///
/// Returns [`Error::MalformedNumber`] if neither form parses.
pub fn decode_real(s: &str) -> Result<f64> {
    let text = s.trim();
    if let Some(bits) = text.strip_suffix(BIT_PATTERN_MARKER) {
        return bits
            .parse::<i64>()
            .map(|b| f64::from_bits(b as u64))
            .map_err(|_| Error::malformed_number(s));
    }
    text.parse::<f64>().map_err(|_| Error::malformed_number(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bit_exact(v: f64) {
        let decoded = decode_real(&encode_real(v)).unwrap();
        assert_eq!(decoded.to_bits(), v.to_bits(), "lost bits for {v:e}");
    }

    #[test]
    fn test_special_values_round_trip() {
        for v in [
            0.0,
            -0.0,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NAN,
            f64::MIN_POSITIVE,
            f64::MAX,
            f64::MIN,
            f64::EPSILON,
        ] {
            assert_bit_exact(v);
        }
    }

    #[test]
    fn test_nan_payload_and_subnormals() {
        assert_bit_exact(f64::from_bits(0x7ff8_0000_dead_beef));
        assert_bit_exact(f64::from_bits(0xfff0_0000_0000_0001));
        assert_bit_exact(f64::from_bits(1));
        assert_bit_exact(f64::MIN_POSITIVE / 3.0);
    }

    #[test]
    fn test_negative_values_use_signed_pattern() {
        let encoded = encode_real(-1.0);
        assert!(encoded.starts_with('-'));
        assert!(encoded.ends_with('L'));
        assert_eq!(decode_real(&encoded).unwrap(), -1.0);
    }

    #[test]
    fn test_legacy_decimal() {
        assert_eq!(decode_real("0.1").unwrap(), 0.1);
        assert_eq!(decode_real(" 1e-3 ").unwrap(), 1e-3);
        assert!(decode_real("-inf").unwrap().is_infinite());
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            decode_real("12.5L"),
            Err(Error::MalformedNumber { .. })
        ));
        assert!(decode_real("").is_err());
        assert!(decode_real("L").is_err());
        assert!(decode_real("abc").is_err());
    }
}
