//! Convenience utilities for splitting 12-bit PDP-8 words into 6-bit
//! halves and for joining them together.  Both SIXBIT text and the
//! BIN paper tape format carry a word as two six-bit frames.

use crate::unsigned::{Unsigned12Bit, Unsigned6Bit};

/// Split a 12-bit word into its left (more significant) and right
/// 6-bit halves.
pub fn split_halves(w: Unsigned12Bit) -> (Unsigned6Bit, Unsigned6Bit) {
    (left_half(w), right_half(w))
}

/// Join two 6-bit values into a 12-bit word.
pub fn join_halves(left: Unsigned6Bit, right: Unsigned6Bit) -> Unsigned12Bit {
    Unsigned12Bit::truncating((u16::from(left) << 6) | u16::from(right))
}

/// Extract the left (more-significant) half of a word.
pub fn left_half(word: Unsigned12Bit) -> Unsigned6Bit {
    let bits: u16 = u16::from(word) >> 6;
    Unsigned6Bit::truncating((bits & 0o77) as u8)
}

/// Extract the right (less-significant) half of a word.
pub fn right_half(word: Unsigned12Bit) -> Unsigned6Bit {
    let bits: u16 = u16::from(word);
    Unsigned6Bit::truncating((bits & 0o77) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_octal_eq {
        ($left:expr, $right:expr $(,)?) => {{
            match (&$left, &$right) {
                (left_val, right_val) => {
                    if !(*left_val == *right_val) {
                        panic!(
                            "Assertion failed: {:>#06o} != {:>#06o}",
                            left_val, right_val
                        );
                    }
                }
            }
        }};
    }

    #[test]
    fn test_join_halves() {
        assert_octal_eq!(
            join_halves(
                Unsigned6Bit::try_from(0o12_u8).unwrap(),
                Unsigned6Bit::try_from(0o34_u8).unwrap()
            ),
            Unsigned12Bit::try_from(0o1234_u16).unwrap()
        );
    }

    #[test]
    fn test_split_halves() {
        let w = Unsigned12Bit::try_from(0o5671_u16).expect("valid test data");
        assert_eq!(
            split_halves(w),
            (
                Unsigned6Bit::try_from(0o56_u8).unwrap(),
                Unsigned6Bit::try_from(0o71_u8).unwrap()
            )
        );
    }
}
