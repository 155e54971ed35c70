use super::{ConversionFailed, Unsigned12Bit, Unsigned3Bit, Unsigned6Bit, Unsigned7Bit};

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
fn test_unsigned12bit_max() {
    assert_eq!(Unsigned12Bit::MAX.bits, 0o7777);
}

#[test]
fn test_unsigned12bit_min() {
    assert_eq!(Unsigned12Bit::MIN.bits, 0);
}

#[test]
fn test_small_type_limits() {
    assert_eq!(Unsigned3Bit::MAX.bits, 7);
    assert_eq!(Unsigned6Bit::MAX.bits, 0o77);
    assert_eq!(Unsigned7Bit::MAX.bits, 0o177);
}

#[test]
fn test_try_from_u16() {
    assert_octal_eq!(Unsigned12Bit::try_from(0o7777_u16).unwrap().bits, 0o7777_u16);
    assert_eq!(
        Unsigned12Bit::try_from(0o10000_u16),
        Err(ConversionFailed::TooLarge)
    );
}

#[test]
fn test_try_from_negative() {
    assert_eq!(
        Unsigned12Bit::try_from(-1_i32),
        Err(ConversionFailed::TooSmall)
    );
    assert_eq!(Unsigned3Bit::try_from(-1_i8), Err(ConversionFailed::TooSmall));
}

#[test]
fn test_try_from_unsigned12bit_u8() {
    assert_eq!(u8::try_from(Unsigned12Bit::from(0o377_u8)), Ok(0o377_u8));
    assert_eq!(
        u8::try_from(Unsigned12Bit::try_from(0o400_u16).unwrap()),
        Err(ConversionFailed::TooLarge)
    );
}

#[test]
fn test_truncating() {
    assert_octal_eq!(Unsigned12Bit::truncating(0o17777).bits, 0o7777_u16);
    assert_octal_eq!(Unsigned7Bit::truncating(0o377).bits, 0o177_u8);
}

#[test]
fn test_wrapping_add_wraps_at_word_size() {
    let w = Unsigned12Bit::MAX.wrapping_add(Unsigned12Bit::ONE);
    assert_eq!(w, Unsigned12Bit::ZERO);
    assert_eq!(Unsigned12Bit::MAX.checked_add(Unsigned12Bit::ONE), None);
}

#[test]
fn test_as_signed() {
    assert_eq!(Unsigned12Bit::MAX.as_signed(), -1);
    assert_eq!(Unsigned12Bit::try_from(0o4000_u16).unwrap().as_signed(), -2048);
    assert_eq!(Unsigned12Bit::try_from(0o3777_u16).unwrap().as_signed(), 2047);
}

#[test]
fn test_negate() {
    let one = Unsigned12Bit::ONE;
    assert_eq!(one.negate(), Unsigned12Bit::MAX);
    assert_eq!(Unsigned12Bit::ZERO.negate(), Unsigned12Bit::ZERO);
}

#[test]
fn test_bit_operations_stay_in_range() {
    let w = Unsigned12Bit::try_from(0o7000_u16).unwrap();
    assert_octal_eq!((w | 0o7777_u16).bits, 0o7777_u16);
    assert_octal_eq!((!w).bits, 0o0777_u16);
    assert_octal_eq!((w & 0o1234_u16).bits, 0o1000_u16);
}

#[test]
fn test_widening() {
    let f = Unsigned3Bit::try_from(5_u8).unwrap();
    assert_eq!(Unsigned12Bit::from(f), 5_u16);
}

#[cfg(test)]
mod u12_proptests {
    use super::super::Unsigned12Bit;
    use test_strategy::{proptest, Arbitrary};

    #[derive(Debug, Arbitrary)]
    struct U12SubtractionTestInput {
        #[strategy(0..0o10000u16)]
        greater: u16,
        #[strategy(0..=#greater)]
        lesser: u16,
    }

    #[proptest]
    fn wrapping_sub_and_checked_sub_give_same_result(input: U12SubtractionTestInput) {
        let lesser = Unsigned12Bit::try_from(input.lesser).unwrap();
        let greater = Unsigned12Bit::try_from(input.greater).unwrap();

        if let Some(diff) = greater.checked_sub(lesser) {
            let wdiff: Unsigned12Bit = greater.wrapping_sub(lesser);
            assert_eq!(diff, wdiff);
        }
    }

    #[proptest]
    fn subtraction_is_reverse_of_addition(input: U12SubtractionTestInput) {
        let lesser = Unsigned12Bit::try_from(input.lesser).unwrap();
        let greater = Unsigned12Bit::try_from(input.greater).unwrap();

        match greater.checked_sub(lesser) {
            None => {
                panic!("{greater}.checked_sub({lesser}) should not be None");
            }
            Some(diff) => {
                assert_eq!(lesser.checked_add(diff), Some(greater));
                assert_eq!(diff.checked_add(lesser), Some(greater));
            }
        }
    }

    #[proptest]
    fn negation_is_an_involution(#[strategy(0..0o10000u16)] n: u16) {
        let w = Unsigned12Bit::try_from(n).unwrap();
        assert_eq!(w.negate().negate(), w);
        assert_eq!(w.wrapping_add(w.negate()), Unsigned12Bit::ZERO);
    }
}
