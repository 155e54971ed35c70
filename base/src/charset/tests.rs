use super::*;

fn sixbit(s: &str) -> Vec<Unsigned6Bit> {
    s.chars()
        .map(|ch| sixbit_of_char(ch).expect("test data should be SIXBIT"))
        .collect()
}

#[test]
fn test_sixbit_of_char() {
    assert_eq!(sixbit_of_char('A'), Ok(Unsigned6Bit::truncating(0o01)));
    assert_eq!(sixbit_of_char('a'), Ok(Unsigned6Bit::truncating(0o01)));
    assert_eq!(sixbit_of_char(' '), Ok(SIXBIT_SPACE));
    assert_eq!(sixbit_of_char('@'), Ok(Unsigned6Bit::ZERO));
    assert_eq!(sixbit_of_char('\t'), Err(NoSixbitMapping('\t')));
    assert_eq!(sixbit_of_char('é'), Err(NoSixbitMapping('é')));
}

#[test]
fn test_char_of_sixbit() {
    assert_eq!(char_of_sixbit(Unsigned6Bit::truncating(0o01)), 'A');
    assert_eq!(char_of_sixbit(Unsigned6Bit::truncating(0o40)), ' ');
    assert_eq!(char_of_sixbit(Unsigned6Bit::truncating(0o60)), '0');
}

#[test]
fn test_pack_sixbit_even_and_odd() {
    assert_eq!(
        pack_sixbit(&sixbit("HI"), SIXBIT_SPACE),
        vec![Unsigned12Bit::truncating(0o1011)]
    );
    assert_eq!(
        pack_sixbit(&sixbit("HEY"), SIXBIT_SPACE),
        vec![
            Unsigned12Bit::truncating(0o1005),
            Unsigned12Bit::truncating(0o3140)
        ]
    );
}

#[test]
fn test_pack_ascii_layout() {
    // 'A' = 101, 'B' = 102, 'C' = 103.
    assert_eq!(
        pack_ascii(b"ABC"),
        vec![
            Unsigned12Bit::truncating(0o2101),
            Unsigned12Bit::truncating(0o3102)
        ]
    );
    assert_eq!(
        pack_ascii(b"AB"),
        vec![
            Unsigned12Bit::truncating(0o0101),
            Unsigned12Bit::truncating(0o0102)
        ]
    );
}

#[test]
fn test_unpack_ascii_recovers_groups() {
    let words = pack_ascii(b"PDP-8\0");
    assert_eq!(unpack_ascii(&words), b"PDP-8\0".to_vec());
}

#[cfg(test)]
mod charset_proptests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn sixbit_packing_is_reversible(#[strategy("[A-Z0-9 ]{0,20}")] text: String) {
        let codes = sixbit(&text);
        let mut unpacked = unpack_sixbit(&pack_sixbit(&codes, SIXBIT_SPACE));
        if unpacked.len() > codes.len() {
            assert_eq!(unpacked.pop(), Some(SIXBIT_SPACE));
        }
        assert_eq!(unpacked, codes);
    }

    #[proptest]
    fn ascii_packing_is_reversible(#[strategy("[ -~]{0,20}")] text: String) {
        let bytes = text.as_bytes();
        let unpacked = unpack_ascii(&pack_ascii(bytes));
        assert_eq!(&unpacked[..bytes.len()], bytes);
        assert!(unpacked[bytes.len()..].iter().all(|b| *b == 0));
    }
}
