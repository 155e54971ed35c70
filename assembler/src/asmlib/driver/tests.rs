use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use base::prelude::{Address, ExtendedAddress, Field, Unsigned12Bit};

use super::super::engine::{assemble_source, EmittedWord};
use super::super::types::AssemblerOptions;
use super::{bin_tape_frames, default_output_path};

fn word(field: u8, address: u16, value: u16) -> EmittedWord {
    EmittedWord {
        location: ExtendedAddress::new(
            Field::try_from(field).expect("valid field"),
            Address::try_from(address).expect("valid address"),
        ),
        word: Unsigned12Bit::truncating(value),
        line: Some(1),
    }
}

fn with_leader(body: &[u8]) -> Vec<u8> {
    let mut frames = vec![0o200; 16];
    frames.extend_from_slice(body);
    frames.extend([0o200; 16]);
    frames
}

#[test]
fn test_empty_tape() {
    assert_eq!(bin_tape_frames(&[]), with_leader(&[0, 0]));
}

#[test]
fn test_contiguous_words() {
    let frames = bin_tape_frames(&[word(0, 0o200, 0o7200), word(0, 0o201, 0o1234)]);
    // The checksum is 102 + 0 + 72 + 0 + 12 + 34 = 242 (octal).
    assert_eq!(
        frames,
        with_leader(&[0o102, 0o00, 0o72, 0o00, 0o12, 0o34, 0o02, 0o42])
    );
}

#[test]
fn test_new_origin_when_not_contiguous() {
    let frames = bin_tape_frames(&[word(0, 0o200, 1), word(0, 0o377, 2)]);
    assert_eq!(
        frames,
        with_leader(&[0o102, 0o00, 0o00, 0o01, 0o103, 0o77, 0o00, 0o02, 0o03, 0o07])
    );
}

#[test]
fn test_field_setting() {
    let frames = bin_tape_frames(&[word(1, 0o200, 0o7402), word(0, 0o201, 0o7402)]);
    // Field frames are not part of the checksum.
    assert_eq!(
        frames,
        with_leader(&[
            0o310, 0o102, 0o00, 0o74, 0o02, 0o300, 0o102, 0o01, 0o74, 0o02, 0o04, 0o01,
        ])
    );
}

#[test]
fn test_checksum_wraps_at_twelve_bits() {
    let words: Vec<EmittedWord> = (0..0o100_u16)
        .map(|n| word(0, 0o200 + n, 0o7777))
        .collect();
    let frames = bin_tape_frames(&words);
    // 102 + 0 + 100 * (77 + 77), modulo 10000 (all octal).
    let sum: u16 = (0o102 + 0o100 * (0o77 + 0o77)) & 0o7777;
    let n = frames.len();
    assert_eq!(frames[n - 18], u8::try_from(sum >> 6).expect("six bits"));
    assert_eq!(frames[n - 17], u8::try_from(sum & 0o77).expect("six bits"));
}

#[test]
fn test_tape_of_assembled_program() {
    let assembly = assemble_source("    CLA\n    TAD @FAR\n    .ORG 1000\nFAR, 0\n", &AssemblerOptions::default());
    assert!(assembly.diagnostics.is_empty());
    let frames = bin_tape_frames(&assembly.words);
    // CLA at 0200, TAD I 0377 at 0201, then 0 at 1000 and the link at 0377.
    let body: &[u8] = &[
        0o102, 0o00, 0o72, 0o00, 0o17, 0o77, // 0200: 7200 1777
        0o110, 0o00, 0o00, 0o00, // 1000: 0000
        0o103, 0o77, 0o10, 0o00, // 0377: 1000
    ];
    let sum: u16 = body.iter().map(|b| u16::from(*b)).sum::<u16>() & 0o7777;
    let mut expected = body.to_vec();
    expected.push(u8::try_from(sum >> 6).expect("six bits"));
    expected.push(u8::try_from(sum & 0o77).expect("six bits"));
    assert_eq!(frames, with_leader(&expected));
}

#[test]
fn test_default_output_path() {
    assert_eq!(
        default_output_path(OsStr::new("prog/hello.pal")),
        PathBuf::from("prog/hello.bin")
    );
    assert_eq!(
        default_output_path(OsStr::new("hello")),
        Path::new("hello.bin")
    );
}
