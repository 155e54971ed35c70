//! Character set conversions.
//!
//! PDP-8 software stores text in one of two ways:
//!
//! - SIXBIT: the ASCII range 040 to 137 (space to underscore, upper
//!   case only) folded into six bits, two characters per word.
//! - Packed ASCII (as used by OS/8 text files): three 8-bit
//!   characters in two words.  The first two characters occupy the
//!   low eight bits of each word; the third is split across the high
//!   four bits of both words.
//!
//! ```text
//!          11  8 7        0
//! word 1: | c3hi |   c1    |
//! word 2: | c3lo |   c2    |
//! ```
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use crate::subword::{join_halves, split_halves};
use crate::unsigned::{Unsigned12Bit, Unsigned6Bit};

#[cfg(test)]
mod tests;

/// The SIXBIT code for a space, used to pad an odd number of
/// characters out to a whole word.
pub const SIXBIT_SPACE: Unsigned6Bit = Unsigned6Bit::truncating(0o40);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct NoSixbitMapping(pub char);

impl Display for NoSixbitMapping {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "character '{}' has no SIXBIT representation (only space to underscore can be represented)",
            self.0.escape_default()
        )
    }
}

impl Error for NoSixbitMapping {}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct NotAscii(pub char);

impl Display for NotAscii {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "character '{}' is not ASCII", self.0.escape_default())
    }
}

impl Error for NotAscii {}

/// Convert a character to SIXBIT.  Lower case letters are folded to
/// upper case, since SIXBIT has no lower case.
pub fn sixbit_of_char(ch: char) -> Result<Unsigned6Bit, NoSixbitMapping> {
    let upper = ch.to_ascii_uppercase();
    match u8::try_from(upper) {
        Ok(code @ 0o40..=0o137) => Ok(Unsigned6Bit::truncating(code & 0o77)),
        _ => Err(NoSixbitMapping(ch)),
    }
}

/// Convert a SIXBIT code back to the character it represents.
pub fn char_of_sixbit(code: Unsigned6Bit) -> char {
    let n: u8 = u8::from(code);
    if n < 0o40 {
        char::from(n + 0o100)
    } else {
        char::from(n)
    }
}

pub fn ascii_of_char(ch: char) -> Result<u8, NotAscii> {
    if ch.is_ascii() {
        u8::try_from(ch).map_err(|_| NotAscii(ch))
    } else {
        Err(NotAscii(ch))
    }
}

/// Pack SIXBIT characters two to a word, the first character in the
/// left half.  An odd final character is paired with `pad`.
pub fn pack_sixbit(chars: &[Unsigned6Bit], pad: Unsigned6Bit) -> Vec<Unsigned12Bit> {
    chars
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => join_halves(*left, *right),
            [left] => join_halves(*left, pad),
            _ => unreachable!("chunks(2) yields one or two items"),
        })
        .collect()
}

pub fn unpack_sixbit(words: &[Unsigned12Bit]) -> Vec<Unsigned6Bit> {
    words
        .iter()
        .flat_map(|w| {
            let (left, right) = split_halves(*w);
            [left, right]
        })
        .collect()
}

/// Pack 8-bit characters three to every two words.  A final partial
/// group is padded with NUL.
pub fn pack_ascii(bytes: &[u8]) -> Vec<Unsigned12Bit> {
    let mut words = Vec::with_capacity(bytes.len().div_ceil(3) * 2);
    for group in bytes.chunks(3) {
        let c1 = u16::from(group[0]);
        let c2 = u16::from(group.get(1).copied().unwrap_or(0));
        let c3 = u16::from(group.get(2).copied().unwrap_or(0));
        words.push(Unsigned12Bit::truncating(((c3 & 0o360) << 4) | c1));
        words.push(Unsigned12Bit::truncating(((c3 & 0o17) << 8) | c2));
    }
    words
}

/// Reverse of [`pack_ascii`].  An odd trailing word contributes its
/// low eight bits only.
pub fn unpack_ascii(words: &[Unsigned12Bit]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() / 2 * 3 + 1);
    for pair in words.chunks(2) {
        let w1 = u16::from(pair[0]);
        bytes.push((w1 & 0o377) as u8);
        if let Some(w2) = pair.get(1) {
            let w2 = u16::from(*w2);
            bytes.push((w2 & 0o377) as u8);
            bytes.push((((w1 >> 4) & 0o360) | ((w2 >> 8) & 0o17)) as u8);
        }
    }
    bytes
}
