//! DEC BIN loader format.
//!
//! The tape starts and ends with leader/trailer (frames with only
//! channel 8 punched).  In between, each frame carries six bits of
//! data plus two control bits:
//!
//! ```text
//! 0200          leader / trailer
//! 0300 | f<<3   select memory field f
//! 0100 | hi6    origin (first frame); the next frame has the low 6 bits
//! 00xx          data (two frames per word, high half first)
//! ```
//!
//! The last two data frames before the trailer are a checksum: the
//! 12-bit sum of all the origin and data frames.  Field settings are
//! not included in the checksum.
use std::io::Write;
use std::path::Path;

use tracing::{event, span, Level};

use base::prelude::{split_halves, Address, Field, Unsigned12Bit};

use super::super::engine::EmittedWord;
use super::super::types::AssemblerFailure;

const LEADER: u8 = 0o200;
const LEADER_LENGTH: usize = 16;
const ORIGIN_FLAG: u8 = 0o100;
const FIELD_FLAG: u8 = 0o300;

#[derive(Debug, Default)]
struct TapeBuilder {
    frames: Vec<u8>,
    checksum: u16,
}

impl TapeBuilder {
    fn leader(&mut self) {
        self.frames.extend([LEADER; LEADER_LENGTH]);
    }

    fn checked(&mut self, frame: u8) {
        self.checksum = (self.checksum + u16::from(frame)) & 0o7777;
        self.frames.push(frame);
    }

    fn field(&mut self, field: Field) {
        self.frames.push(FIELD_FLAG | (u8::from(field) << 3));
    }

    fn origin(&mut self, address: Address) {
        let (high, low) = split_halves(address.bits());
        self.checked(ORIGIN_FLAG | u8::from(high));
        self.checked(u8::from(low));
    }

    fn data(&mut self, word: Unsigned12Bit) {
        let (high, low) = split_halves(word);
        self.checked(u8::from(high));
        self.checked(u8::from(low));
    }

    fn finish(mut self) -> Vec<u8> {
        let (high, low) = split_halves(Unsigned12Bit::truncating(self.checksum));
        event!(Level::DEBUG, "tape checksum is {:04o}", self.checksum);
        self.frames.push(u8::from(high));
        self.frames.push(u8::from(low));
        self.leader();
        self.frames
    }
}

/// The frames of a BIN tape holding `words`.
#[must_use]
pub fn bin_tape_frames(words: &[EmittedWord]) -> Vec<u8> {
    let mut tape = TapeBuilder::default();
    tape.leader();
    let mut field = Field::ZERO;
    let mut next: Option<Address> = None;
    for w in words {
        if w.location.field != field {
            field = w.location.field;
            tape.field(field);
            next = None;
        }
        if next != Some(w.location.address) {
            tape.origin(w.location.address);
        }
        tape.data(w.word);
        next = Some(w.location.address.successor());
    }
    tape.finish()
}

/// Punch `words` as a BIN tape.
///
/// # Errors
///
/// Failure to write the output file.
pub fn write_bin_tape<W: Write>(
    words: &[EmittedWord],
    writer: &mut W,
    output_file_name: &Path,
) -> Result<(), AssemblerFailure> {
    let span = span!(Level::ERROR, "write BIN tape");
    let _enter = span.enter();
    let frames = bin_tape_frames(words);
    event!(Level::DEBUG, "punching {} frames", frames.len());
    writer
        .write_all(&frames)
        .and_then(|()| writer.flush())
        .map_err(|error| AssemblerFailure::IoErrorOnOutput {
            filename: output_file_name.to_path_buf(),
            error,
        })
}
