//! A read-only view of part of one source line.
//!
//! Scanning never modifies a cursor; every operation returns new
//! cursors for the part that was scanned and for what remains.  Each
//! cursor knows where it is in the line, both as a byte index and as
//! the display column (with tabs expanded) used in diagnostics.
use std::fmt::{self, Debug, Formatter};

use super::predicates::{is_comment_start, is_quote, is_whitespace};
use super::types::LineNumber;

const TAB_STOP: usize = 8;

fn advance_column(column: usize, text: &str) -> usize {
    text.chars().fold(column, |col, ch| {
        if ch == '\t' {
            (col / TAB_STOP + 1) * TAB_STOP
        } else {
            col + 1
        }
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct SourceCursor<'a> {
    full_line: &'a str,
    start: usize,
    end: usize,
    row: LineNumber,
    /// Display column of `start`, counted from 0.
    column: usize,
}

impl<'a> SourceCursor<'a> {
    pub(crate) fn new(full_line: &'a str, row: LineNumber) -> SourceCursor<'a> {
        SourceCursor {
            full_line,
            start: 0,
            end: full_line.len(),
            row,
            column: 0,
        }
    }

    pub(crate) fn as_str(&self) -> &'a str {
        &self.full_line[self.start..self.end]
    }

    /// The display column of the start of the cursor, counted from 1
    /// as in diagnostics.
    pub(crate) fn column(&self) -> usize {
        self.column + 1
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, n: usize) -> Option<u8> {
        self.as_str().as_bytes().get(n).copied()
    }

    fn boundary(&self, n: usize) -> usize {
        let s = self.as_str();
        let mut n = n.min(s.len());
        while !s.is_char_boundary(n) {
            n += 1;
        }
        n
    }

    /// Skip the first `n` bytes.
    #[must_use]
    pub(crate) fn consume(&self, n: usize) -> SourceCursor<'a> {
        let n = self.boundary(n);
        SourceCursor {
            start: self.start + n,
            column: advance_column(self.column, &self.as_str()[..n]),
            ..*self
        }
    }

    /// Keep only the first `n` bytes.
    #[must_use]
    pub(crate) fn trunc(&self, n: usize) -> SourceCursor<'a> {
        SourceCursor {
            end: self.start + self.boundary(n),
            ..*self
        }
    }

    pub(crate) fn split_at(&self, n: usize) -> (SourceCursor<'a>, SourceCursor<'a>) {
        (self.trunc(n), self.consume(n))
    }

    pub(crate) fn consume_while<P>(&self, pred: P) -> (SourceCursor<'a>, SourceCursor<'a>)
    where
        P: Fn(u8) -> bool,
    {
        let n = self.as_str().bytes().take_while(|b| pred(*b)).count();
        self.split_at(n)
    }

    pub(crate) fn consume_until<P>(&self, pred: P) -> (SourceCursor<'a>, SourceCursor<'a>)
    where
        P: Fn(u8) -> bool,
    {
        self.consume_while(|b| !pred(b))
    }

    #[must_use]
    pub(crate) fn consume_whitespace(&self) -> SourceCursor<'a> {
        self.consume_while(is_whitespace).1
    }

    #[must_use]
    pub(crate) fn trim_end(&self) -> SourceCursor<'a> {
        let trimmed = self
            .as_str()
            .trim_end_matches(|ch: char| u8::try_from(ch).is_ok_and(is_whitespace));
        self.trunc(trimmed.len())
    }

    #[must_use]
    pub(crate) fn trim(&self) -> SourceCursor<'a> {
        self.consume_whitespace().trim_end()
    }

    pub(crate) fn starts_with<P>(&self, pred: P) -> bool
    where
        P: Fn(u8) -> bool,
    {
        self.peek().is_some_and(pred)
    }

    /// Remove a trailing `;` comment and any whitespace before it.
    /// A `;` inside quotes does not start a comment; an unterminated
    /// quote extends to the end of the line.
    #[must_use]
    pub(crate) fn strip_trailing_comment(&self) -> SourceCursor<'a> {
        let mut quote: Option<u8> = None;
        for (i, b) in self.as_str().bytes().enumerate() {
            match quote {
                Some(q) if b == q => {
                    quote = None;
                }
                Some(_) => (),
                None if is_quote(b) => {
                    quote = Some(b);
                }
                None if is_comment_start(b) => {
                    return self.trunc(i).trim_end();
                }
                None => (),
            }
        }
        self.trim_end()
    }

    /// Split at each `sep` byte which is not inside quotes.  Each
    /// piece has surrounding whitespace removed.  Blank text has no
    /// pieces at all.
    pub(crate) fn split_params(&self, sep: u8) -> Vec<SourceCursor<'a>> {
        let text = self.trim();
        if text.is_empty() {
            return Vec::new();
        }
        let mut pieces = Vec::new();
        let mut rest = text;
        let mut quote: Option<u8> = None;
        let mut i = 0;
        let bytes = text.as_str().as_bytes();
        let mut piece_start = 0;
        while i < bytes.len() {
            let b = bytes[i];
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => (),
                None if is_quote(b) => quote = Some(b),
                None if b == sep => {
                    let (piece, after) = rest.split_at(i - piece_start);
                    pieces.push(piece.trim());
                    rest = after.consume(1);
                    piece_start = i + 1;
                }
                None => (),
            }
            i += 1;
        }
        pieces.push(rest.trim());
        pieces
    }
}

impl Debug for SourceCursor<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SourceCursor {{ row: {}, column: {}, text: {:?} }}",
            self.row,
            self.column(),
            self.as_str()
        )
    }
}
