//! Diagnostics are reported with the single-letter codes used by
//! classic PDP-8 assemblers.  A diagnostic never stops assembly; the
//! program is always assembled in full and the diagnostics are
//! returned alongside the object code.
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use tracing::{event, Level};

use super::types::LineNumber;

/// The kinds of problem the assembler can diagnose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCode {
    /// `O`: operate micro-instructions which cannot be combined.
    IllegalOprCombination,
    /// `W`: a memory reference to a location which is neither on page
    /// zero nor on the current page.
    OffPage,
    /// `M`: a symbol (or user opcode) defined more than once.
    MultipleDefinition,
    /// `F`: a field number out of range, or a reference to a label
    /// in another field.
    Field,
    /// `A`: a value out of range, or division by zero.
    Arithmetic,
    /// `P`: no room on the current page for a link or literal.
    PageFull,
    /// `Z`: misuse of a pseudo-op.
    PseudoOp,
    /// `S`: a malformed label or symbol name.
    BadSymbol,
    /// `X`: a syntax error.
    Syntax,
    /// `U`: an undefined symbol.
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 10] = [
        ErrorCode::IllegalOprCombination,
        ErrorCode::OffPage,
        ErrorCode::MultipleDefinition,
        ErrorCode::Field,
        ErrorCode::Arithmetic,
        ErrorCode::PageFull,
        ErrorCode::PseudoOp,
        ErrorCode::BadSymbol,
        ErrorCode::Syntax,
        ErrorCode::Undefined,
    ];

    #[must_use]
    pub fn letter(&self) -> char {
        match self {
            ErrorCode::IllegalOprCombination => 'O',
            ErrorCode::OffPage => 'W',
            ErrorCode::MultipleDefinition => 'M',
            ErrorCode::Field => 'F',
            ErrorCode::Arithmetic => 'A',
            ErrorCode::PageFull => 'P',
            ErrorCode::PseudoOp => 'Z',
            ErrorCode::BadSymbol => 'S',
            ErrorCode::Syntax => 'X',
            ErrorCode::Undefined => 'U',
        }
    }

    #[must_use]
    pub fn from_letter(letter: char) -> Option<ErrorCode> {
        let upper = letter.to_ascii_uppercase();
        ErrorCode::ALL.into_iter().find(|code| code.letter() == upper)
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            ErrorCode::Field => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: LineNumber,
    /// Counted from 1, when we know it.
    pub column: Option<usize>,
    pub code: ErrorCode,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.code.severity() == Severity::Error
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "{}:{}: {} {}", self.line, column, self.code, self.message),
            None => write!(f, "{}: {} {}", self.line, self.code, self.message),
        }
    }
}

/// Collects diagnostics in the order they are reported.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    recording: bool,
    suppressed: BTreeSet<ErrorCode>,
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// A collector which keeps what it is given.
    pub(crate) fn new() -> Diagnostics {
        Diagnostics {
            recording: true,
            ..Default::default()
        }
    }

    /// A collector which throws everything away (for the first pass).
    pub(crate) fn discarding() -> Diagnostics {
        Diagnostics::default()
    }

    pub(crate) fn report(
        &mut self,
        line: LineNumber,
        column: Option<usize>,
        code: ErrorCode,
        message: String,
    ) {
        if !self.recording {
            return;
        }
        if self.suppressed.contains(&code) {
            event!(Level::TRACE, "line {line}: suppressed {code} {message}");
            return;
        }
        event!(Level::DEBUG, "line {line}: {code} {message}");
        self.items.push(Diagnostic {
            line,
            column,
            code,
            message,
        });
    }

    pub(crate) fn suppress<I: IntoIterator<Item = ErrorCode>>(&mut self, codes: I) {
        self.suppressed.extend(codes);
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_round_trip() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_letter(code.letter()), Some(code));
        }
        assert_eq!(ErrorCode::from_letter('w'), Some(ErrorCode::OffPage));
        assert_eq!(ErrorCode::from_letter('Q'), None);
    }

    #[test]
    fn only_field_is_a_warning() {
        let warnings: Vec<ErrorCode> = ErrorCode::ALL
            .into_iter()
            .filter(|code| code.severity() == Severity::Warning)
            .collect();
        assert_eq!(warnings, vec![ErrorCode::Field]);
    }

    #[test]
    fn discarding_collector_keeps_nothing() {
        let mut d = Diagnostics::discarding();
        d.report(1, None, ErrorCode::Syntax, "bad".to_string());
        assert!(d.into_vec().is_empty());
    }

    #[test]
    fn suppression() {
        let mut d = Diagnostics::new();
        d.report(1, Some(3), ErrorCode::OffPage, "first".to_string());
        d.suppress([ErrorCode::OffPage]);
        d.report(2, Some(3), ErrorCode::OffPage, "second".to_string());
        d.report(2, None, ErrorCode::Undefined, "third".to_string());
        let items = d.into_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].to_string(), "1:3: W first");
        assert_eq!(items[1].to_string(), "2: U third");
    }
}
