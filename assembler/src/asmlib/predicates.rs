//! Byte classifiers used by the scanner, and the parameter count
//! checks used by the pseudo-ops.
use std::fmt::{self, Display, Formatter};

pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\x0c')
}

pub(crate) fn is_comment_start(b: u8) -> bool {
    b == b';'
}

pub(crate) fn is_quote(b: u8) -> bool {
    b == b'\'' || b == b'"'
}

pub(crate) fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'.'
}

pub(crate) fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Characters which can appear in a scope-qualified symbol reference
/// such as `MAIN:.LOOP`.
pub(crate) fn is_qualified_ident_char(b: u8) -> bool {
    is_ident_char(b) || b == b':'
}

pub(crate) fn is_octal_digit(b: u8) -> bool {
    matches!(b, b'0'..=b'7')
}

pub(crate) fn is_decimal_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

pub(crate) fn is_binary_digit(b: u8) -> bool {
    b == b'0' || b == b'1'
}

pub(crate) fn is_indirect(b: u8) -> bool {
    b == b'@'
}

pub(crate) fn is_literal_open(b: u8) -> bool {
    b == b'['
}

/// Bytes which end a word: the label, mnemonic or operand tokens
/// which are separated by whitespace.
pub(crate) fn is_word_end(b: u8) -> bool {
    is_whitespace(b) || is_comment_start(b) || b == b',' || b == b'='
}

/// Checks the number of parameters given to a pseudo-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CountPredicate {
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
    Any,
    None,
}

impl CountPredicate {
    pub(crate) fn accepts(&self, n: usize) -> bool {
        match self {
            CountPredicate::Exactly(k) => n == *k,
            CountPredicate::AtLeast(k) => n >= *k,
            CountPredicate::AtMost(k) => n <= *k,
            CountPredicate::Any => true,
            CountPredicate::None => n == 0,
        }
    }
}

fn parameters(n: usize) -> &'static str {
    if n == 1 {
        "parameter"
    } else {
        "parameters"
    }
}

impl Display for CountPredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CountPredicate::Exactly(k) => write!(f, "exactly {k} {}", parameters(*k)),
            CountPredicate::AtLeast(k) => write!(f, "at least {k} {}", parameters(*k)),
            CountPredicate::AtMost(k) => write!(f, "at most {k} {}", parameters(*k)),
            CountPredicate::Any => f.write_str("any number of parameters"),
            CountPredicate::None => f.write_str("no parameters"),
        }
    }
}

#[test]
fn test_count_predicates() {
    assert!(CountPredicate::Exactly(1).accepts(1));
    assert!(!CountPredicate::Exactly(1).accepts(0));
    assert!(!CountPredicate::Exactly(4).accepts(3));
    assert!(CountPredicate::AtLeast(1).accepts(5));
    assert!(!CountPredicate::AtLeast(1).accepts(0));
    assert!(CountPredicate::AtMost(1).accepts(0));
    assert!(!CountPredicate::AtMost(1).accepts(2));
    assert!(CountPredicate::Any.accepts(0));
    assert!(CountPredicate::Any.accepts(100));
    assert!(CountPredicate::None.accepts(0));
    assert!(!CountPredicate::None.accepts(1));
    assert_eq!(CountPredicate::Exactly(1).to_string(), "exactly 1 parameter");
    assert_eq!(CountPredicate::AtLeast(2).to_string(), "at least 2 parameters");
}

#[test]
fn test_byte_classes() {
    assert!(is_ident_start(b'.'));
    assert!(!is_ident_start(b'7'));
    assert!(is_ident_char(b'7'));
    assert!(is_qualified_ident_char(b':'));
    assert!(!is_octal_digit(b'8'));
    assert!(is_decimal_digit(b'9'));
    assert!(!is_binary_digit(b'2'));
    assert!(is_word_end(b'\t'));
    assert!(is_word_end(b';'));
    assert!(!is_word_end(b'@'));
}
