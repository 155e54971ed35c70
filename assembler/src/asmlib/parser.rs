//! A hand-written scanner and recursive-descent parser for source
//! lines.
//!
//! A line has the shape
//!
//! ```text
//! [LABEL, ...] [MNEMONIC OPERANDS | .DIRECTIVE PARAMETERS | EXPRESSION] [; COMMENT]
//! ```
//!
//! or `NAME = EXPRESSION`.  The parser only finds the parts of the
//! line; deciding whether a word is a mnemonic needs the instruction
//! table and so is left to the engine.
use std::fmt::{self, Display, Formatter};

use super::ast::{BinaryOp, Expression, UnaryOp};
use super::cursor::SourceCursor;
use super::diagnostics::ErrorCode;
use super::directive::PseudoOp;
use super::predicates::{
    is_binary_digit, is_decimal_digit, is_ident_char, is_ident_start, is_indirect,
    is_literal_open, is_octal_digit, is_qualified_ident_char, is_quote, is_whitespace,
    is_word_end,
};
use super::symbol::SymbolName;
use super::types::LineNumber;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseError {
    /// Counted from 1.
    pub(crate) column: usize,
    pub(crate) code: ErrorCode,
    pub(crate) message: String,
}

impl ParseError {
    fn syntax(at: &SourceCursor<'_>, message: String) -> ParseError {
        ParseError {
            column: at.column(),
            code: ErrorCode::Syntax,
            message,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "column {}: {}", self.column, self.message)
    }
}

fn describe_next(input: &SourceCursor<'_>) -> String {
    match input.as_str().chars().next() {
        Some(ch) => format!("'{}'", ch.escape_default()),
        None => "end of line".to_string(),
    }
}

type Parsed<'a, T> = Result<(T, SourceCursor<'a>), ParseError>;

/// Parse an expression at the start of `input`, returning it and the
/// rest of the input.  Local symbols are qualified with `scope`.
pub(crate) fn parse_expression<'a>(input: SourceCursor<'a>, scope: &str) -> Parsed<'a, Expression> {
    parse_binary(input, scope, 1)
}

/// Parse `input` which must be a single expression and nothing else.
pub(crate) fn parse_complete_expression(
    input: SourceCursor<'_>,
    scope: &str,
) -> Result<Expression, ParseError> {
    let (expr, rest) = parse_expression(input, scope)?;
    let rest = rest.consume_whitespace();
    if rest.is_empty() {
        Ok(expr)
    } else {
        Err(ParseError::syntax(
            &rest,
            format!("unexpected {} after expression", describe_next(&rest)),
        ))
    }
}

fn peek_binary_op(input: &SourceCursor<'_>) -> Option<(BinaryOp, usize)> {
    let op = match (input.peek()?, input.peek_at(1)) {
        (b'<', Some(b'<')) => return Some((BinaryOp::ShiftLeft, 2)),
        (b'>', Some(b'>')) => return Some((BinaryOp::ShiftRight, 2)),
        (b'|' | b'!', _) => BinaryOp::Or,
        (b'^', _) => BinaryOp::Xor,
        (b'&', _) => BinaryOp::And,
        (b'+', _) => BinaryOp::Add,
        (b'-', _) => BinaryOp::Subtract,
        (b'*', _) => BinaryOp::Multiply,
        (b'/', _) => BinaryOp::Divide,
        (b'%', _) => BinaryOp::Remainder,
        _ => return None,
    };
    Some((op, 1))
}

fn parse_binary<'a>(input: SourceCursor<'a>, scope: &str, min_precedence: u8) -> Parsed<'a, Expression> {
    let (mut lhs, mut rest) = parse_unary(input, scope)?;
    loop {
        let after_space = rest.consume_whitespace();
        let Some((op, len)) = peek_binary_op(&after_space) else {
            break;
        };
        if op.precedence() < min_precedence {
            break;
        }
        let (rhs, after_rhs) = parse_binary(after_space.consume(len), scope, op.precedence() + 1)?;
        lhs = Expression::Binary(op, Box::new(lhs), Box::new(rhs));
        rest = after_rhs;
    }
    Ok((lhs, rest))
}

fn parse_unary<'a>(input: SourceCursor<'a>, scope: &str) -> Parsed<'a, Expression> {
    let input = input.consume_whitespace();
    let unary = |op: UnaryOp| -> Parsed<'a, Expression> {
        let (operand, rest) = parse_unary(input.consume(1), scope)?;
        Ok((Expression::Unary(op, Box::new(operand)), rest))
    };
    match input.peek() {
        None => Err(ParseError::syntax(&input, "missing operand".to_string())),
        Some(b'-') => unary(UnaryOp::Negate),
        Some(b'~') => unary(UnaryOp::Complement),
        Some(b'+') => unary(UnaryOp::Plus),
        Some(b'(') => {
            let (inner, rest) = parse_expression(input.consume(1), scope)?;
            let rest = rest.consume_whitespace();
            if rest.peek() == Some(b')') {
                Ok((inner, rest.consume(1)))
            } else {
                Err(ParseError::syntax(
                    &rest,
                    format!("expected ')' but found {}", describe_next(&rest)),
                ))
            }
        }
        Some(b) if is_decimal_digit(b) => parse_number(input),
        Some(b) if is_quote(b) => parse_character(input),
        Some(b'.') if !input.peek_at(1).is_some_and(is_ident_char) => {
            Ok((Expression::Here, input.consume(1)))
        }
        Some(b) if is_ident_start(b) => {
            let (name, rest) = input.consume_while(is_qualified_ident_char);
            Ok((
                Expression::Symbol {
                    name: SymbolName::qualified(name.as_str(), scope),
                    column: name.column(),
                },
                rest,
            ))
        }
        Some(_) => Err(ParseError::syntax(
            &input,
            format!("expected an expression but found {}", describe_next(&input)),
        )),
    }
}

fn accumulate(digits: &str, radix: u32) -> Option<i64> {
    digits.chars().try_fold(0_i64, |acc, ch| {
        let d = i64::from(ch.to_digit(radix)?);
        acc.checked_mul(i64::from(radix))?.checked_add(d)
    })
}

/// Numbers are octal unless they end in `.` (decimal) or begin with
/// `0b` (binary).
fn parse_number(input: SourceCursor<'_>) -> Parsed<'_, Expression> {
    let (token, rest) = input.consume_while(is_ident_char);
    let text = token.as_str();
    let bad = |what: &str| Err(ParseError::syntax(&token, format!("{what}: {text}")));
    let (digits, radix, digit_ok): (&str, u32, fn(u8) -> bool) =
        if let Some(binary) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
            (binary, 2, is_binary_digit as fn(u8) -> bool)
        } else if let Some(decimal) = text.strip_suffix('.') {
            (decimal, 10, is_decimal_digit as fn(u8) -> bool)
        } else {
            (text, 8, is_octal_digit as fn(u8) -> bool)
        };
    if digits.is_empty() {
        return bad("missing digits in number");
    }
    if !digits.bytes().all(digit_ok) {
        return if radix == 8 && digits.bytes().all(is_decimal_digit) {
            bad("digits 8 and 9 are not octal (add a trailing '.' for decimal)")
        } else {
            bad("malformed number")
        };
    }
    match accumulate(digits, radix) {
        Some(value) => Ok((Expression::Literal(value), rest)),
        None => Err(ParseError {
            column: token.column(),
            code: ErrorCode::Arithmetic,
            message: format!("number is too large: {text}"),
        }),
    }
}

/// A character constant: `'c'` or `"c"`.
fn parse_character(input: SourceCursor<'_>) -> Parsed<'_, Expression> {
    let quote = input.as_str().chars().next();
    let body = input.consume(1);
    let mut chars = body.as_str().chars();
    match (chars.next(), chars.next()) {
        (Some(ch), close) if close == quote && ch.is_ascii() => {
            let len = ch.len_utf8() + 1;
            Ok((Expression::Literal(i64::from(u32::from(ch))), body.consume(len)))
        }
        (Some(ch), _) if !ch.is_ascii() => Err(ParseError::syntax(
            &body,
            format!("'{}' is not an ASCII character", ch.escape_default()),
        )),
        _ => Err(ParseError::syntax(
            &input,
            "a character constant is one character between matching quotes".to_string(),
        )),
    }
}

/// Extract the text of a quoted string parameter such as `"HELLO"`.
pub(crate) fn parse_string(param: SourceCursor<'_>) -> Result<&str, ParseError> {
    let param = param.trim();
    let Some(quote) = param.peek().filter(|b| is_quote(*b)) else {
        return Err(ParseError::syntax(
            &param,
            format!("expected a quoted string but found {}", describe_next(&param)),
        ));
    };
    let (body, rest) = param.consume(1).consume_until(|b| b == quote);
    if rest.is_empty() {
        return Err(ParseError::syntax(&param, "unterminated string".to_string()));
    }
    let after = rest.consume(1).consume_whitespace();
    if after.is_empty() {
        Ok(body.as_str())
    } else {
        Err(ParseError::syntax(
            &after,
            format!("unexpected {} after string", describe_next(&after)),
        ))
    }
}

/// How a memory reference instruction reaches its operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OperandForm {
    /// `X`: the address itself.
    Direct(Expression),
    /// `@X`: through a link word holding the address.
    Link(Expression),
    /// `[e]`: a literal word holding the value.
    Literal(Expression),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemoryOperand {
    /// Explicit `I`.
    pub(crate) indirect: bool,
    pub(crate) form: OperandForm,
    pub(crate) column: usize,
}

/// Parse the operand of a memory reference instruction.
pub(crate) fn parse_memory_operand(
    operands: SourceCursor<'_>,
    scope: &str,
) -> Result<MemoryOperand, ParseError> {
    let mut text = operands.trim();
    let column = text.column();
    if text.is_empty() {
        return Err(ParseError::syntax(&text, "missing operand".to_string()));
    }
    let indirect = matches!(text.peek(), Some(b'I' | b'i'))
        && text
            .peek_at(1)
            .is_some_and(|b| is_whitespace(b) || is_literal_open(b) || is_indirect(b));
    if indirect {
        text = text.consume(1).consume_whitespace();
    }
    let form = match text.peek() {
        Some(b) if is_indirect(b) => {
            if indirect {
                return Err(ParseError::syntax(
                    &text,
                    "'@' cannot be combined with explicit indirection".to_string(),
                ));
            }
            OperandForm::Link(parse_complete_expression(text.consume(1), scope)?)
        }
        Some(b) if is_literal_open(b) => {
            let (value, rest) = parse_expression(text.consume(1), scope)?;
            let rest = rest.consume_whitespace();
            if rest.peek() != Some(b']') {
                return Err(ParseError::syntax(
                    &rest,
                    format!("expected ']' but found {}", describe_next(&rest)),
                ));
            }
            let after = rest.consume(1).consume_whitespace();
            if !after.is_empty() {
                return Err(ParseError::syntax(
                    &after,
                    format!("unexpected {} after literal", describe_next(&after)),
                ));
            }
            OperandForm::Literal(value)
        }
        _ => OperandForm::Direct(parse_complete_expression(text, scope)?),
    };
    Ok(MemoryOperand {
        indirect,
        form,
        column,
    })
}

/// What follows any labels on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineBody<'a> {
    Empty,
    /// `NAME = EXPRESSION`
    Constant {
        name: SourceCursor<'a>,
        value: SourceCursor<'a>,
    },
    Directive {
        op: PseudoOp,
        name: SourceCursor<'a>,
        operands: SourceCursor<'a>,
    },
    /// An instruction or a data word; which one depends on whether
    /// the first word is a mnemonic.
    Statement(SourceCursor<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceLine<'a> {
    pub(crate) labels: Vec<SourceCursor<'a>>,
    pub(crate) body: LineBody<'a>,
}

/// Split a line into labels and body.  Label names are not checked
/// here.
pub(crate) fn parse_line(text: &str, row: LineNumber) -> SourceLine<'_> {
    let mut rest = SourceCursor::new(text, row)
        .strip_trailing_comment()
        .consume_whitespace();
    let mut labels = Vec::new();
    loop {
        let (word, after) = rest.consume_until(is_word_end);
        if !word.is_empty() && !word.starts_with(is_quote) && after.peek() == Some(b',') {
            labels.push(word);
            rest = after.consume(1).consume_whitespace();
        } else {
            break;
        }
    }

    let (word, after) = rest.consume_until(is_word_end);
    let after_space = after.consume_whitespace();
    let body = if rest.is_empty() {
        LineBody::Empty
    } else if after_space.peek() == Some(b'=') {
        LineBody::Constant {
            name: word,
            value: after_space.consume(1).trim(),
        }
    } else if let Some(op) = word
        .starts_with(|b| b == b'.')
        .then(|| PseudoOp::from_name(word.as_str()))
        .flatten()
    {
        LineBody::Directive {
            op,
            name: word,
            operands: after_space,
        }
    } else {
        LineBody::Statement(rest)
    };
    SourceLine { labels, body }
}
