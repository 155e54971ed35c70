//! Expressions as they appear in the operands of instructions and
//! pseudo-ops.  Expressions are immutable; evaluation (see
//! [`super::eval`]) never modifies the tree.
use std::fmt::{self, Display, Formatter};

use super::symbol::SymbolName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Negate,
    Complement,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Or,
    Xor,
    And,
    ShiftLeft,
    ShiftRight,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl BinaryOp {
    /// Binding strength; larger numbers bind more tightly.
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::Xor => 2,
            BinaryOp::And => 3,
            BinaryOp::ShiftLeft | BinaryOp::ShiftRight => 4,
            BinaryOp::Add | BinaryOp::Subtract => 5,
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Remainder => 6,
        }
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Negate => "-",
            UnaryOp::Complement => "~",
            UnaryOp::Plus => "+",
        })
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::And => "&",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expression {
    Literal(i64),
    /// `.`, the address of the word being assembled.
    Here,
    Symbol {
        name: SymbolName,
        /// Where the reference appears in its line (counted from 1),
        /// for diagnostics.
        column: usize,
    },
    Unary(UnaryOp, Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
}

impl Expression {
    /// Replace each `.` with `here`.  Constant definitions are stored
    /// this way, so that `.` means the location of the definition
    /// rather than of each use.
    #[must_use]
    pub(crate) fn with_here(&self, here: i64) -> Expression {
        match self {
            Expression::Here => Expression::Literal(here),
            Expression::Literal(_) | Expression::Symbol { .. } => self.clone(),
            Expression::Unary(op, e) => Expression::Unary(*op, Box::new(e.with_here(here))),
            Expression::Binary(op, l, r) => Expression::Binary(
                *op,
                Box::new(l.with_here(here)),
                Box::new(r.with_here(here)),
            ),
        }
    }

    /// If the expression is nothing but a symbol reference, the
    /// symbol.
    pub(crate) fn as_symbol(&self) -> Option<&SymbolName> {
        match self {
            Expression::Symbol { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(n) if *n < 0 => write!(f, "-{:o}", n.unsigned_abs()),
            Expression::Literal(n) => write!(f, "{n:o}"),
            Expression::Here => f.write_str("."),
            Expression::Symbol { name, .. } => write!(f, "{name}"),
            Expression::Unary(op, e) => write!(f, "{op}{e}"),
            Expression::Binary(op, l, r) => write!(f, "({l}{op}{r})"),
        }
    }
}
