//! Expression evaluation.
//!
//! Evaluation always produces a value.  Problems (an undefined
//! symbol, a definition loop, division by zero) are collected as
//! [`EvalProblem`]s for the caller to report, and the offending part
//! of the expression counts as zero.
use std::fmt::{self, Display, Formatter};

use tracing::{event, Level};

use base::prelude::Unsigned12Bit;

use super::ast::{BinaryOp, Expression, UnaryOp};
use super::diagnostics::ErrorCode;
use super::symbol::SymbolName;
use super::symtab::{SymbolTable, SymbolValue};
use super::types::LineNumber;

/// The largest magnitude accepted for the value of an expression
/// which becomes a word.  Negative values are stored in two's
/// complement.
pub(crate) const WORD_LIMIT: i64 = 0o7777;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EvalProblem {
    Undefined {
        name: SymbolName,
        column: usize,
    },
    /// The symbol is defined, but not before the line being
    /// assembled, and this expression decides the layout of the
    /// program.
    DefinedLater {
        name: SymbolName,
        column: usize,
        line: LineNumber,
    },
    Loop {
        names: Vec<SymbolName>,
        column: usize,
    },
    DivisionByZero,
    ShiftOutOfRange(i64),
}

impl EvalProblem {
    pub(crate) fn code(&self) -> ErrorCode {
        match self {
            EvalProblem::Undefined { .. }
            | EvalProblem::DefinedLater { .. }
            | EvalProblem::Loop { .. } => ErrorCode::Undefined,
            EvalProblem::DivisionByZero | EvalProblem::ShiftOutOfRange(_) => {
                ErrorCode::Arithmetic
            }
        }
    }

    fn is_unresolved(&self) -> bool {
        self.code() == ErrorCode::Undefined
    }

    pub(crate) fn column(&self) -> Option<usize> {
        match self {
            EvalProblem::Undefined { column, .. }
            | EvalProblem::DefinedLater { column, .. }
            | EvalProblem::Loop { column, .. } => Some(*column),
            EvalProblem::DivisionByZero | EvalProblem::ShiftOutOfRange(_) => None,
        }
    }
}

impl Display for EvalProblem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EvalProblem::Undefined { name, .. } => write!(f, "undefined symbol {name}"),
            EvalProblem::DefinedLater { name, line, .. } => write!(
                f,
                "symbol {name} is defined on line {line}, but only earlier definitions can be used here"
            ),
            EvalProblem::Loop { names, .. } => {
                let names: Vec<&str> = names.iter().map(SymbolName::as_str).collect();
                write!(f, "definition of {} has a dependency loop ({})", names[0], names.join("->"))
            }
            EvalProblem::DivisionByZero => f.write_str("division by zero"),
            EvalProblem::ShiftOutOfRange(n) => write!(f, "shift count {n} is out of range"),
        }
    }
}

/// What an expression is evaluated against.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EvalContext<'s> {
    pub(crate) symtab: &'s SymbolTable,
    /// The value of `.`.
    pub(crate) here: i64,
    /// When set, only symbols defined before this line are visible.
    pub(crate) visible_before: Option<LineNumber>,
}

impl EvalContext<'_> {
    fn lookup(
        &self,
        name: &SymbolName,
        column: usize,
        active: &mut Vec<SymbolName>,
        problems: &mut Vec<EvalProblem>,
    ) -> i64 {
        let Some(def) = self.symtab.get(name) else {
            problems.push(EvalProblem::Undefined {
                name: name.clone(),
                column,
            });
            return 0;
        };
        if let Some(limit) = self.visible_before {
            if def.line >= limit {
                problems.push(EvalProblem::DefinedLater {
                    name: name.clone(),
                    column,
                    line: def.line,
                });
                return 0;
            }
        }
        match &def.value {
            SymbolValue::Label(location) => i64::from(u16::from(location.address)),
            SymbolValue::Constant(expr) => {
                if let Some(pos) = active.iter().position(|n| n == name) {
                    let mut names: Vec<SymbolName> = active[pos..].to_vec();
                    names.push(name.clone());
                    event!(Level::DEBUG, "definition loop: {names:?}");
                    problems.push(EvalProblem::Loop { names, column });
                    return 0;
                }
                active.push(name.clone());
                let value = self.evaluate_inner(expr, active, problems);
                active.pop();
                value
            }
        }
    }

    fn evaluate_inner(
        &self,
        expr: &Expression,
        active: &mut Vec<SymbolName>,
        problems: &mut Vec<EvalProblem>,
    ) -> i64 {
        match expr {
            Expression::Literal(n) => *n,
            Expression::Here => self.here,
            Expression::Symbol { name, column } => self.lookup(name, *column, active, problems),
            Expression::Unary(op, operand) => {
                let v = self.evaluate_inner(operand, active, problems);
                match op {
                    UnaryOp::Negate => v.wrapping_neg(),
                    UnaryOp::Complement => !v,
                    UnaryOp::Plus => v,
                }
            }
            Expression::Binary(op, left, right) => {
                let l = self.evaluate_inner(left, active, problems);
                let r = self.evaluate_inner(right, active, problems);
                apply(*op, l, r, problems)
            }
        }
    }

    /// Evaluate `expr`.  Only the first unresolved symbol is added
    /// to `problems`; arithmetic problems are all reported.
    pub(crate) fn evaluate(&self, expr: &Expression, problems: &mut Vec<EvalProblem>) -> i64 {
        let mut active = Vec::new();
        let mut found = Vec::new();
        let value = self.evaluate_inner(expr, &mut active, &mut found);
        let mut seen_unresolved = false;
        problems.extend(found.into_iter().filter(|problem| {
            if problem.is_unresolved() {
                !std::mem::replace(&mut seen_unresolved, true)
            } else {
                true
            }
        }));
        value
    }
}

fn apply(op: BinaryOp, l: i64, r: i64, problems: &mut Vec<EvalProblem>) -> i64 {
    match op {
        BinaryOp::Or => l | r,
        BinaryOp::Xor => l ^ r,
        BinaryOp::And => l & r,
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Subtract => l.wrapping_sub(r),
        BinaryOp::Multiply => l.wrapping_mul(r),
        BinaryOp::Divide | BinaryOp::Remainder if r == 0 => {
            problems.push(EvalProblem::DivisionByZero);
            0
        }
        BinaryOp::Divide => l.wrapping_div(r),
        BinaryOp::Remainder => l.wrapping_rem(r),
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight => match u32::try_from(r) {
            Ok(n) if n < i64::BITS => {
                if op == BinaryOp::ShiftLeft {
                    l.wrapping_shl(n)
                } else {
                    l >> n
                }
            }
            _ => {
                problems.push(EvalProblem::ShiftOutOfRange(r));
                0
            }
        },
    }
}

/// Convert the value of an expression to a word.  Values outside
/// `-7777..=7777` (octal) are truncated and returned as `Err`.
pub(crate) fn to_word(value: i64) -> Result<Unsigned12Bit, Unsigned12Bit> {
    let word = Unsigned12Bit::truncating((value & 0o7777) as u16);
    if (-WORD_LIMIT..=WORD_LIMIT).contains(&value) {
        Ok(word)
    } else {
        Err(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SourceCursor;
    use crate::parser::parse_complete_expression;
    use crate::symtab::SymbolTable;
    use base::prelude::{Address, ExtendedAddress, Field};

    fn parse(s: &str) -> Expression {
        parse_complete_expression(SourceCursor::new(s, 1), "MAIN").expect("valid expression")
    }

    fn eval_with(symtab: &SymbolTable, s: &str) -> (i64, Vec<EvalProblem>) {
        let ctx = EvalContext {
            symtab,
            here: 0o200,
            visible_before: None,
        };
        let mut problems = Vec::new();
        let value = ctx.evaluate(&parse(s), &mut problems);
        (value, problems)
    }

    fn label(symtab: &mut SymbolTable, name: &str, addr: u16, line: LineNumber) {
        let location = ExtendedAddress::new(
            Field::ZERO,
            Address::try_from(addr).expect("valid address"),
        );
        symtab.define(SymbolName::from(name), SymbolValue::Label(location), line);
    }

    #[test]
    fn arithmetic() {
        let symtab = SymbolTable::default();
        assert_eq!(eval_with(&symtab, "1+2*3"), (7, vec![]));
        assert_eq!(eval_with(&symtab, "7777&~70"), (0o7707, vec![]));
        assert_eq!(eval_with(&symtab, "1<<11."), (0o4000, vec![]));
        assert_eq!(eval_with(&symtab, "-1"), (-1, vec![]));
        assert_eq!(eval_with(&symtab, ".+1"), (0o201, vec![]));
        assert_eq!(eval_with(&symtab, "10.%3"), (1, vec![]));
        assert_eq!(eval_with(&symtab, "0b11^1"), (2, vec![]));
    }

    #[test]
    fn division_by_zero() {
        let symtab = SymbolTable::default();
        assert_eq!(eval_with(&symtab, "5/0"), (0, vec![EvalProblem::DivisionByZero]));
        assert_eq!(eval_with(&symtab, "1+5%0"), (1, vec![EvalProblem::DivisionByZero]));
        let (_, problems) = eval_with(&symtab, "1<<100");
        assert_eq!(problems[0].code(), ErrorCode::Arithmetic);
    }

    #[test]
    fn undefined_is_zero() {
        let symtab = SymbolTable::default();
        let (value, problems) = eval_with(&symtab, "NOWHERE+1");
        assert_eq!(value, 1);
        assert_eq!(
            problems,
            vec![EvalProblem::Undefined {
                name: SymbolName::from("NOWHERE"),
                column: 1
            }]
        );
        assert_eq!(problems[0].code(), ErrorCode::Undefined);
        assert_eq!(problems[0].to_string(), "undefined symbol NOWHERE");
    }

    #[test]
    fn only_first_unresolved_symbol_is_reported() {
        let symtab = SymbolTable::default();
        let (value, problems) = eval_with(&symtab, "FOO+BAR+(1/0)");
        assert_eq!(value, 0);
        assert_eq!(
            problems,
            vec![
                EvalProblem::Undefined {
                    name: SymbolName::from("FOO"),
                    column: 1
                },
                EvalProblem::DivisionByZero,
            ]
        );
    }

    #[test]
    fn labels_and_constants() {
        let mut symtab = SymbolTable::default();
        label(&mut symtab, "START", 0o200, 1);
        symtab.define(
            SymbolName::from("N"),
            SymbolValue::Constant(parse("START+10.")),
            2,
        );
        assert_eq!(eval_with(&symtab, "N"), (0o212, vec![]));
        label(&mut symtab, "MAIN:.LOOP", 0o300, 3);
        assert_eq!(eval_with(&symtab, ".LOOP"), (0o300, vec![]));
    }

    #[test]
    fn definition_loops() {
        let mut symtab = SymbolTable::default();
        symtab.define(SymbolName::from("A"), SymbolValue::Constant(parse("B")), 1);
        symtab.define(SymbolName::from("B"), SymbolValue::Constant(parse("A+1")), 2);
        let (value, problems) = eval_with(&symtab, "A");
        assert_eq!(value, 1);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].code(), ErrorCode::Undefined);
        assert_eq!(
            problems[0].to_string(),
            "definition of A has a dependency loop (A->B->A)"
        );
    }

    #[test]
    fn visibility_limit() {
        let mut symtab = SymbolTable::default();
        label(&mut symtab, "EARLY", 0o10, 1);
        label(&mut symtab, "LATE", 0o20, 5);
        let ctx = EvalContext {
            symtab: &symtab,
            here: 0,
            visible_before: Some(5),
        };
        let mut problems = Vec::new();
        assert_eq!(ctx.evaluate(&parse("EARLY"), &mut problems), 0o10);
        assert!(problems.is_empty());
        assert_eq!(ctx.evaluate(&parse("LATE"), &mut problems), 0);
        assert!(matches!(problems[0], EvalProblem::DefinedLater { line: 5, .. }));
    }

    #[test]
    fn word_range() {
        assert_eq!(to_word(0o7777), Ok(Unsigned12Bit::MAX));
        assert_eq!(to_word(-1), Ok(Unsigned12Bit::MAX));
        assert_eq!(to_word(-0o7777), Ok(Unsigned12Bit::ONE));
        assert_eq!(to_word(0o10001), Err(Unsigned12Bit::ONE));
        assert_eq!(to_word(-0o10000), Err(Unsigned12Bit::ZERO));
    }
}
