use super::*;

fn cursor(s: &str) -> SourceCursor<'_> {
    SourceCursor::new(s, 1)
}

fn expr(s: &str) -> String {
    match parse_complete_expression(cursor(s), "MAIN") {
        Ok(e) => e.to_string(),
        Err(e) => panic!("failed to parse {s:?}: {e}"),
    }
}

fn expr_error(s: &str) -> ParseError {
    match parse_complete_expression(cursor(s), "MAIN") {
        Ok(e) => panic!("expected {s:?} not to parse, but got {e}"),
        Err(e) => e,
    }
}

#[test]
fn numbers() {
    assert_eq!(expr("17"), "17");
    assert_eq!(expr("10."), "12");
    assert_eq!(expr("0b101"), "5");
    assert_eq!(expr("'A'"), "101");
    assert_eq!(expr("\"0\""), "60");
}

#[test]
fn bad_numbers() {
    let e = expr_error("19");
    assert_eq!(e.code, ErrorCode::Syntax);
    assert_eq!(e.column, 1);
    assert_eq!(expr_error("0b12").code, ErrorCode::Syntax);
    assert_eq!(expr_error("12AB").code, ErrorCode::Syntax);
    assert_eq!(expr_error("777777777777777777777777").code, ErrorCode::Arithmetic);
}

#[test]
fn precedence() {
    assert_eq!(expr("1+2*3"), "(1+(2*3))");
    assert_eq!(expr("1|2^3&4"), "(1|(2^(3&4)))");
    assert_eq!(expr("1<<2+3"), "(1<<(2+3))");
    assert_eq!(expr("(1+2)*3"), "((1+2)*3)");
    assert_eq!(expr("1 ! 2"), "(1|2)");
    assert_eq!(expr("8.-1-1"), "((10-1)-1)");
    assert_eq!(expr("-~1"), "-~1");
    assert_eq!(expr("A % 3 / B"), "((A%3)/B)");
}

#[test]
fn here_and_symbols() {
    assert_eq!(expr(".+1"), "(.+1)");
    assert_eq!(expr(". - 1"), "(.-1)");
    assert_eq!(expr(".LOOP"), "MAIN:.LOOP");
    assert_eq!(expr("SUB:.LOOP"), "SUB:.LOOP");
    assert_eq!(expr("START+.X"), "(START+MAIN:.X)");
}

#[test]
fn symbol_columns() {
    let e = parse_complete_expression(cursor("1 + FOO"), "").expect("valid");
    match e {
        Expression::Binary(_, _, rhs) => match *rhs {
            Expression::Symbol { column, .. } => assert_eq!(column, 5),
            other => panic!("unexpected {other:?}"),
        },
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn expression_errors() {
    assert_eq!(expr_error("(1+2").message, "expected ')' but found end of line");
    assert_eq!(expr_error("1+").message, "missing operand");
    assert_eq!(expr_error("1 2").column, 3);
    assert_eq!(expr_error("'AB'").code, ErrorCode::Syntax);
    assert_eq!(expr_error("#").code, ErrorCode::Syntax);
}

#[test]
fn memory_operands() {
    let parse = |s| parse_memory_operand(cursor(s), "").expect("valid operand");
    assert_eq!(
        parse("X"),
        MemoryOperand {
            indirect: false,
            form: OperandForm::Direct(Expression::Symbol {
                name: SymbolName::from("X"),
                column: 1
            }),
            column: 1,
        }
    );
    let op = parse("  I X");
    assert!(op.indirect);
    assert_eq!(op.column, 3);
    assert!(matches!(parse("@PTR").form, OperandForm::Link(_)));
    assert!(matches!(parse("[7]").form, OperandForm::Literal(Expression::Literal(7))));
    let op = parse("I [BUF]");
    assert!(op.indirect);
    assert!(matches!(op.form, OperandForm::Literal(_)));
    // A symbol which happens to start with I.
    assert!(!parse("IX").indirect);
}

#[test]
fn memory_operand_errors() {
    let parse = |s| parse_memory_operand(cursor(s), "").expect_err("invalid operand");
    assert_eq!(parse("").message, "missing operand");
    assert_eq!(parse("I @X").code, ErrorCode::Syntax);
    assert_eq!(parse("[1").message, "expected ']' but found end of line");
    assert_eq!(parse("[1] 2").code, ErrorCode::Syntax);
}

#[test]
fn strings() {
    assert_eq!(parse_string(cursor(" \"HELLO, WORLD\" ")), Ok("HELLO, WORLD"));
    assert_eq!(parse_string(cursor("'x'")), Ok("x"));
    assert_eq!(parse_string(cursor("\"\"")), Ok(""));
    assert_eq!(parse_string(cursor("HELLO")).map_err(|e| e.code), Err(ErrorCode::Syntax));
    assert_eq!(
        parse_string(cursor("\"OPEN")).map_err(|e| e.message),
        Err("unterminated string".to_string())
    );
}

#[test]
fn line_shapes() {
    let line = parse_line("START, LOOP,\tTAD X ; comment", 1);
    let labels: Vec<&str> = line.labels.iter().map(|l| l.as_str()).collect();
    assert_eq!(labels, vec!["START", "LOOP"]);
    match line.body {
        LineBody::Statement(s) => {
            assert_eq!(s.as_str(), "TAD X");
            assert_eq!(s.column(), 17);
        }
        other => panic!("unexpected {other:?}"),
    }

    match parse_line("  N = 10. ; ten", 2).body {
        LineBody::Constant { name, value } => {
            assert_eq!(name.as_str(), "N");
            assert_eq!(value.as_str(), "10.");
        }
        other => panic!("unexpected {other:?}"),
    }

    match parse_line("MSG, .text \"HI, THERE\"", 3).body {
        LineBody::Directive { op, operands, .. } => {
            assert_eq!(op, PseudoOp::Text);
            assert_eq!(operands.as_str(), "\"HI, THERE\"");
        }
        other => panic!("unexpected {other:?}"),
    }

    assert_eq!(parse_line("   ; nothing", 4).body, LineBody::Empty);
    let line = parse_line("HERE,", 5);
    assert_eq!(line.labels.len(), 1);
    assert_eq!(line.body, LineBody::Empty);

    // A local symbol at the start of a line is an expression, not a
    // directive.
    assert!(matches!(parse_line(".LOOP+1", 6).body, LineBody::Statement(_)));
    // A character constant followed by a comma is not a label.
    assert!(parse_line("',', 1", 7).labels.is_empty());
}
