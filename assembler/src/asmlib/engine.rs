//! The two-pass line processor.
//!
//! Both passes run the same code over the same lines.  The first
//! pass ([`Pass::Collect`]) only finds out where things are: it
//! defines symbols and user opcodes and records which words of each
//! page are occupied.  The second pass ([`Pass::Emit`]) evaluates
//! operands, allocates links and literals, and records diagnostics.
//!
//! Each line must generate the same number of words in both passes,
//! or the labels found by the first pass would be wrong.  That is
//! why an expression which moves the location counter can only use
//! symbols defined on earlier lines.
use std::collections::BTreeSet;

use tracing::{event, span, Level};

use base::charset::{ascii_of_char, pack_ascii, pack_sixbit, sixbit_of_char, SIXBIT_SPACE};
use base::prelude::{
    Address, CpuVariant, ExtendedAddress, Field, InstructionClass, OpcodeEntry, Page, PageOffset,
    Unsigned12Bit, Unsigned6Bit, PAGE_SIZE,
};
use base::u12;

use super::ast::Expression;
use super::cursor::SourceCursor;
use super::diagnostics::{Diagnostic, Diagnostics, ErrorCode};
use super::directive::PseudoOp;
use super::encode::{
    direct_reference, field_instruction, literal_fallback, literal_reference, pool_reference,
    OprCombiner,
};
use super::eval::{to_word, EvalContext};
use super::listing::{Listing, ListingLine};
use super::memorymap::{LinkPools, Occupancy};
use super::parser::{
    parse_complete_expression, parse_line, parse_memory_operand, parse_string, LineBody,
    OperandForm, ParseError,
};
use super::predicates::{is_ident_char, is_indirect, is_literal_open, is_whitespace};
use super::state::{AssemblerState, StackConvention, UserOpcodes, DEFAULT_ORIGIN};
use super::symbol::{check_definable, is_local, SymbolName};
use super::symtab::{FinalSymbolTable, SymbolTable, SymbolValue};
use super::types::{AssemblerOptions, LineNumber};

const CLA: Unsigned12Bit = u12!(0o7200);
const TAD: Unsigned12Bit = u12!(0o1000);
const JMS: Unsigned12Bit = u12!(0o4000);
const JMP: Unsigned12Bit = u12!(0o5000);

// HM6120 stack 1 instructions.
const PPC1: Unsigned12Bit = u12!(0o6205);
const PAC1: Unsigned12Bit = u12!(0o6215);
const RTN1: Unsigned12Bit = u12!(0o6225);
const POP1: Unsigned12Bit = u12!(0o6235);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Collect,
    Emit,
}

/// A word of the assembled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmittedWord {
    pub location: ExtendedAddress,
    pub word: Unsigned12Bit,
    /// The source line which generated the word.  Link and literal
    /// words have none.
    pub line: Option<LineNumber>,
}

/// The result of assembling a program.  Words appear in the order
/// they were generated, followed by the link and literal words.
#[derive(Debug)]
pub struct Assembly {
    pub words: Vec<EmittedWord>,
    pub symbols: FinalSymbolTable,
    pub diagnostics: Vec<Diagnostic>,
    pub listing: Listing,
    pub title: Option<String>,
}

impl Assembly {
    /// True if any diagnostic is an error (rather than a warning).
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// What the first pass learns, for use by the second.
#[derive(Debug, Default)]
struct Collected {
    symtab: SymbolTable,
    user_opcodes: UserOpcodes,
    occupancy: Occupancy,
}

/// How the stack pseudo-ops are implemented.
enum StackStyle {
    Hardware,
    Software(StackConvention),
}

fn octal(value: i64) -> String {
    if value < 0 {
        format!("-{:o}", value.unsigned_abs())
    } else {
        format!("{value:o}")
    }
}

struct LineProcessor<'c> {
    pass: Pass,
    state: AssemblerState,
    collected: &'c mut Collected,
    pools: LinkPools,
    diagnostics: Diagnostics,
    words: Vec<EmittedWord>,
    listing: Listing,
    line: LineNumber,
    line_words: Vec<(ExtendedAddress, Unsigned12Bit)>,
    /// Symbols defined so far on the current line.
    line_symbols: BTreeSet<SymbolName>,
}

impl<'c> LineProcessor<'c> {
    fn new(pass: Pass, options: &AssemblerOptions, collected: &'c mut Collected) -> LineProcessor<'c> {
        LineProcessor {
            pass,
            state: AssemblerState::new(options),
            collected,
            pools: LinkPools::default(),
            diagnostics: match pass {
                Pass::Collect => Diagnostics::discarding(),
                Pass::Emit => Diagnostics::new(),
            },
            words: Vec::new(),
            listing: Listing::default(),
            line: 0,
            line_words: Vec::new(),
            line_symbols: BTreeSet::new(),
        }
    }

    fn report(&mut self, column: Option<usize>, code: ErrorCode, message: String) {
        self.diagnostics.report(self.line, column, code, message);
    }

    fn parse_error(&mut self, e: ParseError) {
        self.report(Some(e.column), e.code, e.message);
    }

    fn here_value(&self) -> i64 {
        i64::from(u16::from(self.state.pc))
    }

    fn emit(&mut self, word: Unsigned12Bit) {
        let location = self.state.here();
        match self.pass {
            Pass::Collect => self.collected.occupancy.record(location),
            Pass::Emit => {
                self.words.push(EmittedWord {
                    location,
                    word,
                    line: Some(self.line),
                });
                self.line_words.push((location, word));
            }
        }
        self.state.pc = self.state.pc.successor();
    }

    /// Emit one word.  The first pass only needs to know that a word
    /// is there, so `encode` is only called in the second pass.
    fn emit_encoded<F>(&mut self, encode: F)
    where
        F: FnOnce(&mut Self) -> Unsigned12Bit,
    {
        let word = match self.pass {
            Pass::Collect => Unsigned12Bit::ZERO,
            Pass::Emit => encode(self),
        };
        self.emit(word);
    }

    fn evaluate(&mut self, expr: &Expression, visible_before: Option<LineNumber>, column: usize) -> i64 {
        let mut problems = Vec::new();
        let value = EvalContext {
            symtab: &self.collected.symtab,
            here: self.here_value(),
            visible_before,
        }
        .evaluate(expr, &mut problems);
        for problem in problems {
            self.report(
                problem.column().or(Some(column)),
                problem.code(),
                problem.to_string(),
            );
        }
        value
    }

    fn checked_word(&mut self, value: i64, column: usize) -> Unsigned12Bit {
        to_word(value).unwrap_or_else(|truncated| {
            self.report(
                Some(column),
                ErrorCode::Arithmetic,
                format!("value {} does not fit in a word", octal(value)),
            );
            truncated
        })
    }

    fn word_of(&mut self, expr: &Expression, column: usize) -> Unsigned12Bit {
        let value = self.evaluate(expr, None, column);
        self.checked_word(value, column)
    }

    /// Evaluate a parameter which decides where later code goes.
    fn sizing_value(&mut self, param: SourceCursor<'_>) -> Option<i64> {
        match parse_complete_expression(param, &self.state.scope) {
            Ok(expr) => Some(self.evaluate(&expr, Some(self.line), param.column())),
            Err(e) => {
                self.parse_error(e);
                None
            }
        }
    }

    /// The word for a data expression (a statement or a `.DATA`
    /// parameter).
    fn data_word(&mut self, text: SourceCursor<'_>) -> Unsigned12Bit {
        match parse_complete_expression(text, &self.state.scope) {
            Ok(expr) => self.word_of(&expr, text.column()),
            Err(e) => {
                self.parse_error(e);
                Unsigned12Bit::ZERO
            }
        }
    }

    /// Is `name` an instruction at this point in the program?
    fn opcode(&self, name: &str) -> Option<OpcodeEntry> {
        let upper = name.to_ascii_uppercase();
        let defined_earlier = self
            .collected
            .user_opcodes
            .definition_line(&upper)
            .is_some_and(|line| line < self.line);
        if defined_earlier {
            if let Some(entry) = self.collected.user_opcodes.get(&upper) {
                return Some(entry);
            }
        }
        self.state.instructions.lookup(&upper)
    }

    fn is_mnemonic(&self, name: &str) -> bool {
        self.opcode(name).is_some()
    }

    fn define_symbol(&mut self, name: SymbolName, value: SymbolValue, column: usize) {
        match self.pass {
            Pass::Collect => {
                self.collected.symtab.define(name, value, self.line);
            }
            Pass::Emit => {
                let repeated_on_line = !self.line_symbols.insert(name.clone());
                if let Some(first) = self.collected.symtab.first_definition_line(&name) {
                    if first != self.line || repeated_on_line {
                        self.report(
                            Some(column),
                            ErrorCode::MultipleDefinition,
                            format!("{name} was already defined on line {first}"),
                        );
                    }
                }
            }
        }
    }

    fn define_label(&mut self, label: SourceCursor<'_>, location: ExtendedAddress) {
        let name = label.as_str();
        if let Err(bad) = check_definable(name, |n| self.is_mnemonic(n)) {
            self.report(
                Some(label.column()),
                ErrorCode::BadSymbol,
                format!("cannot define label {name}: {bad}"),
            );
            return;
        }
        if !is_local(name) {
            self.state.scope = name.to_string();
        }
        let symbol = SymbolName::qualified(name, &self.state.scope);
        self.define_symbol(symbol, SymbolValue::Label(location), label.column());
    }

    /// Handle `NAME = EXPRESSION`, returning the value for the listing.
    fn define_constant(
        &mut self,
        name: SourceCursor<'_>,
        value: SourceCursor<'_>,
    ) -> Option<Unsigned12Bit> {
        let text = name.as_str();
        if let Err(bad) = check_definable(text, |n| self.is_mnemonic(n)) {
            self.report(
                Some(name.column()),
                ErrorCode::BadSymbol,
                format!("cannot define {text}: {bad}"),
            );
            return None;
        }
        let expr = match parse_complete_expression(value, &self.state.scope) {
            Ok(expr) => expr.with_here(self.here_value()),
            Err(e) => {
                self.parse_error(e);
                return None;
            }
        };
        let symbol = SymbolName::qualified(text, &self.state.scope);
        match self.pass {
            Pass::Collect => {
                self.collected
                    .symtab
                    .define(symbol, SymbolValue::Constant(expr), self.line);
                None
            }
            Pass::Emit => {
                let first = self.collected.symtab.first_definition_line(&symbol);
                self.define_symbol(symbol.clone(), SymbolValue::Constant(expr.clone()), name.column());
                // Evaluating the symbol itself (rather than its
                // expression) names it first in any loop.
                let evaluated = if first == Some(self.line) {
                    Expression::Symbol {
                        name: symbol,
                        column: name.column(),
                    }
                } else {
                    expr
                };
                Some(self.word_of(&evaluated, value.column()))
            }
        }
    }

    fn process_line(&mut self, text: &str, line: LineNumber) {
        self.line = line;
        self.line_words.clear();
        self.line_symbols.clear();
        let start = self.state.here();
        let source = parse_line(text, line);
        let defines_opcode = matches!(
            source.body,
            LineBody::Directive {
                op: PseudoOp::Opdef,
                ..
            }
        );
        if !defines_opcode {
            for label in &source.labels {
                self.define_label(*label, start);
            }
        }
        let mut constant_value = None;
        match source.body {
            LineBody::Empty => (),
            LineBody::Constant { name, value } => {
                constant_value = self.define_constant(name, value);
            }
            LineBody::Directive { op, name, operands } => {
                self.directive(op, name, operands, &source.labels);
            }
            LineBody::Statement(body) => self.statement(body),
        }

        if self.pass == Pass::Emit {
            let located = !self.line_words.is_empty() || (!source.labels.is_empty() && !defines_opcode);
            self.listing.push_line(ListingLine {
                line,
                location: located.then_some(start),
                words: std::mem::take(&mut self.line_words),
                value: constant_value,
                codes: String::new(),
                source: text.to_string(),
            });
        }
        if !self.state.nowarn_pending.is_empty() {
            let codes = std::mem::take(&mut self.state.nowarn_pending);
            self.diagnostics.suppress(codes);
        }
    }

    fn statement(&mut self, body: SourceCursor<'_>) {
        let (word, rest) = body.consume_while(is_ident_char);
        let ends_word = rest
            .peek()
            .map_or(true, |b| is_whitespace(b) || is_indirect(b) || is_literal_open(b));
        if !word.is_empty() && ends_word {
            if let Some(entry) = self.opcode(word.as_str()) {
                self.instruction(entry, rest);
                return;
            }
        }
        self.emit_encoded(|p| p.data_word(body));
    }

    fn instruction(&mut self, entry: OpcodeEntry, operands: SourceCursor<'_>) {
        match entry.class {
            InstructionClass::Mri => {
                self.emit_encoded(|p| p.memory_reference(entry.bits, operands));
            }
            InstructionClass::Opr => self.emit_encoded(|p| p.combine_operates(entry.bits, operands)),
            InstructionClass::Cxf => self.emit_encoded(|p| p.field_change(entry.bits, operands)),
            InstructionClass::Iot | InstructionClass::Pie | InstructionClass::Pio => {
                self.emit_encoded(|p| {
                    let extra = operands.trim();
                    if !extra.is_empty() {
                        p.report(
                            Some(extra.column()),
                            ErrorCode::Syntax,
                            format!("{} instructions take no operand", entry.class),
                        );
                    }
                    entry.bits
                });
            }
        }
    }

    fn target_address(&mut self, expr: &Expression, column: usize) -> Address {
        let word = self.word_of(expr, column);
        if let Some(name) = expr.as_symbol() {
            if let Some(SymbolValue::Label(location)) =
                self.collected.symtab.get(name).map(|def| &def.value)
            {
                let field = location.field;
                if field != self.state.field {
                    let current = self.state.field;
                    self.report(
                        Some(column),
                        ErrorCode::Field,
                        format!("{name} is in field {field}, not the current field {current}"),
                    );
                }
            }
        }
        Address::from(word)
    }

    fn direct(&mut self, opcode: Unsigned12Bit, indirect: bool, target: Address, column: usize) -> Unsigned12Bit {
        direct_reference(opcode, indirect, self.state.pc, target).unwrap_or_else(|best_effort| {
            self.report(
                Some(column),
                ErrorCode::OffPage,
                format!(
                    "{target} is not on page zero or the current page ({:o})",
                    self.state.pc.page()
                ),
            );
            best_effort
        })
    }

    /// Reach `target` through a link word on the current page (unless
    /// it can be reached directly).
    fn through_link(&mut self, opcode: Unsigned12Bit, target: Address, column: usize) -> Unsigned12Bit {
        let pc = self.state.pc;
        if let Ok(word) = direct_reference(opcode, false, pc, target) {
            return word;
        }
        match self
            .pools
            .allocate(self.state.here(), target.bits(), &self.collected.occupancy)
        {
            Some(slot) => pool_reference(opcode, slot),
            None => {
                self.report(
                    Some(column),
                    ErrorCode::PageFull,
                    format!("no room on page {:o} for a link to {target}", pc.page()),
                );
                direct_reference(opcode, false, pc, target).unwrap_or_else(|w| w)
            }
        }
    }

    fn literal(&mut self, opcode: Unsigned12Bit, indirect: bool, value: Unsigned12Bit, column: usize) -> Unsigned12Bit {
        match self
            .pools
            .allocate(self.state.here(), value, &self.collected.occupancy)
        {
            Some(slot) => literal_reference(opcode, indirect, slot),
            None => {
                self.report(
                    Some(column),
                    ErrorCode::PageFull,
                    format!(
                        "no room on page {:o} for the literal {value:04o}",
                        self.state.pc.page()
                    ),
                );
                literal_fallback(opcode, indirect, value)
            }
        }
    }

    fn memory_reference(&mut self, opcode: Unsigned12Bit, operands: SourceCursor<'_>) -> Unsigned12Bit {
        let operand = match parse_memory_operand(operands, &self.state.scope) {
            Ok(operand) => operand,
            Err(e) => {
                self.parse_error(e);
                return opcode;
            }
        };
        let column = operand.column;
        match &operand.form {
            OperandForm::Direct(expr) => {
                let target = self.target_address(expr, column);
                self.direct(opcode, operand.indirect, target, column)
            }
            OperandForm::Link(expr) => {
                let target = self.target_address(expr, column);
                self.through_link(opcode, target, column)
            }
            OperandForm::Literal(expr) => {
                let value = self.word_of(expr, column);
                self.literal(opcode, operand.indirect, value, column)
            }
        }
    }

    fn combine_operates(&mut self, first: Unsigned12Bit, operands: SourceCursor<'_>) -> Unsigned12Bit {
        let mut combiner = OprCombiner::new();
        if let Err(conflict) = combiner.add(first) {
            self.report(None, ErrorCode::IllegalOprCombination, conflict.to_string());
        }
        let mut rest = operands.consume_whitespace();
        while !rest.is_empty() {
            let (token, after) = rest.consume_until(is_whitespace);
            let column = Some(token.column());
            match self.opcode(token.as_str()) {
                None => self.report(
                    column,
                    ErrorCode::Syntax,
                    format!("{} is not an instruction", token.as_str()),
                ),
                Some(entry) if entry.class != InstructionClass::Opr => self.report(
                    column,
                    ErrorCode::IllegalOprCombination,
                    format!(
                        "{} is an {} instruction and cannot be combined with operate instructions",
                        token.as_str(),
                        entry.class
                    ),
                ),
                Some(entry) => {
                    if let Err(conflict) = combiner.add(entry.bits) {
                        self.report(column, ErrorCode::IllegalOprCombination, conflict.to_string());
                    }
                }
            }
            rest = after.consume_whitespace();
        }
        combiner.bits()
    }

    fn field_change(&mut self, bits: Unsigned12Bit, operands: SourceCursor<'_>) -> Unsigned12Bit {
        let text = operands.trim();
        if text.is_empty() {
            return field_instruction(bits, u8::from(self.state.field));
        }
        let value = match parse_complete_expression(text, &self.state.scope) {
            Ok(expr) => self.evaluate(&expr, None, text.column()),
            Err(e) => {
                self.parse_error(e);
                i64::from(u8::from(self.state.field))
            }
        };
        if !(0..=7).contains(&value) {
            self.report(
                Some(text.column()),
                ErrorCode::Field,
                format!("there is no field {}", octal(value)),
            );
        }
        field_instruction(bits, (value & 0o7) as u8)
    }

    fn directive(
        &mut self,
        op: PseudoOp,
        name: SourceCursor<'_>,
        operands: SourceCursor<'_>,
        labels: &[SourceCursor<'_>],
    ) {
        let params = operands.split_params(b',');
        let expected = op.param_check();
        if !expected.accepts(params.len()) {
            self.report(
                Some(name.column()),
                ErrorCode::PseudoOp,
                format!("{op} takes {expected}, but was given {}", params.len()),
            );
            return;
        }
        match op {
            PseudoOp::End => self.state.ended = true,
            PseudoOp::Org => self.set_origin(params[0]),
            PseudoOp::Data => {
                for param in params {
                    self.emit_encoded(|p| p.data_word(param));
                }
            }
            PseudoOp::Title => {
                let text = operands.trim().as_str();
                let unquoted = text
                    .strip_prefix('"')
                    .and_then(|t| t.strip_suffix('"'))
                    .or_else(|| text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')))
                    .unwrap_or(text);
                self.state.title = Some(unquoted.to_string());
            }
            PseudoOp::Asciz => self.ascii_string(params[0]),
            PseudoOp::Text => self.sixbit_string(params[0], true),
            PseudoOp::Sixbit => self.sixbit_string(params[0], false),
            PseudoOp::Block => self.reserve(&params),
            PseudoOp::Opdef => self.define_opcode(name, params[0], labels),
            PseudoOp::Page => self.next_page(params.first().copied()),
            PseudoOp::Field => self.select_field(params[0]),
            PseudoOp::Im6100 => self.select_cpu(CpuVariant::Im6100, name),
            PseudoOp::Hm6120 => self.select_cpu(CpuVariant::Hm6120, name),
            PseudoOp::Vector => {
                self.emit_encoded(|p| {
                    let pc = p.state.pc;
                    p.direct(JMP, true, pc.successor(), name.column())
                });
                self.emit_encoded(|p| p.data_word(params[0]));
            }
            PseudoOp::Stack => self.declare_stack(&params),
            PseudoOp::Push => self.push(name, params[0]),
            PseudoOp::Pop => self.pop(name),
            PseudoOp::PushJ => self.push_jump(name, params[0]),
            PseudoOp::PopJ => self.pop_jump(name),
            PseudoOp::NoWarn => self.no_warn(&params),
        }
    }

    fn set_origin(&mut self, param: SourceCursor<'_>) {
        let Some(value) = self.sizing_value(param) else {
            return;
        };
        let word = self.checked_word(value, param.column());
        if value < 0 {
            self.report(
                Some(param.column()),
                ErrorCode::Arithmetic,
                format!("origin {} is negative", octal(value)),
            );
        }
        self.state.set_origin(Address::from(word));
    }

    fn ascii_string(&mut self, param: SourceCursor<'_>) {
        let text = match parse_string(param) {
            Ok(text) => text,
            Err(e) => {
                self.parse_error(e);
                return;
            }
        };
        let mut bytes = Vec::with_capacity(text.len() + 1);
        for ch in text.chars() {
            match ascii_of_char(ch) {
                Ok(b) => bytes.push(b),
                Err(e) => {
                    self.report(Some(param.column()), ErrorCode::Arithmetic, e.to_string());
                    bytes.push(b'?');
                }
            }
        }
        bytes.push(0);
        for word in pack_ascii(&bytes) {
            self.emit(word);
        }
    }

    fn sixbit_string(&mut self, param: SourceCursor<'_>, terminated: bool) {
        let text = match parse_string(param) {
            Ok(text) => text,
            Err(e) => {
                self.parse_error(e);
                return;
            }
        };
        let mut codes: Vec<Unsigned6Bit> = Vec::with_capacity(text.len() + 1);
        for ch in text.chars() {
            match sixbit_of_char(ch) {
                Ok(code) => codes.push(code),
                Err(e) => {
                    self.report(Some(param.column()), ErrorCode::Arithmetic, e.to_string());
                    codes.push(SIXBIT_SPACE);
                }
            }
        }
        let words = if terminated {
            codes.push(Unsigned6Bit::ZERO);
            pack_sixbit(&codes, Unsigned6Bit::ZERO)
        } else {
            pack_sixbit(&codes, SIXBIT_SPACE)
        };
        for word in words {
            self.emit(word);
        }
    }

    fn reserve(&mut self, params: &[SourceCursor<'_>]) {
        let mut total: i64 = 0;
        for param in params {
            if let Some(n) = self.sizing_value(*param) {
                total = total.saturating_add(n);
            }
        }
        let len = match u16::try_from(total) {
            Ok(len) if len <= 0o7777 => len,
            _ => {
                self.report(
                    params.first().map(SourceCursor::column),
                    ErrorCode::Arithmetic,
                    format!("cannot reserve {} words", octal(total)),
                );
                return;
            }
        };
        if self.pass == Pass::Collect {
            self.collected.occupancy.record_block(self.state.here(), len);
        }
        event!(Level::TRACE, "line {}: reserving {len:o} words at {}", self.line, self.state.here());
        self.state.pc = self.state.pc.index_by(len);
    }

    fn define_opcode(&mut self, directive: SourceCursor<'_>, param: SourceCursor<'_>, labels: &[SourceCursor<'_>]) {
        let [label] = labels else {
            self.report(
                Some(directive.column()),
                ErrorCode::PseudoOp,
                format!(
                    "{} needs exactly one label naming the new instruction",
                    PseudoOp::Opdef
                ),
            );
            return;
        };
        let name = label.as_str();
        if let Err(bad) = check_definable(name, |_| false) {
            self.report(
                Some(label.column()),
                ErrorCode::BadSymbol,
                format!("cannot define instruction {name}: {bad}"),
            );
            return;
        }
        let Some(value) = self.sizing_value(param) else {
            return;
        };
        let bits = self.checked_word(value, param.column());
        let entry = OpcodeEntry::new(bits, InstructionClass::of_user_opcode(bits));
        match self.pass {
            Pass::Collect => {
                self.collected.user_opcodes.define(name, entry, self.line);
            }
            Pass::Emit => {
                if let Some(first) = self.collected.user_opcodes.definition_line(name) {
                    if first != self.line {
                        self.report(
                            Some(label.column()),
                            ErrorCode::MultipleDefinition,
                            format!("instruction {name} was already defined on line {first}"),
                        );
                    }
                }
            }
        }
    }

    fn next_page(&mut self, param: Option<SourceCursor<'_>>) {
        let start = match param {
            None if self.state.pc.is_page_start() => return,
            None => self.state.pc.page_start().index_by(PAGE_SIZE),
            Some(param) => {
                let Some(value) = self.sizing_value(param) else {
                    return;
                };
                if !(0..=0o37).contains(&value) {
                    self.report(
                        Some(param.column()),
                        ErrorCode::Arithmetic,
                        format!("there is no page {}", octal(value)),
                    );
                }
                Address::from_page_and_offset(Page::truncating((value & 0o37) as u8), PageOffset::ZERO)
            }
        };
        self.state.set_origin(start);
    }

    fn select_field(&mut self, param: SourceCursor<'_>) {
        let Some(value) = self.sizing_value(param) else {
            return;
        };
        if !(0..=7).contains(&value) {
            self.report(
                Some(param.column()),
                ErrorCode::Field,
                format!("there is no field {}", octal(value)),
            );
        }
        self.state.field = Field::truncating((value & 0o7) as u8);
        self.state.set_origin(DEFAULT_ORIGIN);
    }

    fn select_cpu(&mut self, cpu: CpuVariant, directive: SourceCursor<'_>) {
        if let Err(current) = self.state.select_cpu(cpu) {
            self.report(
                Some(directive.column()),
                ErrorCode::PseudoOp,
                format!("cannot select the {cpu} instructions, the {current} instructions are already selected"),
            );
        }
    }

    fn declare_stack(&mut self, params: &[SourceCursor<'_>]) {
        let convention = match self.pass {
            Pass::Collect => StackConvention {
                push: Unsigned12Bit::ZERO,
                pop: Unsigned12Bit::ZERO,
                pop_return: Unsigned12Bit::ZERO,
            },
            Pass::Emit => {
                // The pointer word is only checked.
                let pointer = self.data_word(params[0]);
                let push = self.data_word(params[1]);
                let pop = self.data_word(params[2]);
                let pop_return = self.data_word(params[3]);
                event!(
                    Level::DEBUG,
                    "line {}: stack pointer at {pointer:04o}, push {push:04o}, pop {pop:04o}, return {pop_return:04o}",
                    self.line
                );
                StackConvention {
                    push,
                    pop,
                    pop_return,
                }
            }
        };
        self.state.stack = Some(convention);
    }

    fn stack_style(&mut self, directive: SourceCursor<'_>) -> Option<StackStyle> {
        if self.state.cpu == CpuVariant::Hm6120 {
            return Some(StackStyle::Hardware);
        }
        match self.state.stack {
            Some(convention) => Some(StackStyle::Software(convention)),
            None => {
                self.report(
                    Some(directive.column()),
                    ErrorCode::PseudoOp,
                    format!(
                        "{} needs the HM6120 or an earlier {}",
                        directive.as_str().to_ascii_uppercase(),
                        PseudoOp::Stack
                    ),
                );
                None
            }
        }
    }

    fn call_through_link(&mut self, opcode: Unsigned12Bit, routine: Unsigned12Bit, column: usize) {
        self.emit_encoded(|p| p.through_link(opcode, Address::from(routine), column));
    }

    fn push(&mut self, directive: SourceCursor<'_>, param: SourceCursor<'_>) {
        let Some(style) = self.stack_style(directive) else {
            return;
        };
        self.emit(CLA);
        self.emit_encoded(|p| p.memory_reference(TAD, param));
        match style {
            StackStyle::Hardware => self.emit(PAC1),
            StackStyle::Software(convention) => {
                self.call_through_link(JMS, convention.push, directive.column());
            }
        }
    }

    fn pop(&mut self, directive: SourceCursor<'_>) {
        match self.stack_style(directive) {
            None => (),
            Some(StackStyle::Hardware) => self.emit(POP1),
            Some(StackStyle::Software(convention)) => {
                self.call_through_link(JMS, convention.pop, directive.column());
            }
        }
    }

    fn jump_to(&mut self, param: SourceCursor<'_>) {
        self.emit_encoded(|p| match parse_complete_expression(param, &p.state.scope) {
            Ok(expr) => {
                let target = p.target_address(&expr, param.column());
                p.through_link(JMP, target, param.column())
            }
            Err(e) => {
                p.parse_error(e);
                JMP
            }
        });
    }

    fn push_jump(&mut self, directive: SourceCursor<'_>, param: SourceCursor<'_>) {
        let Some(style) = self.stack_style(directive) else {
            return;
        };
        match style {
            StackStyle::Hardware => self.emit(PPC1),
            StackStyle::Software(convention) => {
                // The return address follows the four words generated here.
                let ret = self.state.pc.index_by(4).bits();
                self.emit(CLA);
                self.emit_encoded(|p| p.literal(TAD, false, ret, directive.column()));
                self.call_through_link(JMS, convention.push, directive.column());
            }
        }
        self.jump_to(param);
    }

    fn pop_jump(&mut self, directive: SourceCursor<'_>) {
        match self.stack_style(directive) {
            None => (),
            Some(StackStyle::Hardware) => self.emit(RTN1),
            Some(StackStyle::Software(convention)) => {
                self.call_through_link(JMP, convention.pop_return, directive.column());
            }
        }
    }

    fn no_warn(&mut self, params: &[SourceCursor<'_>]) {
        let mut codes = Vec::new();
        for param in params {
            for ch in param.as_str().chars().filter(|ch| !ch.is_whitespace()) {
                match ErrorCode::from_letter(ch.to_ascii_uppercase()) {
                    Some(code) => codes.push(code),
                    None => {
                        self.report(
                            Some(param.column()),
                            ErrorCode::PseudoOp,
                            format!("there is no diagnostic '{}'", ch.escape_default()),
                        );
                        return;
                    }
                }
            }
        }
        self.state.nowarn_pending = codes;
    }

    fn finish(self) -> Assembly {
        let LineProcessor {
            state,
            collected,
            pools,
            diagnostics,
            mut words,
            mut listing,
            ..
        } = self;
        let pool_words = pools.words();
        words.extend(pool_words.iter().map(|(location, word)| EmittedWord {
            location: *location,
            word: *word,
            line: None,
        }));
        let symbols = collected.symtab.finalise();
        let diagnostics = diagnostics.into_vec();
        listing.annotate(&diagnostics);
        listing.set_title(state.title.clone());
        listing.set_pool(pool_words);
        listing.set_final_symbols(symbols.clone());
        event!(
            Level::INFO,
            "assembled {} words, {} symbols, {} diagnostics",
            words.len(),
            symbols.len(),
            diagnostics.len()
        );
        Assembly {
            words,
            symbols,
            diagnostics,
            listing,
            title: state.title,
        }
    }
}

fn run_pass<'c>(
    pass: Pass,
    source: &str,
    options: &AssemblerOptions,
    collected: &'c mut Collected,
) -> LineProcessor<'c> {
    let span = span!(Level::DEBUG, "pass", ?pass);
    let _enter = span.enter();
    let mut processor = LineProcessor::new(pass, options, collected);
    for (line, text) in (1..).zip(source.lines()) {
        if processor.state.ended {
            break;
        }
        processor.process_line(text, line);
    }
    if !processor.state.ended {
        event!(Level::DEBUG, "no .END; assembled to the end of the input");
    }
    event!(
        Level::DEBUG,
        "{pass:?} pass finished at {} with {} symbols and {} user instructions",
        processor.state.here(),
        processor.collected.symtab.len(),
        processor.collected.user_opcodes.len()
    );
    processor
}

/// Assemble a whole program.  This never fails: problems with the
/// program are returned as diagnostics in the [`Assembly`].
#[must_use]
pub fn assemble_source(source: &str, options: &AssemblerOptions) -> Assembly {
    let span = span!(Level::INFO, "assemble", cpu = %options.cpu);
    let _enter = span.enter();
    let mut collected = Collected::default();
    drop(run_pass(Pass::Collect, source, options, &mut collected));
    run_pass(Pass::Emit, source, options, &mut collected).finish()
}
