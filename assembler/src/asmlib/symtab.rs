use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use tracing::{event, Level};

use base::prelude::{ExtendedAddress, Field, Unsigned12Bit};

use super::ast::Expression;
use super::eval::{to_word, EvalContext};
use super::symbol::SymbolName;
use super::types::LineNumber;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SymbolValue {
    /// A location in the program.
    Label(ExtendedAddress),
    /// A named constant (`NAME = EXPRESSION`).  Any `.` in the
    /// expression has already been replaced by the location of the
    /// definition.
    Constant(Expression),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SymbolDefinition {
    pub(crate) value: SymbolValue,
    /// The line of the first definition, which is the one that counts.
    pub(crate) line: LineNumber,
    pub(crate) multiply_defined: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Definition {
    New,
    Repeated { first_line: LineNumber },
}

/// Symbols defined by the program.  This is filled in by the first
/// pass and consulted by the second.
#[derive(Debug, Default)]
pub(crate) struct SymbolTable {
    definitions: BTreeMap<SymbolName, SymbolDefinition>,
}

impl SymbolTable {
    /// Record a definition.  If the symbol already has one, the
    /// existing definition is kept and the symbol is marked as
    /// multiply defined.
    pub(crate) fn define(
        &mut self,
        name: SymbolName,
        value: SymbolValue,
        line: LineNumber,
    ) -> Definition {
        match self.definitions.get_mut(&name) {
            Some(existing) => {
                event!(
                    Level::DEBUG,
                    "symbol {name} defined on line {line} was already defined on line {}",
                    existing.line
                );
                existing.multiply_defined = true;
                Definition::Repeated {
                    first_line: existing.line,
                }
            }
            None => {
                event!(Level::TRACE, "defining {name} on line {line}: {value:?}");
                self.definitions.insert(
                    name,
                    SymbolDefinition {
                        value,
                        line,
                        multiply_defined: false,
                    },
                );
                Definition::New
            }
        }
    }

    pub(crate) fn get(&self, name: &SymbolName) -> Option<&SymbolDefinition> {
        self.definitions.get(name)
    }

    pub(crate) fn first_definition_line(&self, name: &SymbolName) -> Option<LineNumber> {
        self.get(name).map(|def| def.line)
    }

    pub(crate) fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Compute the final value of every symbol.
    pub(crate) fn finalise(&self) -> FinalSymbolTable {
        let entries = self
            .definitions
            .iter()
            .map(|(name, def)| {
                let (value, field, kind) = match &def.value {
                    SymbolValue::Label(location) => {
                        (location.address.bits(), Some(location.field), SymbolKind::Label)
                    }
                    SymbolValue::Constant(expr) => {
                        let context = EvalContext {
                            symtab: self,
                            here: 0,
                            visible_before: None,
                        };
                        // Problems with constants were reported on their
                        // definition lines.
                        let mut problems = Vec::new();
                        let value = to_word(context.evaluate(expr, &mut problems))
                            .unwrap_or_else(|truncated| truncated);
                        (value, None, SymbolKind::Constant)
                    }
                };
                (
                    name.to_string(),
                    FinalSymbol {
                        value,
                        field,
                        kind,
                        line: def.line,
                        multiply_defined: def.multiply_defined,
                    },
                )
            })
            .collect();
        FinalSymbolTable { entries }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Label,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalSymbol {
    pub value: Unsigned12Bit,
    /// The field of a label.  Constants have no field.
    pub field: Option<Field>,
    pub kind: SymbolKind,
    /// Where the (first) definition is.
    pub line: LineNumber,
    pub multiply_defined: bool,
}

/// The symbol table of an assembled program, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalSymbolTable {
    entries: BTreeMap<String, FinalSymbol>,
}

impl FinalSymbolTable {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FinalSymbol> {
        self.entries.get(name)
    }

    /// The value of a symbol, if it is defined.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Unsigned12Bit> {
        self.get(name).map(|sym| sym.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FinalSymbol)> {
        self.entries.iter().map(|(name, sym)| (name.as_str(), sym))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Display for FinalSymbolTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (name, sym) in self.iter() {
            let marker = if sym.multiply_defined { " M" } else { "" };
            match sym.field {
                Some(field) => writeln!(f, "{name:<20} {field}{:04o}{marker}", sym.value)?,
                None => writeln!(f, "{name:<20}  {:04o}{marker}", sym.value)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base::prelude::Address;

    fn location(field: u8, addr: u16) -> ExtendedAddress {
        ExtendedAddress::new(
            Field::try_from(field).expect("valid field"),
            Address::try_from(addr).expect("valid address"),
        )
    }

    #[test]
    fn first_definition_wins() {
        let mut symtab = SymbolTable::default();
        let name = SymbolName::from("X");
        assert_eq!(
            symtab.define(name.clone(), SymbolValue::Label(location(0, 0o200)), 3),
            Definition::New
        );
        assert_eq!(
            symtab.define(name.clone(), SymbolValue::Label(location(0, 0o300)), 7),
            Definition::Repeated { first_line: 3 }
        );
        let def = symtab.get(&name).expect("X is defined");
        assert_eq!(def.value, SymbolValue::Label(location(0, 0o200)));
        assert!(def.multiply_defined);
        assert_eq!(symtab.first_definition_line(&name), Some(3));
        assert_eq!(symtab.len(), 1);
    }

    #[test]
    fn redefinition_on_the_same_line_is_multiple() {
        let mut symtab = SymbolTable::default();
        let name = SymbolName::from("X");
        symtab.define(name.clone(), SymbolValue::Label(location(0, 0o200)), 3);
        assert_eq!(
            symtab.define(name.clone(), SymbolValue::Label(location(0, 0o200)), 3),
            Definition::Repeated { first_line: 3 }
        );
        assert!(symtab.get(&name).expect("X is defined").multiply_defined);
    }

    #[test]
    fn final_table() {
        let mut symtab = SymbolTable::default();
        symtab.define(SymbolName::from("START"), SymbolValue::Label(location(1, 0o200)), 1);
        symtab.define(
            SymbolName::from("MINUS"),
            SymbolValue::Constant(Expression::Literal(-2)),
            2,
        );
        let table = symtab.finalise();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value("START"), Some(Unsigned12Bit::truncating(0o200)));
        assert_eq!(table.value("MINUS"), Some(Unsigned12Bit::truncating(0o7776)));
        assert_eq!(table.get("MINUS").map(|s| s.kind), Some(SymbolKind::Constant));
        assert_eq!(table.value("NONE"), None);
        assert_eq!(
            table.to_string(),
            "MINUS                 7776\nSTART                10200\n"
        );
    }
}
