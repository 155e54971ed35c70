use std::fmt::{self, Display, Formatter};

use base::prelude::{ExtendedAddress, Unsigned12Bit};

use super::diagnostics::Diagnostic;
use super::symtab::FinalSymbolTable;
use super::types::LineNumber;

/// One source line and what it assembled into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLine {
    pub line: LineNumber,
    /// The location counter at the start of the line, for lines which
    /// have labels or generate words.
    pub location: Option<ExtendedAddress>,
    pub words: Vec<(ExtendedAddress, Unsigned12Bit)>,
    /// The value of a constant defined on this line.
    pub value: Option<Unsigned12Bit>,
    /// The letters of the diagnostics reported on this line.
    pub codes: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    title: Option<String>,
    lines: Vec<ListingLine>,
    pool: Vec<(ExtendedAddress, Unsigned12Bit)>,
    final_symbols: FinalSymbolTable,
}

impl Listing {
    pub(crate) fn push_line(&mut self, line: ListingLine) {
        self.lines.push(line);
    }

    pub(crate) fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub(crate) fn set_pool(&mut self, pool: Vec<(ExtendedAddress, Unsigned12Bit)>) {
        self.pool = pool;
    }

    pub(crate) fn set_final_symbols(&mut self, final_symbols: FinalSymbolTable) {
        self.final_symbols = final_symbols;
    }

    /// Mark each line with the letters of its diagnostics.
    pub(crate) fn annotate(&mut self, diagnostics: &[Diagnostic]) {
        for line in &mut self.lines {
            line.codes = diagnostics
                .iter()
                .filter(|d| d.line == line.line)
                .map(|d| d.code.letter())
                .collect();
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[ListingLine] {
        &self.lines
    }
}

impl Display for ListingLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        const EMPTY: &str = "";
        let codes = &self.codes;
        let line = self.line;
        match (self.words.split_first(), self.value, self.location) {
            (Some(((location, word), rest)), _, _) => {
                write!(f, "{codes:<3} {line:>5}  {location}  {word:04o}  {}", self.source)?;
                for (location, word) in rest {
                    write!(f, "\n{EMPTY:<3} {EMPTY:>5}  {location}  {word:04o}")?;
                }
                Ok(())
            }
            (None, Some(value), _) => {
                write!(f, "{codes:<3} {line:>5}  {EMPTY:5} ={value:04o}  {}", self.source)
            }
            (None, None, Some(location)) => {
                write!(f, "{codes:<3} {line:>5}  {location}  {EMPTY:4}  {}", self.source)
            }
            (None, None, None) => {
                write!(f, "{codes:<3} {line:>5}  {EMPTY:5}  {EMPTY:4}  {}", self.source)
            }
        }
    }
}

impl Display for Listing {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(title) = &self.title {
            writeln!(f, "{title}")?;
            writeln!(f)?;
        }
        for line in &self.lines {
            writeln!(f, "{}", line.to_string().trim_end())?;
        }
        if !self.pool.is_empty() {
            writeln!(f)?;
            writeln!(f, "Links and literals:")?;
            for (location, word) in &self.pool {
                writeln!(f, "{location}  {word:04o}")?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Symbol table:")?;
        write!(f, "{}", self.final_symbols)
    }
}
