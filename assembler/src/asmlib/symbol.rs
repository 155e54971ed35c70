use std::fmt::{self, Debug, Display, Formatter};

use super::predicates::{is_ident_char, is_ident_start};

/// Separates the scope from a local symbol in a qualified name such
/// as `MAIN:.LOOP`.
pub(crate) const SCOPE_SEPARATOR: char = ':';

/// The name of a symbol as stored in the symbol table.  Local symbols
/// (whose names begin with `.`) are stored qualified by the global
/// label they follow.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct SymbolName {
    pub(crate) canonical: String,
}

impl SymbolName {
    /// Qualify `name` as it appears in the source.  Local names are
    /// prefixed with `scope`; global names and names which are
    /// already qualified are unchanged.
    pub(crate) fn qualified(name: &str, scope: &str) -> SymbolName {
        if is_local(name) {
            SymbolName {
                canonical: format!("{scope}{SCOPE_SEPARATOR}{name}"),
            }
        } else {
            SymbolName::from(name)
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.canonical
    }
}

impl From<String> for SymbolName {
    fn from(s: String) -> SymbolName {
        SymbolName { canonical: s }
    }
}

impl From<&str> for SymbolName {
    fn from(s: &str) -> SymbolName {
        SymbolName::from(s.to_string())
    }
}

impl Display for SymbolName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.canonical, f)
    }
}

impl Debug for SymbolName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolName {{ canonical: \"{}\" }}", self.canonical)
    }
}

pub(crate) fn is_local(name: &str) -> bool {
    name.starts_with('.')
}

/// Why a name cannot be defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BadName {
    Empty,
    Here,
    BadStart(char),
    BadCharacter(char),
    Mnemonic,
}

impl Display for BadName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BadName::Empty => f.write_str("missing symbol name"),
            BadName::Here => f.write_str("'.' (the current location) cannot be defined"),
            BadName::BadStart(ch) => {
                write!(f, "symbol names cannot start with '{}'", ch.escape_default())
            }
            BadName::BadCharacter(ch) => write!(
                f,
                "symbol names cannot contain '{}'",
                ch.escape_default()
            ),
            BadName::Mnemonic => f.write_str("an instruction mnemonic cannot be used as a symbol"),
        }
    }
}

/// Check the spelling of a name being defined (as a label or a
/// constant).  `is_mnemonic` tells us whether the name is already an
/// instruction.
pub(crate) fn check_definable<F>(name: &str, is_mnemonic: F) -> Result<(), BadName>
where
    F: Fn(&str) -> bool,
{
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(BadName::Empty),
        Some(first) if !u8::try_from(first).is_ok_and(is_ident_start) => {
            return Err(BadName::BadStart(first));
        }
        Some(_) => (),
    }
    if let Some(bad) = chars.find(|ch| !u8::try_from(*ch).is_ok_and(is_ident_char)) {
        return Err(BadName::BadCharacter(bad));
    }
    if name == "." {
        return Err(BadName::Here);
    }
    if is_mnemonic(name) {
        return Err(BadName::Mnemonic);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_mnemonics(_: &str) -> bool {
        false
    }

    #[test]
    fn qualification() {
        assert_eq!(SymbolName::qualified(".LOOP", "MAIN").as_str(), "MAIN:.LOOP");
        assert_eq!(SymbolName::qualified(".LOOP", "").as_str(), ":.LOOP");
        assert_eq!(SymbolName::qualified("MAIN", "OTHER").as_str(), "MAIN");
        assert_eq!(SymbolName::qualified("SUB:.X", "MAIN").as_str(), "SUB:.X");
    }

    #[test]
    fn definable_names() {
        assert_eq!(check_definable("START", no_mnemonics), Ok(()));
        assert_eq!(check_definable(".L1", no_mnemonics), Ok(()));
        assert_eq!(check_definable("_x.y", no_mnemonics), Ok(()));
        assert_eq!(check_definable("", no_mnemonics), Err(BadName::Empty));
        assert_eq!(check_definable(".", no_mnemonics), Err(BadName::Here));
        assert_eq!(check_definable("1ST", no_mnemonics), Err(BadName::BadStart('1')));
        assert_eq!(check_definable("A-B", no_mnemonics), Err(BadName::BadCharacter('-')));
        assert_eq!(
            check_definable("TAD", |name| name.eq_ignore_ascii_case("tad")),
            Err(BadName::Mnemonic)
        );
    }
}
