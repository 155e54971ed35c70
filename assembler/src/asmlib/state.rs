use std::collections::HashMap;

use tracing::{event, Level};

use base::prelude::{
    Address, CpuVariant, ExtendedAddress, Field, InstructionTable, OpcodeEntry, Overlay,
    Unsigned12Bit,
};

use super::diagnostics::ErrorCode;
use super::symtab::Definition;
use super::types::{AssemblerOptions, LineNumber};

/// Where assembly starts in each field, following the PDP-8
/// convention of leaving page zero for variables and links.
pub(crate) const DEFAULT_ORIGIN: Address = Address::new(Unsigned12Bit::new::<0o200>());

/// The software stack convention declared by `.STACK`.  The
/// runtime routines maintain the stack pointer themselves, so the
/// generated code only needs their entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StackConvention {
    /// Entry point of the push routine.
    pub(crate) push: Unsigned12Bit,
    /// Entry point of the pop routine.
    pub(crate) pop: Unsigned12Bit,
    /// Entry point of the pop-and-return routine.
    pub(crate) pop_return: Unsigned12Bit,
}

/// Opcodes defined by the program with `.OPDEF`.  These are found in
/// the first pass and remain in force for the whole second pass.
#[derive(Debug)]
pub(crate) struct UserOpcodes {
    overlay: Overlay,
    lines: HashMap<String, LineNumber>,
}

impl Default for UserOpcodes {
    fn default() -> UserOpcodes {
        UserOpcodes {
            overlay: Overlay::new("user"),
            lines: HashMap::new(),
        }
    }
}

impl UserOpcodes {
    pub(crate) fn define(&mut self, name: &str, entry: OpcodeEntry, line: LineNumber) -> Definition {
        let name = name.to_ascii_uppercase();
        match self.lines.get(&name) {
            Some(first_line) => Definition::Repeated {
                first_line: *first_line,
            },
            None => {
                event!(Level::DEBUG, "line {line}: user opcode {name} = {} {}", entry.bits, entry.class);
                self.overlay.insert(&name, entry);
                self.lines.insert(name, line);
                Definition::New
            }
        }
    }

    pub(crate) fn get(&self, mnemonic: &str) -> Option<OpcodeEntry> {
        self.overlay.get(mnemonic).copied()
    }

    pub(crate) fn definition_line(&self, name: &str) -> Option<LineNumber> {
        self.lines.get(&name.to_ascii_uppercase()).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.overlay.len()
    }
}

/// The state of the assembler as it works through the program.  Each
/// pass starts from a fresh state, so both passes see the same state
/// on any given line.
#[derive(Debug)]
pub(crate) struct AssemblerState {
    pub(crate) cpu: CpuVariant,
    pub(crate) instructions: InstructionTable,
    pub(crate) field: Field,
    pub(crate) origin: Address,
    pub(crate) pc: Address,
    /// The most recent global label, which qualifies local labels.
    pub(crate) scope: String,
    pub(crate) stack: Option<StackConvention>,
    pub(crate) title: Option<String>,
    /// Diagnostics to suppress once the current line is finished.
    pub(crate) nowarn_pending: Vec<ErrorCode>,
    pub(crate) ended: bool,
}

impl AssemblerState {
    pub(crate) fn new(options: &AssemblerOptions) -> AssemblerState {
        AssemblerState {
            cpu: options.cpu,
            instructions: InstructionTable::for_cpu(options.cpu),
            field: Field::ZERO,
            origin: DEFAULT_ORIGIN,
            pc: DEFAULT_ORIGIN,
            scope: String::new(),
            stack: None,
            title: None,
            nowarn_pending: Vec::new(),
            ended: false,
        }
    }

    pub(crate) fn here(&self) -> ExtendedAddress {
        ExtendedAddress::new(self.field, self.pc)
    }

    pub(crate) fn set_origin(&mut self, address: Address) {
        self.origin = address;
        self.pc = address;
    }

    /// Select a processor extension.  Only one extension can be in
    /// use; if a different one is already selected, that one is
    /// returned as the error.
    pub(crate) fn select_cpu(&mut self, cpu: CpuVariant) -> Result<(), CpuVariant> {
        if cpu == self.cpu {
            Ok(())
        } else if self.cpu == CpuVariant::Pdp8 {
            if let Some(overlay) = cpu.overlay() {
                self.instructions.push_overlay(overlay);
            }
            self.cpu = cpu;
            Ok(())
        } else {
            Err(self.cpu)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base::prelude::InstructionClass;

    #[test]
    fn initial_state() {
        let state = AssemblerState::new(&AssemblerOptions::default());
        assert_eq!(state.here().to_string(), "00200");
        assert_eq!(state.cpu, CpuVariant::Pdp8);
        assert!(state.instructions.lookup("PAC1").is_none());
    }

    #[test]
    fn cpu_selection_is_exclusive() {
        let mut state = AssemblerState::new(&AssemblerOptions::default());
        assert_eq!(state.select_cpu(CpuVariant::Hm6120), Ok(()));
        assert!(state.instructions.lookup("PAC1").is_some());
        assert_eq!(state.select_cpu(CpuVariant::Hm6120), Ok(()));
        assert_eq!(state.select_cpu(CpuVariant::Im6100), Err(CpuVariant::Hm6120));
        assert!(state.instructions.lookup("READ1").is_none());
    }

    #[test]
    fn user_opcodes_keep_first_definition() {
        let mut user = UserOpcodes::default();
        let entry = OpcodeEntry::new(Unsigned12Bit::truncating(0o6551), InstructionClass::Iot);
        assert_eq!(user.define("beep", entry, 4), Definition::New);
        let other = OpcodeEntry::new(Unsigned12Bit::truncating(0o6552), InstructionClass::Iot);
        assert_eq!(user.define("BEEP", other, 9), Definition::Repeated { first_line: 4 });
        assert_eq!(user.get("BEEP"), Some(entry));
        assert_eq!(user.definition_line("beep"), Some(4));
        assert_eq!(user.len(), 1);
    }
}
