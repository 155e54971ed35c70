//! PDP-8 instruction words and the mnemonic tables used to build them.
//!
//! A PDP-8 instruction is a single 12-bit word.  The top three bits
//! select the opcode.  Opcodes 0 to 5 are memory reference
//! instructions (MRI):
//!
//! ```text
//!  11 10  9 |  8  |  7  | 6  5  4  3  2  1  0
//! | opcode  |  I  |  Z  |   offset in page    |
//! ```
//!
//! `I` selects indirect addressing and `Z` selects the current page
//! (when clear, the offset refers to page zero).  Opcode 6 is IOT,
//! which on the IM6100 and HM6120 also covers the memory-extension,
//! peripheral interface and stack instructions.  Opcode 7 is OPR,
//! whose remaining bits are micro-instructions that can be combined
//! within a group.
//!
//! The mnemonic table for a particular CPU is an immutable base table
//! for the PDP-8 with an ordered list of overlays on top.  Lookup
//! searches the overlays from last to first, so a later overlay can
//! redefine a mnemonic of an earlier one.
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use crate::types::PageOffset;
use crate::unsigned::Unsigned12Bit;


/// The indirect addressing bit of a memory reference instruction.
pub const MRI_INDIRECT: u16 = 0o400;

/// The current-page bit of a memory reference instruction.
pub const MRI_CURRENT_PAGE: u16 = 0o200;

/// The page offset part of a memory reference instruction.
pub const MRI_OFFSET_MASK: u16 = 0o177;

/// Build a memory reference instruction.  Any addressing bits already
/// set in `opcode` (as in a user-defined opcode) are kept.
pub fn mri_word(
    opcode: Unsigned12Bit,
    indirect: bool,
    current_page: bool,
    offset: PageOffset,
) -> Unsigned12Bit {
    let mut bits = u16::from(opcode);
    if indirect {
        bits |= MRI_INDIRECT;
    }
    if current_page {
        bits |= MRI_CURRENT_PAGE;
    }
    Unsigned12Bit::truncating(bits | u16::from(offset))
}

/// How an instruction takes its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionClass {
    /// Memory reference; takes an address.
    Mri,
    /// Operate; combines with other OPR mnemonics on the same line.
    Opr,
    /// Input/output transfer; no operand.
    Iot,
    /// Field change; takes an optional field number.
    Cxf,
    /// IM6101 Peripheral Interface Element; no operand.
    Pie,
    /// IM6103 Parallel I/O; no operand.
    Pio,
}

impl InstructionClass {
    /// The class of an opcode defined by the program itself, which
    /// is decided by its top three bits.
    pub fn of_user_opcode(bits: Unsigned12Bit) -> InstructionClass {
        match u16::from(bits) >> 9 {
            0..=5 => InstructionClass::Mri,
            6 => InstructionClass::Iot,
            _ => InstructionClass::Opr,
        }
    }

    pub fn takes_address(&self) -> bool {
        matches!(self, InstructionClass::Mri)
    }
}

impl Display for InstructionClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(match self {
            InstructionClass::Mri => "MRI",
            InstructionClass::Opr => "OPR",
            InstructionClass::Iot => "IOT",
            InstructionClass::Cxf => "CXF",
            InstructionClass::Pie => "PIE",
            InstructionClass::Pio => "PIO",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpcodeEntry {
    pub bits: Unsigned12Bit,
    pub class: InstructionClass,
}

impl OpcodeEntry {
    pub fn new(bits: Unsigned12Bit, class: InstructionClass) -> OpcodeEntry {
        OpcodeEntry { bits, class }
    }
}

/// The processor whose instruction set we assemble for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CpuVariant {
    #[default]
    Pdp8,
    Hm6120,
    Im6100,
}

impl CpuVariant {
    /// The overlay this processor adds to the PDP-8 instruction set.
    pub fn overlay(&self) -> Option<Overlay> {
        match self {
            CpuVariant::Pdp8 => None,
            CpuVariant::Hm6120 => Some(Overlay::from_table("HM6120", HM6120_INSTRUCTIONS)),
            CpuVariant::Im6100 => Some(Overlay::from_table("IM6100", IM6100_INSTRUCTIONS)),
        }
    }
}

impl Display for CpuVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(match self {
            CpuVariant::Pdp8 => "PDP-8",
            CpuVariant::Hm6120 => "HM6120",
            CpuVariant::Im6100 => "IM6100",
        })
    }
}

type TableRow = (&'static str, u16, InstructionClass);

use InstructionClass::{Cxf, Iot, Mri, Opr, Pie, Pio};

const BASE_INSTRUCTIONS: &[TableRow] = &[
    ("AND", 0o0000, Mri),
    ("TAD", 0o1000, Mri),
    ("ISZ", 0o2000, Mri),
    ("DCA", 0o3000, Mri),
    ("JMS", 0o4000, Mri),
    ("JMP", 0o5000, Mri),
    // Group 1 operate.  NOP and CLA also combine with groups 2 and 3.
    ("NOP", 0o7000, Opr),
    ("IAC", 0o7001, Opr),
    ("BSW", 0o7002, Opr),
    ("RAL", 0o7004, Opr),
    ("RTL", 0o7006, Opr),
    ("RAR", 0o7010, Opr),
    ("RTR", 0o7012, Opr),
    ("CML", 0o7020, Opr),
    ("CMA", 0o7040, Opr),
    ("CIA", 0o7041, Opr),
    ("CLL", 0o7100, Opr),
    ("STL", 0o7120, Opr),
    ("CLA", 0o7200, Opr),
    ("GLK", 0o7204, Opr),
    ("STA", 0o7240, Opr),
    // Group 2.
    ("HLT", 0o7402, Opr),
    ("OSR", 0o7404, Opr),
    ("SKP", 0o7410, Opr),
    ("SNL", 0o7420, Opr),
    ("SZL", 0o7430, Opr),
    ("SZA", 0o7440, Opr),
    ("SNA", 0o7450, Opr),
    ("SMA", 0o7500, Opr),
    ("SPA", 0o7510, Opr),
    ("LAS", 0o7604, Opr),
    // Group 3 (MQ).
    ("MQL", 0o7421, Opr),
    ("MQA", 0o7501, Opr),
    ("SWP", 0o7521, Opr),
    ("CAM", 0o7621, Opr),
    ("ACL", 0o7701, Opr),
    // Memory extension.
    ("CDF", 0o6201, Cxf),
    ("CIF", 0o6202, Cxf),
    ("CXF", 0o6203, Cxf),
    ("RDF", 0o6214, Iot),
    ("RIF", 0o6224, Iot),
    ("RIB", 0o6234, Iot),
    ("RMF", 0o6244, Iot),
    // Interrupt system.
    ("SKON", 0o6000, Iot),
    ("ION", 0o6001, Iot),
    ("IOF", 0o6002, Iot),
    ("SRQ", 0o6003, Iot),
    ("GTF", 0o6004, Iot),
    ("RTF", 0o6005, Iot),
    ("SGT", 0o6006, Iot),
    ("CAF", 0o6007, Iot),
];

const HM6120_INSTRUCTIONS: &[TableRow] = &[
    ("R3L", 0o7014, Opr),
    ("WSR", 0o6246, Iot),
    ("GCF", 0o6256, Iot),
    // Panel requests.
    ("PR0", 0o6206, Iot),
    ("PR1", 0o6216, Iot),
    ("PR2", 0o6226, Iot),
    ("PR3", 0o6236, Iot),
    ("PRS", 0o6000, Iot),
    ("PGO", 0o6003, Iot),
    ("PEX", 0o6004, Iot),
    ("CPD", 0o6266, Iot),
    ("SPD", 0o6276, Iot),
    // Stack operations.
    ("PPC1", 0o6205, Iot),
    ("PPC2", 0o6245, Iot),
    ("PAC1", 0o6215, Iot),
    ("PAC2", 0o6255, Iot),
    ("RTN1", 0o6225, Iot),
    ("RTN2", 0o6265, Iot),
    ("POP1", 0o6235, Iot),
    ("POP2", 0o6275, Iot),
    ("RSP1", 0o6207, Iot),
    ("RSP2", 0o6227, Iot),
    ("LSP1", 0o6217, Iot),
    ("LSP2", 0o6237, Iot),
];

const IM6100_INSTRUCTIONS: &[TableRow] = &[
    // IM6101 PIE.
    ("READ1", 0o6000, Pie),
    ("READ2", 0o6010, Pie),
    ("WRITE1", 0o6001, Pie),
    ("WRITE2", 0o6011, Pie),
    ("SKIP1", 0o6002, Pie),
    ("SKIP2", 0o6003, Pie),
    ("SKIP3", 0o6012, Pie),
    ("SKIP4", 0o6013, Pie),
    ("RCRA", 0o6004, Pie),
    ("WCRA", 0o6005, Pie),
    ("WCRB", 0o6015, Pie),
    ("WVR", 0o6014, Pie),
    ("SFLAG1", 0o6006, Pie),
    ("SFLAG3", 0o6016, Pie),
    ("CFLAG1", 0o6007, Pie),
    ("CFLAG3", 0o6017, Pie),
    // IM6103 PIO.
    ("SETPA", 0o6300, Pio),
    ("CLRPA", 0o6301, Pio),
    ("WPA", 0o6302, Pio),
    ("RPA", 0o6303, Pio),
    ("SETPB", 0o6304, Pio),
    ("CLRPB", 0o6305, Pio),
    ("WPB", 0o6306, Pio),
    ("RPB", 0o6307, Pio),
    ("SETPC", 0o6310, Pio),
    ("CLRPC", 0o6311, Pio),
    ("WPC", 0o6312, Pio),
    ("RPC", 0o6313, Pio),
    ("SKPOR", 0o6314, Pio),
    ("SKPIR", 0o6315, Pio),
    ("WSR", 0o6316, Pio),
    ("RSR", 0o6317, Pio),
    // IM6102 MEDIC.
    ("LIF", 0o6254, Iot),
    ("CLZE", 0o6130, Iot),
    ("CLSK", 0o6131, Iot),
    ("CLOE", 0o6132, Iot),
    ("CLAB", 0o6133, Iot),
    ("CLEN", 0o6134, Iot),
    ("CLSA", 0o6135, Iot),
    ("CLBA", 0o6136, Iot),
    ("CLCA", 0o6137, Iot),
    ("LCAR", 0o6205, Iot),
    ("RCAR", 0o6215, Iot),
    ("LWCR", 0o6225, Iot),
    ("REAR", 0o6235, Iot),
    ("LFSR", 0o6245, Iot),
    ("RFSR", 0o6255, Iot),
    ("WRVR", 0o6275, Iot),
    ("SKOF", 0o6265, Iot),
    ("LEAR", 0o6206, Cxf),
];

/// A named set of mnemonics layered over the base instruction set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    name: String,
    entries: HashMap<String, OpcodeEntry>,
}

impl Overlay {
    pub fn new(name: &str) -> Overlay {
        Overlay {
            name: name.to_string(),
            entries: HashMap::new(),
        }
    }

    fn from_table(name: &str, rows: &[TableRow]) -> Overlay {
        let mut overlay = Overlay::new(name);
        for (mnemonic, bits, class) in rows {
            overlay.insert(
                mnemonic,
                OpcodeEntry::new(Unsigned12Bit::truncating(*bits), *class),
            );
        }
        overlay
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a mnemonic, returning the entry it replaced (if any).
    /// Mnemonics are stored in upper case.
    pub fn insert(&mut self, mnemonic: &str, entry: OpcodeEntry) -> Option<OpcodeEntry> {
        self.entries.insert(mnemonic.to_ascii_uppercase(), entry)
    }

    pub fn get(&self, mnemonic: &str) -> Option<&OpcodeEntry> {
        self.entries.get(mnemonic)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mnemonic lookup for one processor.
#[derive(Debug, Clone)]
pub struct InstructionTable {
    base: Overlay,
    overlays: Vec<Overlay>,
}

impl Default for InstructionTable {
    fn default() -> InstructionTable {
        InstructionTable::pdp8()
    }
}

impl InstructionTable {
    /// The plain PDP-8 instruction set.
    pub fn pdp8() -> InstructionTable {
        InstructionTable {
            base: Overlay::from_table("PDP-8", BASE_INSTRUCTIONS),
            overlays: Vec::new(),
        }
    }

    pub fn for_cpu(cpu: CpuVariant) -> InstructionTable {
        let table = InstructionTable::pdp8();
        match cpu.overlay() {
            Some(overlay) => table.with_overlay(overlay),
            None => table,
        }
    }

    #[must_use]
    pub fn with_overlay(mut self, overlay: Overlay) -> InstructionTable {
        self.push_overlay(overlay);
        self
    }

    pub fn push_overlay(&mut self, overlay: Overlay) {
        self.overlays.push(overlay);
    }

    pub fn overlay_names(&self) -> impl Iterator<Item = &str> {
        self.overlays.iter().map(Overlay::name)
    }

    /// Look up an upper-case mnemonic.  The most recently added
    /// overlay is searched first and the base table last.
    pub fn lookup(&self, mnemonic: &str) -> Option<OpcodeEntry> {
        self.overlays
            .iter()
            .rev()
            .chain(std::iter::once(&self.base))
            .find_map(|overlay| overlay.get(mnemonic))
            .copied()
    }

    pub fn is_mnemonic(&self, name: &str) -> bool {
        self.lookup(&name.to_ascii_uppercase()).is_some()
    }
}

/// The micro-instruction group of an OPR word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OprGroup {
    /// NOP and CLA, which are valid in every group.
    Common,
    One,
    Two,
    Three,
}

impl Display for OprGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            OprGroup::Common => f.write_str("common"),
            OprGroup::One => f.write_str("group 1"),
            OprGroup::Two => f.write_str("group 2"),
            OprGroup::Three => f.write_str("group 3"),
        }
    }
}

pub fn opr_group(bits: Unsigned12Bit) -> OprGroup {
    let b = u16::from(bits);
    if b == 0o7000 || b == 0o7200 {
        OprGroup::Common
    } else if b & 0o400 == 0 {
        OprGroup::One
    } else if b & 0o001 == 0 {
        OprGroup::Two
    } else {
        OprGroup::Three
    }
}

/// For a group 2 word containing skip conditions, whether the
/// conditions are reversed (bit 0010, as in SNA or SPA).  Words with
/// no skip condition have no sense.
pub fn skip_sense(bits: Unsigned12Bit) -> Option<bool> {
    let b = u16::from(bits);
    if b & 0o170 == 0 {
        None
    } else {
        Some(b & 0o010 != 0)
    }
}

/// The rotate bits of a group 1 word (zero if there is no rotate).
pub fn rotate_bits(bits: Unsigned12Bit) -> u16 {
    u16::from(bits) & 0o016
}
