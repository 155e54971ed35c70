//! Encoding of instruction words.
use std::fmt::{self, Display, Formatter};

use base::prelude::{
    mri_word, opr_group, rotate_bits, skip_sense, Address, OprGroup, PageOffset, Unsigned12Bit,
};

/// Encode a memory reference to `target` from an instruction at `pc`.
/// When `target` is on neither page zero nor the current page, the
/// error carries the current-page encoding with the same offset,
/// which is the best we can do.
pub(crate) fn direct_reference(
    opcode: Unsigned12Bit,
    indirect: bool,
    pc: Address,
    target: Address,
) -> Result<Unsigned12Bit, Unsigned12Bit> {
    if target.is_page_zero() {
        Ok(mri_word(opcode, indirect, false, target.offset()))
    } else if target.same_page(pc) {
        Ok(mri_word(opcode, indirect, true, target.offset()))
    } else {
        Err(mri_word(opcode, indirect, true, target.offset()))
    }
}

/// A reference through a pool word at `slot`, which is on the current
/// page.
pub(crate) fn pool_reference(opcode: Unsigned12Bit, slot: Address) -> Unsigned12Bit {
    mri_word(opcode, true, !slot.is_page_zero(), slot.offset())
}

/// A reference to a literal word at `slot`.  The literal itself is
/// the operand, so the reference is direct unless `indirect` is set.
pub(crate) fn literal_reference(opcode: Unsigned12Bit, indirect: bool, slot: Address) -> Unsigned12Bit {
    mri_word(opcode, indirect, !slot.is_page_zero(), slot.offset())
}

/// The best we can do with a literal for which there is no room: use
/// its low bits as a current-page offset.
pub(crate) fn literal_fallback(opcode: Unsigned12Bit, indirect: bool, value: Unsigned12Bit) -> Unsigned12Bit {
    mri_word(
        opcode,
        indirect,
        true,
        PageOffset::truncating((u16::from(value) & 0o177) as u8),
    )
}

/// Encode a field-change instruction such as `CDF 1`.
pub(crate) fn field_instruction(bits: Unsigned12Bit, field: u8) -> Unsigned12Bit {
    Unsigned12Bit::truncating(u16::from(bits) | (u16::from(field & 0o7) << 3))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OprConflict {
    Groups(OprGroup, OprGroup),
    SkipSense,
    Rotates,
}

impl Display for OprConflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OprConflict::Groups(existing, new) => {
                write!(f, "cannot combine {new} and {existing} operate instructions")
            }
            OprConflict::SkipSense => {
                f.write_str("cannot combine skips on a condition with skips on its reverse")
            }
            OprConflict::Rotates => f.write_str("cannot combine two different rotates"),
        }
    }
}

/// Combines the operate micro-instructions on a line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OprCombiner {
    bits: Unsigned12Bit,
    group: Option<OprGroup>,
    sense: Option<bool>,
    rotate: u16,
}

impl OprCombiner {
    pub(crate) fn new() -> OprCombiner {
        OprCombiner {
            bits: Unsigned12Bit::ZERO,
            group: None,
            sense: None,
            rotate: 0,
        }
    }

    /// Add a micro-instruction.  If it conflicts with what we have so
    /// far, nothing is changed.
    pub(crate) fn add(&mut self, bits: Unsigned12Bit) -> Result<(), OprConflict> {
        let group = opr_group(bits);
        if group != OprGroup::Common {
            if let Some(existing) = self.group {
                if existing != group {
                    return Err(OprConflict::Groups(existing, group));
                }
            }
        }
        let sense = match group {
            OprGroup::Two => skip_sense(bits),
            _ => None,
        };
        if let (Some(existing), Some(new)) = (self.sense, sense) {
            if existing != new {
                return Err(OprConflict::SkipSense);
            }
        }
        let rotate = match group {
            OprGroup::One => rotate_bits(bits),
            _ => 0,
        };
        if rotate != 0 && self.rotate != 0 && rotate != self.rotate {
            return Err(OprConflict::Rotates);
        }

        self.bits = self.bits | bits;
        if group != OprGroup::Common {
            self.group = Some(group);
        }
        self.sense = self.sense.or(sense);
        if rotate != 0 {
            self.rotate = rotate;
        }
        Ok(())
    }

    pub(crate) fn bits(&self) -> Unsigned12Bit {
        self.bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(n: u16) -> Unsigned12Bit {
        Unsigned12Bit::truncating(n)
    }

    fn a(n: u16) -> Address {
        Address::try_from(n).expect("valid address")
    }

    fn combine(words: &[u16]) -> Result<u16, OprConflict> {
        let mut c = OprCombiner::new();
        for word in words {
            c.add(w(*word))?;
        }
        Ok(u16::from(c.bits()))
    }

    #[test]
    fn direct_references() {
        let tad = w(0o1000);
        assert_eq!(direct_reference(tad, false, a(0o200), a(0o20)), Ok(w(0o1020)));
        assert_eq!(direct_reference(tad, false, a(0o200), a(0o277)), Ok(w(0o1277)));
        assert_eq!(direct_reference(tad, true, a(0o200), a(0o277)), Ok(w(0o1677)));
        assert_eq!(direct_reference(tad, false, a(0o200), a(0o410)), Err(w(0o1210)));
        // On page zero, page zero is also the current page.
        assert_eq!(direct_reference(tad, false, a(0o10), a(0o20)), Ok(w(0o1020)));
    }

    #[test]
    fn pool_references() {
        let jms = w(0o4000);
        assert_eq!(pool_reference(jms, a(0o377)), w(0o4777));
        assert_eq!(literal_reference(w(0o1000), false, a(0o377)), w(0o1377));
        assert_eq!(literal_reference(w(0o1000), true, a(0o377)), w(0o1777));
        assert_eq!(literal_fallback(w(0o1000), false, w(0o4321)), w(0o1321));
    }

    #[test]
    fn field_instructions() {
        assert_eq!(field_instruction(w(0o6201), 1), w(0o6211));
        assert_eq!(field_instruction(w(0o6203), 7), w(0o6273));
        assert_eq!(field_instruction(w(0o6202), 0o11), w(0o6212));
    }

    #[test]
    fn opr_combinations() {
        assert_eq!(combine(&[0o7200, 0o7100, 0o7001]), Ok(0o7301));
        assert_eq!(combine(&[0o7200, 0o7440]), Ok(0o7640));
        assert_eq!(combine(&[0o7440, 0o7420]), Ok(0o7460));
        assert_eq!(combine(&[0o7200, 0o7621]), Ok(0o7621));
        assert_eq!(combine(&[0o7000, 0o7402]), Ok(0o7402));
        assert_eq!(combine(&[0o7204, 0o7004]), Ok(0o7204));
    }

    #[test]
    fn opr_conflicts() {
        assert_eq!(
            combine(&[0o7001, 0o7440]),
            Err(OprConflict::Groups(OprGroup::One, OprGroup::Two))
        );
        assert_eq!(combine(&[0o7500, 0o7510]), Err(OprConflict::SkipSense));
        assert_eq!(combine(&[0o7410, 0o7440]), Err(OprConflict::SkipSense));
        assert_eq!(combine(&[0o7004, 0o7010]), Err(OprConflict::Rotates));
        assert_eq!(
            combine(&[0o7421, 0o7440]),
            Err(OprConflict::Groups(OprGroup::Three, OprGroup::Two))
        );
    }

    #[test]
    fn conflicting_bits_are_dropped() {
        let mut c = OprCombiner::new();
        assert_eq!(c.add(w(0o7500)), Ok(()));
        assert_eq!(c.add(w(0o7510)), Err(OprConflict::SkipSense));
        assert_eq!(c.bits(), w(0o7500));
    }
}
