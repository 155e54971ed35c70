//! The pseudo-ops (assembler directives).  The set is closed, so
//! they are an enum and the engine dispatches on them with a single
//! `match`.
use std::fmt::{self, Display, Formatter};

use super::predicates::CountPredicate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum PseudoOp {
    Org,
    Data,
    Asciz,
    Text,
    Block,
    Sixbit,
    Opdef,
    Page,
    Field,
    Vector,
    Stack,
    Push,
    Pop,
    PushJ,
    PopJ,
    Title,
    NoWarn,
    Im6100,
    Hm6120,
    End,
}

impl PseudoOp {
    pub(crate) const ALL: [PseudoOp; 20] = [
        PseudoOp::Org,
        PseudoOp::Data,
        PseudoOp::Asciz,
        PseudoOp::Text,
        PseudoOp::Block,
        PseudoOp::Sixbit,
        PseudoOp::Opdef,
        PseudoOp::Page,
        PseudoOp::Field,
        PseudoOp::Vector,
        PseudoOp::Stack,
        PseudoOp::Push,
        PseudoOp::Pop,
        PseudoOp::PushJ,
        PseudoOp::PopJ,
        PseudoOp::Title,
        PseudoOp::NoWarn,
        PseudoOp::Im6100,
        PseudoOp::Hm6120,
        PseudoOp::End,
    ];

    pub(crate) fn name(&self) -> &'static str {
        match self {
            PseudoOp::Org => ".ORG",
            PseudoOp::Data => ".DATA",
            PseudoOp::Asciz => ".ASCIZ",
            PseudoOp::Text => ".TEXT",
            PseudoOp::Block => ".BLOCK",
            PseudoOp::Sixbit => ".SIXBIT",
            PseudoOp::Opdef => ".OPDEF",
            PseudoOp::Page => ".PAGE",
            PseudoOp::Field => ".FIELD",
            PseudoOp::Vector => ".VECTOR",
            PseudoOp::Stack => ".STACK",
            PseudoOp::Push => ".PUSH",
            PseudoOp::Pop => ".POP",
            PseudoOp::PushJ => ".PUSHJ",
            PseudoOp::PopJ => ".POPJ",
            PseudoOp::Title => ".TITLE",
            PseudoOp::NoWarn => ".NOWARN",
            PseudoOp::Im6100 => ".IM6100",
            PseudoOp::Hm6120 => ".HM6120",
            PseudoOp::End => ".END",
        }
    }

    /// Look up a directive name (in any case, including the leading
    /// `.`).
    pub(crate) fn from_name(name: &str) -> Option<PseudoOp> {
        PseudoOp::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(name))
    }

    /// How many parameters the pseudo-op takes.
    pub(crate) fn param_check(&self) -> CountPredicate {
        match self {
            PseudoOp::End | PseudoOp::Pop | PseudoOp::PopJ | PseudoOp::Im6100 | PseudoOp::Hm6120 => {
                CountPredicate::None
            }
            PseudoOp::Org
            | PseudoOp::Asciz
            | PseudoOp::Text
            | PseudoOp::Sixbit
            | PseudoOp::Opdef
            | PseudoOp::Field
            | PseudoOp::Vector
            | PseudoOp::Push
            | PseudoOp::PushJ => CountPredicate::Exactly(1),
            PseudoOp::Stack => CountPredicate::Exactly(4),
            PseudoOp::Block | PseudoOp::NoWarn => CountPredicate::AtLeast(1),
            PseudoOp::Page => CountPredicate::AtMost(1),
            PseudoOp::Data | PseudoOp::Title => CountPredicate::Any,
        }
    }
}

impl Display for PseudoOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[test]
fn test_pseudo_op_names() {
    for op in PseudoOp::ALL {
        assert_eq!(PseudoOp::from_name(op.name()), Some(op));
    }
    assert_eq!(PseudoOp::from_name(".pushj"), Some(PseudoOp::PushJ));
    assert_eq!(PseudoOp::from_name("ORG"), None);
    assert_eq!(PseudoOp::from_name(".LOOP"), None);
}

#[test]
fn test_param_checks() {
    assert_eq!(PseudoOp::Stack.param_check(), CountPredicate::Exactly(4));
    assert_eq!(PseudoOp::Page.param_check(), CountPredicate::AtMost(1));
    assert_eq!(PseudoOp::Data.param_check(), CountPredicate::Any);
    assert_eq!(PseudoOp::End.param_check(), CountPredicate::None);
}
