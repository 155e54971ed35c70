//! The `base` crate defines the PDP-8 related things which are useful
//! to more than one tool: fixed-width words, addresses, the
//! instruction tables and the character sets.  An assembler depends
//! on this crate, and so could a disassembler or a simulator.

mod error;
mod types;
mod unsigned;

pub mod charset;
pub mod instruction;
pub mod prelude;
pub mod subword;

#[macro_export]
macro_rules! u12 {
    ($n:expr) => {
        $crate::prelude::Unsigned12Bit::new::<{ $n }>()
    };
}

#[macro_export]
macro_rules! u6 {
    ($n:expr) => {
        $crate::prelude::Unsigned6Bit::new::<{ $n }>()
    };
}

#[macro_export]
macro_rules! u3 {
    ($n:expr) => {
        $crate::prelude::Unsigned3Bit::new::<{ $n }>()
    };
}

#[test]
fn test_u12() {
    use prelude::Unsigned12Bit;
    let m: Unsigned12Bit = u12!(0o7402);
    let n: Unsigned12Bit = Unsigned12Bit::try_from(0o7402_u16).expect("test data should be in range");
    assert_eq!(m, n);
}

#[test]
fn test_u6() {
    use prelude::Unsigned6Bit;
    let p: Unsigned6Bit = u6!(0o77);
    assert_eq!(p, Unsigned6Bit::MAX);
}

#[test]
fn test_u3() {
    use prelude::Unsigned3Bit;
    assert_eq!(u3!(7), Unsigned3Bit::MAX);
}
