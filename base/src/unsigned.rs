//! Fixed-width unsigned types used to describe PDP-8 words and the
//! fields packed inside them.  The PDP-8 is a two's complement
//! machine, so the unsigned representation is the natural one; a
//! negative quantity is just a word with the top bit set.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter, Octal};
use std::hash::{Hash, Hasher};

use super::error::ConversionFailed;

#[cfg(test)]
mod tests;

/// This macro implements conversions from native types to Unsigned*Bit
/// which are always possible (e.g. From<u8> for Unsigned12Bit).
macro_rules! from_native_type_to_self {
    ($SelfT:ty, $($from:ty)*) => {
        $(
            impl From<$from> for $SelfT {
                fn from(n: $from) -> Self {
                    Self {
                        bits: n.into(),
                    }
                }
            }
        )*
    }
}

/// This macro implements conversions from Unsigned*Bit to native
/// types which are always possible (e.g. From<Unsigned12Bit> for u16).
macro_rules! from_self_to_native_type {
    ($SelfT:ty, $($to:ty)*) => {
        $(
            impl From<$SelfT> for $to {
                fn from(n: $SelfT) -> $to {
                    // The range of n.bits is narrower than the range
                    // of its storage type, so this cast cannot lose
                    // information even where `.into()` is unavailable
                    // (e.g. u8 to i8 for a 7-bit value).
                    n.bits as $to
                }
            }
        )*
    }
}

/// This macro implements conversions from Unsigned*Bit to native
/// types where the conversion may not always fit.  For example
/// TryFrom<Unsigned12Bit> for u8.
macro_rules! try_from_self_to_native_type {
    ($SelfT:ty, $($to:ty)*) => {
        $(
            impl TryFrom<$SelfT> for $to {
                type Error = ConversionFailed;
                fn try_from(n: $SelfT) -> Result<$to, ConversionFailed> {
                    <$to>::try_from(n.bits).map_err(|_| ConversionFailed::TooLarge)
                }
            }
        )*
    }
}

/// This macro implements a conversions from native types to
/// Unsigned*Bit where the conversion may not always fit.  For example
/// TryFrom<u32> for Unsigned12Bit.
macro_rules! try_from_native_type_to_self {
    ($SelfT:ty, $InnerT:ty, $($from:ty)*) => {
        $(
            impl TryFrom<$from> for $SelfT {
                type Error = ConversionFailed;
                fn try_from(n: $from) -> Result<Self, ConversionFailed> {
                    let bits: $InnerT = match n.try_into() {
                        Err(_) => {
                            // Because $InnerT is unsigned, n < 0 is
                            // always an error case.  For conversions
                            // from unsigned types this comparison is
                            // useless and gets optimised away.
                            #[allow(unused_comparisons)]
                            if n < 0 {
                                return Err(ConversionFailed::TooSmall);
                            } else {
                                return Err(ConversionFailed::TooLarge);
                            }
                        }
                        Ok(value) if value > Self::VALUE_BITS => {
                            return Err(ConversionFailed::TooLarge);
                        }
                        Ok(value) => value,
                    };
                    Ok(Self { bits })
                }
            }
        )*
    }
}

/// This macro implements the base functionality of the unsigned
/// types.  `SelfT` is the type we are defining, `BITS` its width and
/// `InnerT` the native type which stores those bits.
macro_rules! unsigned_word_impl {
    ($SelfT:ty, $BITS:expr, $InnerT:ty) => {
        impl $SelfT {
            const MODULUS: $InnerT = (1 << $BITS);
            const VALUE_BITS: $InnerT = Self::MODULUS - 1;

            pub const BITS: u32 = $BITS;

            pub const MAX: Self = Self {
                bits: Self::MODULUS - 1,
            };

            pub const ZERO: Self = Self { bits: 0 };
            pub const ONE: Self = Self { bits: 1 };
            pub const MIN: Self = Self::ZERO;

            // Out-of-range inputs fail at compile time.  It's pub so
            // that it can be used in u12!() and similar.
            pub const fn new<const N: $InnerT>() -> $SelfT {
                type Word = $SelfT;
                struct Helper<const M: $InnerT>;
                impl<const M: $InnerT> Helper<M> {
                    const U: Word = {
                        if M > Word::MAX.bits {
                            panic!("input value is out of range")
                        } else {
                            Word {
                                bits: Word::MAX.bits & M,
                            }
                        }
                    };
                }
                Helper::<N>::U
            }

            /// Keep only the low-order bits of `n` which fit.
            pub const fn truncating(n: $InnerT) -> $SelfT {
                Self {
                    bits: n & Self::VALUE_BITS,
                }
            }

            pub const fn is_zero(&self) -> bool {
                self.bits == 0
            }

            pub fn wrapping_add(self, rhs: $SelfT) -> $SelfT {
                Self {
                    bits: self.bits.wrapping_add(rhs.bits) & Self::VALUE_BITS,
                }
            }

            pub fn wrapping_sub(self, rhs: $SelfT) -> $SelfT {
                Self {
                    bits: (self.bits + Self::MODULUS).wrapping_sub(rhs.bits) & Self::VALUE_BITS,
                }
            }

            pub fn checked_add(self, rhs: $SelfT) -> Option<$SelfT> {
                match self.bits.checked_add(rhs.bits) {
                    Some(result) if result <= Self::VALUE_BITS => Some(Self { bits: result }),
                    _ => None,
                }
            }

            pub fn checked_sub(self, rhs: $SelfT) -> Option<$SelfT> {
                self.bits
                    .checked_sub(rhs.bits)
                    .map(|bits| Self { bits })
            }

            // We cannot call std::ops::BitAnd in a const because trait
            // methods cannot be const.  So we have this work-alike in
            // impl, since it can be called in a const context.
            pub const fn and(self, mask: $InnerT) -> Self {
                Self {
                    bits: self.bits & mask,
                }
            }

            // Likewise for std::ops::BitOr.
            pub const fn bitor(self, mask: $InnerT) -> Self {
                Self {
                    bits: (self.bits | mask) & Self::VALUE_BITS,
                }
            }
        }

        impl Default for $SelfT {
            fn default() -> Self {
                Self { bits: 0 }
            }
        }

        impl Display for $SelfT {
            fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
                Octal::fmt(&self.bits, f)
            }
        }

        impl Octal for $SelfT {
            fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
                Octal::fmt(&self.bits, f)
            }
        }

        impl Debug for $SelfT {
            fn fmt(&self, f: &mut Formatter) -> fmt::Result {
                write!(f, concat!(stringify!($SelfT), "{{bits: {:#o}}}"), self.bits)
            }
        }

        impl Hash for $SelfT {
            fn hash<H>(&self, state: &mut H)
            where
                H: Hasher,
            {
                self.bits.hash(state)
            }
        }

        impl<T> PartialEq<T> for $SelfT
        where
            T: TryInto<$SelfT> + Copy,
        {
            fn eq(&self, other: &T) -> bool {
                let converted: Result<$SelfT, _> = (*other).try_into();
                match converted {
                    Ok(rhs) => self.bits == rhs.bits,
                    Err(_) => false,
                }
            }
        }

        impl Eq for $SelfT {}

        impl PartialOrd<$SelfT> for $SelfT {
            fn partial_cmp(&self, other: &$SelfT) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $SelfT {
            fn cmp(&self, other: &$SelfT) -> Ordering {
                self.bits.cmp(&other.bits)
            }
        }

        impl std::ops::Not for $SelfT {
            type Output = Self;
            fn not(self) -> Self {
                Self {
                    bits: (!self.bits) & Self::VALUE_BITS,
                }
            }
        }

        impl std::ops::BitAnd<$InnerT> for $SelfT {
            type Output = Self;
            fn bitand(self, mask: $InnerT) -> Self {
                Self {
                    bits: self.bits & mask,
                }
            }
        }

        impl std::ops::BitAnd<$SelfT> for $SelfT {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                self.bitand(rhs.bits)
            }
        }

        impl std::ops::BitOr<$InnerT> for $SelfT {
            type Output = Self;
            fn bitor(self, mask: $InnerT) -> Self {
                Self {
                    bits: (self.bits | mask) & Self::VALUE_BITS,
                }
            }
        }

        impl std::ops::BitOr for $SelfT {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                self.bitor(rhs.bits)
            }
        }

        impl std::ops::BitXor for $SelfT {
            type Output = Self;
            fn bitxor(self, rhs: Self) -> Self {
                Self {
                    bits: self.bits ^ rhs.bits,
                }
            }
        }
    };
}

/// `Unsigned3Bit` is a memory field number (0 to 7).
#[derive(Clone, Copy)]
pub struct Unsigned3Bit {
    pub(crate) bits: u8,
}

/// `Unsigned5Bit` is a page number within a field (0 to 037).
#[derive(Clone, Copy)]
pub struct Unsigned5Bit {
    pub(crate) bits: u8,
}

/// `Unsigned6Bit` is half of a machine word.  It holds a SIXBIT
/// character and is also the payload of one paper tape frame.
#[derive(Clone, Copy)]
pub struct Unsigned6Bit {
    pub(crate) bits: u8,
}

/// `Unsigned7Bit` is the offset of a word within its page, which is
/// also the width of the address field of a memory reference
/// instruction.
#[derive(Clone, Copy)]
pub struct Unsigned7Bit {
    pub(crate) bits: u8,
}

/// `Unsigned12Bit` is the PDP-8 machine word.  Instructions, data and
/// addresses within a field are all 12 bits wide.
#[derive(Clone, Copy)]
pub struct Unsigned12Bit {
    pub(crate) bits: u16,
}

unsigned_word_impl!(Unsigned3Bit, 3, u8);
unsigned_word_impl!(Unsigned5Bit, 5, u8);
unsigned_word_impl!(Unsigned6Bit, 6, u8);
unsigned_word_impl!(Unsigned7Bit, 7, u8);
unsigned_word_impl!(Unsigned12Bit, 12, u16);

////////////////////////////////////////////////////////////////////////
// Unsigned3Bit, Unsigned5Bit, Unsigned6Bit, Unsigned7Bit
////////////////////////////////////////////////////////////////////////

from_self_to_native_type!(Unsigned3Bit, u8 i8 u16 i16 u32 i32 u64 i64 usize isize);
try_from_native_type_to_self!(Unsigned3Bit, u8, i8 u8 u16 i16 u32 i32 u64 i64 usize isize);

from_self_to_native_type!(Unsigned5Bit, u8 i8 u16 i16 u32 i32 u64 i64 usize isize);
try_from_native_type_to_self!(Unsigned5Bit, u8, i8 u8 u16 i16 u32 i32 u64 i64 usize isize);

from_self_to_native_type!(Unsigned6Bit, u8 i8 u16 i16 u32 i32 u64 i64 usize isize);
try_from_native_type_to_self!(Unsigned6Bit, u8, i8 u8 u16 i16 u32 i32 u64 i64 usize isize);

from_self_to_native_type!(Unsigned7Bit, u8 i8 u16 i16 u32 i32 u64 i64 usize isize);
try_from_native_type_to_self!(Unsigned7Bit, u8, i8 u8 u16 i16 u32 i32 u64 i64 usize isize);

////////////////////////////////////////////////////////////////////////
// Unsigned12Bit
////////////////////////////////////////////////////////////////////////

// all the things that always fit into Unsigned12Bit
from_native_type_to_self!(Unsigned12Bit, u8);
// all the things that Unsigned12Bit always fits into
from_self_to_native_type!(Unsigned12Bit, u16 i16 u32 i32 u64 i64 usize isize);
// all the things that Unsigned12Bit may not fit into
try_from_self_to_native_type!(Unsigned12Bit, u8 i8);
// all the things that may not fit into Unsigned12Bit
try_from_native_type_to_self!(Unsigned12Bit, u16, i8 u16 i16 u32 i32 u64 i64 usize isize);

macro_rules! widen_to_word {
    ($($from:ty)*) => {
        $(
            impl From<$from> for Unsigned12Bit {
                fn from(n: $from) -> Self {
                    Self {
                        bits: n.bits.into(),
                    }
                }
            }
        )*
    }
}

widen_to_word!(Unsigned3Bit Unsigned5Bit Unsigned6Bit Unsigned7Bit);

impl Unsigned12Bit {
    /// The sign bit, in the two's complement reading of a word.
    pub const SIGN_BIT: u16 = 0o4000;

    /// Interpret the word as a two's complement quantity.
    pub const fn as_signed(&self) -> i16 {
        if self.bits & Self::SIGN_BIT != 0 {
            (self.bits as i16) - (Self::MODULUS as i16)
        } else {
            self.bits as i16
        }
    }

    /// The two's complement negation of the word (the effect of the
    /// `CIA` instruction).
    #[must_use]
    pub fn negate(self) -> Self {
        (!self).wrapping_add(Self::ONE)
    }
}
