//! Addresses.  A PDP-8 address is a 12-bit word offset within a
//! 4096-word memory field.  Memory reference instructions can only
//! name seven bits of that, so memory is further divided into 32
//! pages of 128 words each.
//!
//! ```text
//!  11 10  9  8  7 | 6  5  4  3  2  1  0
//! |  page number  |   offset in page    |
//! ```
//!
//! Machines with memory extension (and the IM6100/HM6120 with their
//! external memory controllers) have up to eight fields, selected by
//! the CDF/CIF instructions.
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter, Octal};

use super::error::ConversionFailed;
use super::unsigned::{Unsigned12Bit, Unsigned3Bit, Unsigned5Bit, Unsigned7Bit};

/// Number of words in a page.
pub const PAGE_SIZE: u16 = 0o200;

/// Number of pages in a field.
pub const PAGES_PER_FIELD: u16 = 0o40;

/// Bits of an address which select the word within its page.
pub const PAGE_OFFSET_MASK: u16 = 0o177;

/// A memory field number.
pub type Field = Unsigned3Bit;

/// A page number within a field.
pub type Page = Unsigned5Bit;

/// The offset of a word within its page.
pub type PageOffset = Unsigned7Bit;

/// A word address within a field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(Unsigned12Bit);

impl Address {
    pub const ZERO: Address = Address(Unsigned12Bit::ZERO);
    pub const MAX: Address = Address(Unsigned12Bit::MAX);

    pub const fn new(a: Unsigned12Bit) -> Address {
        Address(a)
    }

    /// Form the address of word `offset` in page `page`.
    pub fn from_page_and_offset(page: Page, offset: PageOffset) -> Address {
        let page_bits: u16 = u16::from(page) * PAGE_SIZE;
        Address(Unsigned12Bit::truncating(page_bits | u16::from(offset)))
    }

    pub fn page(&self) -> Page {
        Page::truncating(u8::try_from(u16::from(self.0) / PAGE_SIZE).unwrap_or(u8::MAX))
    }

    pub fn offset(&self) -> PageOffset {
        PageOffset::truncating(u8::try_from(u16::from(self.0) & PAGE_OFFSET_MASK).unwrap_or(0))
    }

    /// True for the first word of a page.
    pub fn is_page_start(&self) -> bool {
        self.offset().is_zero()
    }

    /// Is this address on page zero (which every memory reference
    /// instruction can reach, whatever page it is on)?
    pub fn is_page_zero(&self) -> bool {
        self.page().is_zero()
    }

    /// Are the two addresses on the same page?
    pub fn same_page(&self, other: Address) -> bool {
        self.page() == other.page()
    }

    /// The start of the page containing this address.
    #[must_use]
    pub fn page_start(&self) -> Address {
        Address::from_page_and_offset(self.page(), PageOffset::ZERO)
    }

    /// Computes the address following the current address.  Used to
    /// increment the location counter; like the PDP-8 program
    /// counter, this wraps from 7777 to 0 within the same field.
    #[must_use]
    pub fn successor(&self) -> Address {
        self.index_by(1)
    }

    /// Address arithmetic, wrapping within the field.
    #[must_use]
    pub fn index_by(&self, delta: u16) -> Address {
        Address(self.0.wrapping_add(Unsigned12Bit::truncating(delta)))
    }

    pub fn bits(&self) -> Unsigned12Bit {
        self.0
    }
}

impl From<Unsigned12Bit> for Address {
    fn from(a: Unsigned12Bit) -> Address {
        Address(a)
    }
}

impl From<Address> for Unsigned12Bit {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl From<Address> for u16 {
    fn from(a: Address) -> u16 {
        u16::from(a.0)
    }
}

impl TryFrom<u16> for Address {
    type Error = ConversionFailed;
    fn try_from(n: u16) -> Result<Address, ConversionFailed> {
        Ok(Address(Unsigned12Bit::try_from(n)?))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        // Always display as octal.
        write!(f, "{:>04o}", self.0)
    }
}

impl Octal for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        Octal::fmt(&self.0, f)
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Address({:>04o})", self.0)
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A field together with an address inside it; this identifies a
/// word anywhere in the (up to 32K-word) extended memory.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ExtendedAddress {
    pub field: Field,
    pub address: Address,
}

impl ExtendedAddress {
    pub fn new(field: Field, address: Address) -> ExtendedAddress {
        ExtendedAddress { field, address }
    }

    /// The location after this one.  Wraps within the field.
    #[must_use]
    pub fn successor(&self) -> ExtendedAddress {
        ExtendedAddress {
            field: self.field,
            address: self.address.successor(),
        }
    }
}

impl Display for ExtendedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}{}", self.field, self.address)
    }
}

impl Debug for ExtendedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "ExtendedAddress({}{})", self.field, self.address)
    }
}

#[test]
fn page_and_offset() {
    let a = Address::try_from(0o1234_u16).unwrap();
    assert_eq!(a.page(), 0o12_u8);
    assert_eq!(a.offset(), 0o34_u8);
    assert_eq!(a.page_start(), Address::try_from(0o1200_u16).unwrap());
    assert!(!a.is_page_zero());
    assert!(Address::try_from(0o177_u16).unwrap().is_page_zero());
}

#[test]
fn successor_wraps_within_field() {
    assert_eq!(Address::MAX.successor(), Address::ZERO);
    let here = ExtendedAddress::new(Field::try_from(3_u8).unwrap(), Address::MAX);
    assert_eq!(here.successor().field, Field::try_from(3_u8).unwrap());
}

#[test]
fn extended_address_display() {
    let here = ExtendedAddress::new(
        Field::try_from(1_u8).unwrap(),
        Address::try_from(0o200_u16).unwrap(),
    );
    assert_eq!(here.to_string(), "10200");
}
