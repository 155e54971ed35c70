//! Where the program lives in memory.
//!
//! Memory reference instructions can only address page zero and the
//! page they are on.  To reach anything else, the assembler places a
//! link (a word holding the target address) on the current page and
//! refers to it indirectly.  Literals (`[e]`) are handled the same
//! way.  Each page's links and literals form a pool which grows down
//! from the last word of the page, and must not overlap the words the
//! program itself occupies on that page.
use std::collections::BTreeMap;

use tracing::{event, Level};

use base::prelude::{Address, ExtendedAddress, Field, Page, PageOffset, Unsigned12Bit, PAGE_SIZE};

type PageKey = (Field, Page);

fn page_key(location: ExtendedAddress) -> PageKey {
    (location.field, location.address.page())
}

/// The highest offset used by code or data on each page.  This is
/// recorded during the first pass so that the second pass knows how
/// much of each page is free.
#[derive(Debug, Default)]
pub(crate) struct Occupancy {
    highest: BTreeMap<PageKey, PageOffset>,
}

impl Occupancy {
    pub(crate) fn record(&mut self, location: ExtendedAddress) {
        let offset = location.address.offset();
        self.highest
            .entry(page_key(location))
            .and_modify(|high| {
                if offset > *high {
                    *high = offset;
                }
            })
            .or_insert(offset);
    }

    /// Record `len` words starting at `start` (wrapping within the
    /// field).
    pub(crate) fn record_block(&mut self, start: ExtendedAddress, len: u16) {
        let mut location = start;
        for _ in 0..len.min(0o10000) {
            self.record(location);
            location = location.successor();
        }
    }

    pub(crate) fn highest(&self, field: Field, page: Page) -> Option<PageOffset> {
        self.highest.get(&(field, page)).copied()
    }
}

#[derive(Debug, Default)]
struct PagePool {
    /// `words[i]` lives at offset `0177 - i`.
    words: Vec<Unsigned12Bit>,
}

fn pool_offset(index: usize) -> Option<PageOffset> {
    let last = usize::from(PAGE_SIZE - 1);
    let offset = last.checked_sub(index)?;
    PageOffset::try_from(offset).ok()
}

#[derive(Debug, Default)]
pub(crate) struct LinkPools {
    pools: BTreeMap<PageKey, PagePool>,
}

impl LinkPools {
    /// Find or allocate a word holding `value` on the page containing
    /// `location`.  Returns `None` when the page has no room left.
    pub(crate) fn allocate(
        &mut self,
        location: ExtendedAddress,
        value: Unsigned12Bit,
        occupancy: &Occupancy,
    ) -> Option<Address> {
        let (field, page) = page_key(location);
        let pool = self.pools.entry((field, page)).or_default();
        if let Some(index) = pool.words.iter().position(|w| *w == value) {
            return pool_offset(index).map(|offset| Address::from_page_and_offset(page, offset));
        }
        let offset = pool_offset(pool.words.len())?;
        if let Some(high) = occupancy.highest(field, page) {
            if offset <= high {
                event!(
                    Level::DEBUG,
                    "no room for {value:04o} in the pool of page {page:o} of field {field}; code reaches offset {high:o}"
                );
                return None;
            }
        }
        pool.words.push(value);
        let address = Address::from_page_and_offset(page, offset);
        event!(Level::TRACE, "allocated pool word {field}{address} = {value:04o}");
        Some(address)
    }

    /// Every pool word, ordered by field and address.
    pub(crate) fn words(&self) -> Vec<(ExtendedAddress, Unsigned12Bit)> {
        let mut result: Vec<(ExtendedAddress, Unsigned12Bit)> = self
            .pools
            .iter()
            .flat_map(|(&(field, page), pool)| {
                pool.words.iter().enumerate().filter_map(move |(index, word)| {
                    pool_offset(index).map(|offset| {
                        (
                            ExtendedAddress::new(field, Address::from_page_and_offset(page, offset)),
                            *word,
                        )
                    })
                })
            })
            .collect();
        result.sort_by_key(|(location, _)| *location);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(addr: u16) -> ExtendedAddress {
        ExtendedAddress::new(Field::ZERO, Address::try_from(addr).expect("valid address"))
    }

    fn word(n: u16) -> Unsigned12Bit {
        Unsigned12Bit::truncating(n)
    }

    #[test]
    fn occupancy_tracks_highest_offset() {
        let mut occ = Occupancy::default();
        occ.record(at(0o205));
        occ.record(at(0o201));
        occ.record_block(at(0o370), 0o20);
        assert_eq!(occ.highest(Field::ZERO, Page::ONE), Some(PageOffset::MAX));
        assert_eq!(occ.highest(Field::ZERO, Page::truncating(2)), Some(PageOffset::truncating(0o07)));
        assert_eq!(occ.highest(Field::ZERO, Page::truncating(3)), None);
        assert_eq!(occ.highest(Field::ZERO, Page::ZERO), None);

        let mut small = Occupancy::default();
        small.record(at(0o205));
        small.record(at(0o201));
        assert_eq!(small.highest(Field::ZERO, Page::ONE), Some(PageOffset::truncating(5)));
    }

    #[test]
    fn pool_grows_down_and_shares_values() {
        let occ = Occupancy::default();
        let mut pools = LinkPools::default();
        assert_eq!(pools.allocate(at(0o200), word(0o1234), &occ), Some(at(0o377).address));
        assert_eq!(pools.allocate(at(0o210), word(0o4321), &occ), Some(at(0o376).address));
        assert_eq!(pools.allocate(at(0o220), word(0o1234), &occ), Some(at(0o377).address));
        assert_eq!(pools.allocate(at(0o400), word(0o1234), &occ), Some(at(0o577).address));
        assert_eq!(
            pools.words(),
            vec![
                (at(0o376), word(0o4321)),
                (at(0o377), word(0o1234)),
                (at(0o577), word(0o1234)),
            ]
        );
    }

    #[test]
    fn pool_cannot_overlap_code() {
        let mut occ = Occupancy::default();
        occ.record_block(at(0o200), 0o176);
        let mut pools = LinkPools::default();
        assert_eq!(pools.allocate(at(0o200), word(1), &occ), Some(at(0o377).address));
        assert_eq!(pools.allocate(at(0o200), word(2), &occ), Some(at(0o376).address));
        assert_eq!(pools.allocate(at(0o200), word(3), &occ), None);
        // An existing value can still be shared.
        assert_eq!(pools.allocate(at(0o200), word(1), &occ), Some(at(0o377).address));
    }

    #[test]
    fn full_page_has_no_pool() {
        let mut occ = Occupancy::default();
        occ.record(at(0o377));
        let mut pools = LinkPools::default();
        assert_eq!(pools.allocate(at(0o300), word(1), &occ), None);
    }
}
