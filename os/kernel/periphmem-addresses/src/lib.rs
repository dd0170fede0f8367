//! # Physical and Virtual Address Types for Peripheral Mappings
//!
//! Strongly typed wrappers for the addresses a peripheral mapping driver
//! juggles: the physical register block reported by the platform, the
//! caller's virtual address range, and the page index (`pgoff`) a mapping
//! request is expressed in.
//!
//! ## Overview
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PhysicalAddress`] | A raw physical (bus/MMIO) address. |
//! | [`VirtualAddress`] | A raw address in the caller's virtual address space. |
//! | [`PhysicalPage<S>`] / [`VirtualPage<S>`] | Page-aligned bases for a page size `S`. |
//! | [`PageFrameNumber`] | A physical page index, i.e. `address >> S::SHIFT`. |
//! | [`PhysicalRange`] | A half-open `[start, end)` range of physical addresses. |
//!
//! Only [`Size4K`] is provided; peripheral windows are exactly one 4 KiB page.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use periphmem_addresses::*;
//! // A request for page index 0x3F200 of one page ...
//! let pfn = PageFrameNumber::new(0x3F200);
//! let range = PhysicalRange::from_len(pfn.base::<Size4K>(), Size4K::SIZE).unwrap();
//! assert_eq!(range.start().as_u64(), 0x3F20_0000);
//! assert_eq!(range.end().as_u64(), 0x3F20_1000);
//!
//! // ... is offset 0x200000 into a block based at 0x3F000000.
//! let off = range.offset_from(PhysicalAddress::new(0x3F00_0000)).unwrap();
//! assert_eq!((off.start, off.end), (0x20_0000, 0x20_1000));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod page;
mod page_frame;
mod page_size;
mod physical_address;
mod physical_range;
mod virtual_address;

pub use page::{PhysicalPage, VirtualPage};
pub use page_frame::PageFrameNumber;
pub use page_size::{PageSize, Size4K};
pub use physical_address::PhysicalAddress;
pub use physical_range::{OffsetRange, PhysicalRange};
pub use virtual_address::VirtualAddress;

/// Returns `true` if `x` is a multiple of the page size `S`.
#[inline]
#[must_use]
pub const fn is_page_aligned<S: PageSize>(x: u64) -> bool {
    x & (S::SIZE - 1) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_helper() {
        assert!(is_page_aligned::<Size4K>(0));
        assert!(is_page_aligned::<Size4K>(0x3F20_0000));
        assert!(!is_page_aligned::<Size4K>(0x3F20_0004));
    }

    #[test]
    fn pfn_and_address_agree() {
        let pa = PhysicalAddress::new(0x3F20_3000);
        let pfn = pa.frame_number::<Size4K>();
        assert_eq!(pfn.as_u64(), 0x3F203);
        assert_eq!(pfn.base::<Size4K>(), pa);
    }
}
