use crate::{PageSize, PhysicalAddress};
use core::fmt;

/// Physical page index, the unit a mapping request's `pgoff` is given in.
///
/// The physical address of the first byte is `index << S::SHIFT`.
///
/// ### Examples
/// ```rust
/// # use periphmem_addresses::*;
/// let pfn = PageFrameNumber::new(0x3F101);
/// assert_eq!(pfn.base::<Size4K>().as_u64(), 0x3F10_1000);
/// assert!(PageFrameNumber::new(u64::MAX).checked_base::<Size4K>().is_none());
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PageFrameNumber(u64);

impl PageFrameNumber {
    #[inline]
    #[must_use]
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// First byte of the frame; wraps silently on overflow.
    ///
    /// Prefer [`checked_base`](Self::checked_base) for caller-provided indices.
    #[inline]
    #[must_use]
    pub const fn base<S: PageSize>(self) -> PhysicalAddress {
        PhysicalAddress::new(self.0 << S::SHIFT)
    }

    /// First byte of the frame, or `None` if the index does not fit.
    #[inline]
    #[must_use]
    pub const fn checked_base<S: PageSize>(self) -> Option<PhysicalAddress> {
        if self.0 > (u64::MAX >> S::SHIFT) {
            return None;
        }
        Some(PhysicalAddress::new(self.0 << S::SHIFT))
    }
}

impl fmt::Debug for PageFrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PFN({:#X})", self.0)
    }
}

impl From<u64> for PageFrameNumber {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}
