use crate::PhysicalAddress;
use core::fmt;

/// Half-open range `[start, end)` of physical addresses.
///
/// ### Invariants
/// - `start <= end`. Ranges are built from a start and a length with overflow
///   checking, so an `end` beyond `u64::MAX` is unrepresentable.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct PhysicalRange {
    start: PhysicalAddress,
    end: PhysicalAddress,
}

/// A [`PhysicalRange`] translated into offsets relative to some base.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct OffsetRange {
    /// First offset (inclusive).
    pub start: u64,
    /// One past the last offset (exclusive).
    pub end: u64,
}

impl PhysicalRange {
    /// Build `[start, start + len)`, returning `None` if the end overflows.
    #[inline]
    #[must_use]
    pub const fn from_len(start: PhysicalAddress, len: u64) -> Option<Self> {
        match start.checked_add(len) {
            Some(end) => Some(Self { start, end }),
            None => None,
        }
    }

    /// Build `[start, end)`, returning `None` if `end < start`.
    #[inline]
    #[must_use]
    pub const fn from_bounds(start: PhysicalAddress, end: PhysicalAddress) -> Option<Self> {
        if end.as_u64() < start.as_u64() {
            return None;
        }
        Some(Self { start, end })
    }

    #[inline]
    #[must_use]
    pub const fn start(self) -> PhysicalAddress {
        self.start
    }

    /// Exclusive end.
    #[inline]
    #[must_use]
    pub const fn end(self) -> PhysicalAddress {
        self.end
    }

    #[inline]
    #[must_use]
    pub const fn len(self) -> u64 {
        self.end.as_u64() - self.start.as_u64()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Translate into offsets relative to `base`; `None` if `start < base`.
    #[inline]
    #[must_use]
    pub const fn offset_from(self, base: PhysicalAddress) -> Option<OffsetRange> {
        let Some(start) = self.start.checked_offset_from(base) else {
            return None;
        };
        Some(OffsetRange {
            start,
            end: start + self.len(),
        })
    }
}

impl OffsetRange {
    /// `true` if `self` lies entirely within `[offset, offset + size)`.
    #[inline]
    #[must_use]
    pub const fn within(self, offset: u64, size: u64) -> bool {
        match offset.checked_add(size) {
            Some(limit) => self.start >= offset && self.end <= limit,
            None => self.start >= offset,
        }
    }
}

impl fmt::Debug for PhysicalRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PhysicalRange(0x{:08X}..0x{:08X})",
            self.start.as_u64(),
            self.end.as_u64()
        )
    }
}

impl fmt::Display for PhysicalRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.start, self.end)
    }
}
