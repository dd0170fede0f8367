//! Frames for page-table pages.

use periphmem_addresses::{PageSize, PhysicalAddress, PhysicalPage, Size4K};

/// Source of **physical** 4 KiB frames for page-table pages.
///
/// Returns `None` on out-of-memory. Returned frames must be 4 KiB aligned.
pub trait FrameAlloc {
    fn alloc_4k(&mut self) -> Option<PhysicalPage<Size4K>>;

    /// Give a frame obtained from [`alloc_4k`](Self::alloc_4k) back.
    fn free_4k(&mut self, frame: PhysicalPage<Size4K>);
}

/// Bump allocator over a fixed number of frames, with a free list for reuse.
///
/// Good enough for page tables of a single caller; the bound makes
/// resource exhaustion reproducible.
#[derive(Debug, Clone)]
pub struct FrameBudget {
    next: u64,
    end: u64,
    freed: alloc::vec::Vec<PhysicalPage<Size4K>>,
}

impl FrameBudget {
    /// Frames are carved out starting at 16 MiB; the value is only an identity.
    const POOL_START: u64 = 0x0100_0000;

    /// A pool of `frames` page-table frames.
    #[must_use]
    pub const fn new(frames: u64) -> Self {
        Self {
            next: Self::POOL_START,
            end: Self::POOL_START + frames * Size4K::SIZE,
            freed: alloc::vec::Vec::new(),
        }
    }

    /// A pool that never runs dry in practice.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self::new(1 << 32)
    }

    /// Frames still available.
    #[must_use]
    pub fn available(&self) -> u64 {
        (self.end - self.next) / Size4K::SIZE + self.freed.len() as u64
    }
}

impl FrameAlloc for FrameBudget {
    fn alloc_4k(&mut self) -> Option<PhysicalPage<Size4K>> {
        if let Some(frame) = self.freed.pop() {
            return Some(frame);
        }
        if self.next + Size4K::SIZE > self.end {
            return None;
        }
        let pa = PhysicalAddress::new(self.next);
        self.next += Size4K::SIZE;
        Some(pa.page())
    }

    fn free_4k(&mut self, frame: PhysicalPage<Size4K>) {
        debug_assert!(!self.freed.contains(&frame), "double free of {frame:?}");
        self.freed.push(frame);
    }
}
