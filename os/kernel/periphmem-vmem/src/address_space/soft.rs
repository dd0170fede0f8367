//! In-memory page table.
//!
//! Leaves are grouped into tables covering 2 MiB of virtual address space,
//! like an x86-64 PT. Each table costs one frame from the [`FrameAlloc`], so
//! a bounded allocator reproduces page-table exhaustion faithfully. A table
//! whose last leaf is removed gives its frame back.

use crate::{FrameAlloc, FrameBudget, PageProtection, UserAddressSpace, VmemError};
use alloc::collections::BTreeMap;
use periphmem_addresses::{
    PageSize, PhysicalAddress, PhysicalPage, Size4K, VirtualAddress, VirtualPage,
};

/// VA bits covered by one leaf table (512 × 4 KiB).
const TABLE_SHIFT: u32 = 21;
const ENTRIES: u64 = 512;

#[derive(Copy, Clone, Debug)]
struct Leaf {
    frame: PhysicalPage<Size4K>,
    prot: PageProtection,
}

#[derive(Debug)]
struct LeafTable {
    frame: PhysicalPage<Size4K>,
    entries: BTreeMap<u16, Leaf>,
}

/// Software page table for one caller.
#[derive(Debug)]
pub struct SoftAddressSpace<A: FrameAlloc = FrameBudget> {
    alloc: A,
    tables: BTreeMap<u64, LeafTable>,
}

impl SoftAddressSpace<FrameBudget> {
    /// An address space whose page tables may use at most `frames` frames.
    #[must_use]
    pub const fn with_frame_budget(frames: u64) -> Self {
        Self::new(FrameBudget::new(frames))
    }

    /// An address space that will not run out of page-table frames.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self::new(FrameBudget::unbounded())
    }
}

impl<A: FrameAlloc> SoftAddressSpace<A> {
    #[must_use]
    pub const fn new(alloc: A) -> Self {
        Self {
            alloc,
            tables: BTreeMap::new(),
        }
    }

    /// Number of installed leaves.
    #[must_use]
    pub fn mapped_pages(&self) -> usize {
        self.tables.values().map(|t| t.entries.len()).sum()
    }

    /// Number of frames currently held for leaf tables.
    #[must_use]
    pub fn table_frames(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub const fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    const fn split(va: VirtualAddress) -> (u64, u16) {
        let table = va.as_u64() >> TABLE_SHIFT;
        #[allow(clippy::cast_possible_truncation)]
        let slot = ((va.as_u64() >> Size4K::SHIFT) % ENTRIES) as u16;
        (table, slot)
    }
}

impl<A: FrameAlloc> UserAddressSpace for SoftAddressSpace<A> {
    fn map_page(
        &mut self,
        page: VirtualPage<Size4K>,
        frame: PhysicalPage<Size4K>,
        prot: PageProtection,
    ) -> Result<(), VmemError> {
        let (index, slot) = Self::split(page.base());

        if !self.tables.contains_key(&index) {
            let table_frame = self.alloc.alloc_4k().ok_or(VmemError::OutOfMemory)?;
            self.tables.insert(
                index,
                LeafTable {
                    frame: table_frame,
                    entries: BTreeMap::new(),
                },
            );
        }
        let Some(table) = self.tables.get_mut(&index) else {
            return Err(VmemError::OutOfMemory);
        };

        if table.entries.contains_key(&slot) {
            return Err(VmemError::AlreadyMapped(page.base()));
        }
        table.entries.insert(
            slot,
            Leaf {
                frame,
                prot: prot.with_present(true),
            },
        );
        Ok(())
    }

    fn unmap_page(&mut self, page: VirtualPage<Size4K>) -> Result<PhysicalPage<Size4K>, VmemError> {
        let (index, slot) = Self::split(page.base());
        let table = self
            .tables
            .get_mut(&index)
            .ok_or(VmemError::NotMapped(page.base()))?;
        let leaf = table
            .entries
            .remove(&slot)
            .ok_or(VmemError::NotMapped(page.base()))?;

        if table.entries.is_empty()
            && let Some(empty) = self.tables.remove(&index)
        {
            self.alloc.free_4k(empty.frame);
        }
        Ok(leaf.frame)
    }

    fn translate(&self, addr: VirtualAddress) -> Option<(PhysicalAddress, PageProtection)> {
        let (index, slot) = Self::split(addr);
        let leaf = self.tables.get(&index)?.entries.get(&slot)?;
        Some((leaf.frame.join(addr.page_offset::<Size4K>()), leaf.prot))
    }
}
