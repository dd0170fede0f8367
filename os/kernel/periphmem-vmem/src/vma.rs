use crate::{Access, PageProtection, UserAddressSpace, VmFlags, VmOperations, VmemError};
use alloc::sync::Arc;
use core::fmt;
use periphmem_addresses::{
    PageFrameNumber, PageSize, PhysicalAddress, PhysicalRange, Size4K, VirtualAddress,
    is_page_aligned,
};

/// A caller's virtual memory area and what it asks to be backed by.
///
/// ### Invariants
/// - `start` and `end` are 4 KiB aligned and `start < end`.
pub struct VmArea {
    start: VirtualAddress,
    end: VirtualAddress,
    pgoff: PageFrameNumber,
    prot: PageProtection,
    flags: VmFlags,
    ops: Option<Arc<dyn VmOperations>>,
}

impl VmArea {
    /// Describe `len` bytes at `start`, asking for the frames starting at `pgoff`.
    ///
    /// # Errors
    /// - [`VmemError::Unaligned`] if `start` or `len` is not page aligned.
    /// - [`VmemError::InvalidRange`] if `len` is zero or the end overflows.
    pub fn new(
        start: VirtualAddress,
        len: u64,
        pgoff: PageFrameNumber,
        prot: PageProtection,
    ) -> Result<Self, VmemError> {
        if !is_page_aligned::<Size4K>(start.as_u64()) || !is_page_aligned::<Size4K>(len) {
            return Err(VmemError::Unaligned);
        }
        if len == 0 {
            return Err(VmemError::InvalidRange);
        }
        let end = start.checked_add(len).ok_or(VmemError::InvalidRange)?;
        Ok(Self {
            start,
            end,
            pgoff,
            prot,
            flags: VmFlags::new(),
            ops: None,
        })
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> VirtualAddress {
        self.start
    }

    #[inline]
    #[must_use]
    pub const fn end(&self) -> VirtualAddress {
        self.end
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end.as_u64() - self.start.as_u64()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    #[must_use]
    pub const fn pages(&self) -> u64 {
        self.len() >> Size4K::SHIFT
    }

    #[inline]
    #[must_use]
    pub const fn pgoff(&self) -> PageFrameNumber {
        self.pgoff
    }

    #[inline]
    #[must_use]
    pub const fn protection(&self) -> PageProtection {
        self.prot
    }

    #[inline]
    pub const fn set_protection(&mut self, prot: PageProtection) {
        self.prot = prot;
    }

    #[inline]
    #[must_use]
    pub const fn flags(&self) -> VmFlags {
        self.flags
    }

    #[inline]
    pub(crate) const fn set_flags(&mut self, flags: VmFlags) {
        self.flags = flags;
    }

    /// Physical start of the requested backing, `pgoff << PAGE_SHIFT`.
    ///
    /// `None` if the page index does not fit a 64-bit address.
    #[inline]
    #[must_use]
    pub const fn physical_start(&self) -> Option<PhysicalAddress> {
        self.pgoff.checked_base::<Size4K>()
    }

    /// The physical range `[pgoff << PAGE_SHIFT, +len)` this area asks for.
    #[must_use]
    pub fn physical_range(&self) -> Option<PhysicalRange> {
        PhysicalRange::from_len(self.physical_start()?, self.len())
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, addr: VirtualAddress) -> bool {
        addr.as_u64() >= self.start.as_u64() && addr.as_u64() < self.end.as_u64()
    }

    /// Attach access operations, replacing any previous ones.
    pub fn set_operations(&mut self, ops: Arc<dyn VmOperations>) {
        self.ops = Some(ops);
    }

    pub fn clear_operations(&mut self) {
        self.ops = None;
    }

    #[inline]
    #[must_use]
    pub fn has_operations(&self) -> bool {
        self.ops.is_some()
    }

    /// Access mapped bytes at `addr` through the area's operations.
    ///
    /// Returns the number of bytes transferred, which may be less than
    /// requested when the access would cross a page boundary.
    ///
    /// # Errors
    /// - [`VmemError::OutsideArea`] if `addr` is not inside the area.
    /// - [`VmemError::NoAccessHandler`] if no operations were attached.
    /// - Whatever the operations report.
    pub fn access(
        &self,
        aspace: &dyn UserAddressSpace,
        addr: VirtualAddress,
        access: Access<'_>,
    ) -> Result<usize, VmemError> {
        if !self.contains(addr) {
            return Err(VmemError::OutsideArea(addr));
        }
        let ops = self.ops.as_ref().ok_or(VmemError::NoAccessHandler)?;
        ops.access(self, aspace, addr, access)
    }
}

impl fmt::Debug for VmArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VmArea")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("pgoff", &self.pgoff)
            .field("prot", &self.prot)
            .field("flags", &self.flags)
            .field("ops", &self.ops.is_some())
            .finish()
    }
}
