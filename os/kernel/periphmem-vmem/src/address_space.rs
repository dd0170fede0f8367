//! # Caller Address Spaces
//!
//! [`UserAddressSpace`] is the seam between a driver and the page tables of
//! the process it maps into. Drivers only ever install or remove single
//! 4 KiB leaves and translate addresses; table allocation, locking and TLB
//! maintenance stay behind the trait.
//!
//! [`remap_pfn_range`] builds on it to map a physically contiguous frame
//! range into an area with **all-or-nothing** semantics: if any page fails,
//! every page this call installed is removed before the error is returned.

#[cfg(any(test, feature = "sim"))]
mod soft;

#[cfg(any(test, feature = "sim"))]
pub use crate::address_space::soft::SoftAddressSpace;
use crate::{PageProtection, VmArea, VmemError};
use periphmem_addresses::{
    PageFrameNumber, PageSize, PhysicalAddress, PhysicalPage, Size4K, VirtualAddress, VirtualPage,
    is_page_aligned,
};

/// Page tables of one caller.
pub trait UserAddressSpace {
    /// Install a 4 KiB leaf `page → frame` with `prot`.
    ///
    /// # Errors
    /// - [`VmemError::AlreadyMapped`] if `page` already has a leaf.
    /// - [`VmemError::OutOfMemory`] if a page-table page cannot be allocated.
    fn map_page(
        &mut self,
        page: VirtualPage<Size4K>,
        frame: PhysicalPage<Size4K>,
        prot: PageProtection,
    ) -> Result<(), VmemError>;

    /// Remove the 4 KiB leaf at `page`, returning the frame it mapped.
    ///
    /// # Errors
    /// [`VmemError::NotMapped`] if `page` has no leaf.
    fn unmap_page(&mut self, page: VirtualPage<Size4K>) -> Result<PhysicalPage<Size4K>, VmemError>;

    /// Translate `addr` to its physical address and leaf protection.
    fn translate(&self, addr: VirtualAddress) -> Option<(PhysicalAddress, PageProtection)>;
}

/// Map `size` bytes of frames starting at `pfn` to `addr` inside `vma`.
///
/// Marks the area as raw I/O (`io | pfn_map | dont_expand | dont_dump`) once
/// every page is in; a failed call leaves the area's flags untouched.
///
/// # Errors
/// - [`VmemError::Unaligned`] if `addr` or `size` is not page aligned.
/// - [`VmemError::InvalidRange`] if the range is empty, leaves the area or
///   overflows the physical address space.
/// - Any error of [`UserAddressSpace::map_page`]; no page of this call
///   remains mapped in that case.
pub fn remap_pfn_range<A>(
    aspace: &mut A,
    vma: &mut VmArea,
    addr: VirtualAddress,
    pfn: PageFrameNumber,
    size: u64,
    prot: PageProtection,
) -> Result<(), VmemError>
where
    A: UserAddressSpace + ?Sized,
{
    if !is_page_aligned::<Size4K>(addr.as_u64()) || !is_page_aligned::<Size4K>(size) {
        return Err(VmemError::Unaligned);
    }
    let end = addr.checked_add(size).ok_or(VmemError::InvalidRange)?;
    if size == 0 || addr < vma.start() || end > vma.end() {
        return Err(VmemError::InvalidRange);
    }
    let phys = pfn.checked_base::<Size4K>().ok_or(VmemError::InvalidRange)?;
    phys.checked_add(size).ok_or(VmemError::InvalidRange)?;

    let pages = size >> Size4K::SHIFT;
    for i in 0..pages {
        let va = VirtualAddress::new(addr.as_u64() + i * Size4K::SIZE);
        let pa = PhysicalAddress::new(phys.as_u64() + i * Size4K::SIZE);
        if let Err(e) = aspace.map_page(va.page(), pa.page(), prot) {
            let undone = zap_range(aspace, addr, i);
            log::debug!("remap at {va} failed ({e}); removed {undone} page(s)");
            return Err(e);
        }
        log::trace!("mapped {va} -> {pa}");
    }

    vma.set_flags(
        vma.flags()
            .with_io(true)
            .with_pfn_map(true)
            .with_dont_expand(true)
            .with_dont_dump(true),
    );
    Ok(())
}

/// Remove whatever leaves exist in `[addr, addr + pages * 4K)`.
///
/// Returns the number of pages that were mapped and are now removed.
pub fn zap_range<A>(aspace: &mut A, addr: VirtualAddress, pages: u64) -> u64
where
    A: UserAddressSpace + ?Sized,
{
    let mut removed = 0;
    for i in 0..pages {
        let va = VirtualAddress::new(addr.as_u64() + i * Size4K::SIZE);
        if aspace.unmap_page(va.page()).is_ok() {
            removed += 1;
        }
    }
    removed
}
