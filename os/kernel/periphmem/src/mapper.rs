//! # Memory Mapper
//!
//! Installs an authorized physical range into the caller's address space
//! with uncached device-memory semantics, all or nothing.

use crate::errno::Errno;
use crate::gate::Authorization;
use alloc::sync::Arc;
use periphmem_addresses::{PhysicalRange, Size4K, VirtualAddress, is_page_aligned};
use periphmem_vmem::{
    PageProtection, PhysicalAccess, PhysicalMemory, UserAddressSpace, VmArea, VmOperations,
    VmemError, remap_pfn_range,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("invalid mapping request")]
    InvalidArgument,
    #[error("range {requested} was not authorized")]
    PermissionDenied { requested: PhysicalRange },
    #[error("page table installation failed: {0}")]
    TryAgain(VmemError),
}

impl MapError {
    #[must_use]
    pub const fn errno(&self) -> Errno {
        match self {
            Self::InvalidArgument => Errno::InvalidArgument,
            Self::PermissionDenied { .. } => Errno::NotPermitted,
            Self::TryAgain(_) => Errno::TryAgain,
        }
    }
}

/// A successfully installed mapping.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MappedRegion {
    pub virt: VirtualAddress,
    pub phys: PhysicalRange,
    pub pages: u64,
}

/// Leaf protection for peripheral registers, derived from what the caller
/// asked for: present, user accessible, uncached, write-through, never
/// executable.
#[inline]
#[must_use]
pub const fn device_memory_protection(requested: PageProtection) -> PageProtection {
    requested.device_memory()
}

/// Installs authorized ranges and attaches byte-level access to them.
pub struct MemoryMapper {
    access: Arc<dyn VmOperations>,
}

impl MemoryMapper {
    #[must_use]
    pub fn new(memory: Arc<dyn PhysicalMemory>) -> Self {
        Self {
            access: Arc::new(PhysicalAccess::new(memory)),
        }
    }

    /// Map the physical range requested by `vma` into `aspace`.
    ///
    /// # Errors
    /// - [`MapError::InvalidArgument`] if the area's physical range is empty,
    ///   unaligned or overflows.
    /// - [`MapError::PermissionDenied`] if `auth` covers a different range.
    /// - [`MapError::TryAgain`] if page-table installation fails. Nothing of
    ///   the range remains mapped and `vma` is left as it came in.
    pub fn install(
        &self,
        aspace: &mut dyn UserAddressSpace,
        vma: &mut VmArea,
        auth: &Authorization,
    ) -> Result<MappedRegion, MapError> {
        let phys = vma.physical_range().ok_or(MapError::InvalidArgument)?;
        if phys.is_empty()
            || !is_page_aligned::<Size4K>(phys.start().as_u64())
            || !is_page_aligned::<Size4K>(phys.len())
        {
            return Err(MapError::InvalidArgument);
        }
        if auth.range() != phys {
            return Err(MapError::PermissionDenied { requested: phys });
        }

        let requested = vma.protection();
        let prot = device_memory_protection(requested);
        vma.set_protection(prot);
        vma.set_operations(Arc::clone(&self.access));

        let (start, pgoff, len) = (vma.start(), vma.pgoff(), vma.len());
        if let Err(e) = remap_pfn_range(aspace, vma, start, pgoff, len, prot) {
            vma.clear_operations();
            vma.set_protection(requested);
            return Err(MapError::TryAgain(e));
        }

        let region = MappedRegion {
            virt: start,
            phys,
            pages: vma.pages(),
        };
        log::debug!("mapped {phys} at {start} ({} page(s))", region.pages);
        Ok(region)
    }
}

impl core::fmt::Debug for MemoryMapper {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryMapper").finish_non_exhaustive()
    }
}
