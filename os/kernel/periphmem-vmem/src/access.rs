//! Byte-granular access to raw frame mappings.
//!
//! Areas that map raw frames (`VM_PFNMAP`) have no page structures behind
//! them, so `ptrace`-style readers cannot pin and copy the pages. Instead the
//! area carries [`VmOperations`], and [`PhysicalAccess`] services the request
//! by translating the virtual address through the caller's page table and
//! touching the physical bytes directly.

use crate::{UserAddressSpace, VmArea, VmemError};
use alloc::sync::Arc;
use periphmem_addresses::{PageSize, PhysicalAddress, Size4K, VirtualAddress};

/// A single read or write request against a mapped area.
#[derive(Debug)]
pub enum Access<'a> {
    /// Copy mapped bytes into the buffer.
    Read(&'a mut [u8]),
    /// Copy the buffer into mapped bytes.
    Write(&'a [u8]),
}

impl Access<'_> {
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Access::Read(buf) => buf.len(),
            Access::Write(buf) => buf.len(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Access::Write(_))
    }
}

/// Operations a driver attaches to an area it mapped.
pub trait VmOperations: Send + Sync {
    /// Transfer bytes at `addr` for a debugger-style access.
    ///
    /// Returns the number of bytes transferred.
    ///
    /// # Errors
    /// Implementation-specific; see [`VmemError`].
    fn access(
        &self,
        vma: &VmArea,
        aspace: &dyn UserAddressSpace,
        addr: VirtualAddress,
        access: Access<'_>,
    ) -> Result<usize, VmemError>;
}

/// Byte-level access to physical memory, e.g. through a temporary
/// uncached kernel mapping of the frame.
pub trait PhysicalMemory: Send + Sync {
    /// Read `buf.len()` bytes starting at `pa`.
    ///
    /// # Errors
    /// [`VmemError::PhysicalAccess`] if the bytes cannot be reached.
    fn read(&self, pa: PhysicalAddress, buf: &mut [u8]) -> Result<(), VmemError>;

    /// Write `buf` starting at `pa`.
    ///
    /// # Errors
    /// [`VmemError::PhysicalAccess`] if the bytes cannot be reached.
    fn write(&self, pa: PhysicalAddress, buf: &[u8]) -> Result<(), VmemError>;
}

impl<M: PhysicalMemory + ?Sized> PhysicalMemory for Arc<M> {
    #[inline]
    fn read(&self, pa: PhysicalAddress, buf: &mut [u8]) -> Result<(), VmemError> {
        (**self).read(pa, buf)
    }

    #[inline]
    fn write(&self, pa: PhysicalAddress, buf: &[u8]) -> Result<(), VmemError> {
        (**self).write(pa, buf)
    }
}

/// [`VmOperations`] that service accesses through [`PhysicalMemory`].
///
/// Accesses are clipped to the end of the page containing `addr`; callers
/// loop page by page for longer transfers.
#[derive(Debug)]
pub struct PhysicalAccess<M> {
    memory: M,
}

impl<M: PhysicalMemory> PhysicalAccess<M> {
    #[must_use]
    pub const fn new(memory: M) -> Self {
        Self { memory }
    }

    #[must_use]
    pub const fn memory(&self) -> &M {
        &self.memory
    }
}

impl<M: PhysicalMemory> VmOperations for PhysicalAccess<M> {
    fn access(
        &self,
        vma: &VmArea,
        aspace: &dyn UserAddressSpace,
        addr: VirtualAddress,
        access: Access<'_>,
    ) -> Result<usize, VmemError> {
        if !vma.contains(addr) {
            return Err(VmemError::OutsideArea(addr));
        }
        let (pa, prot) = aspace.translate(addr).ok_or(VmemError::NotMapped(addr))?;
        if access.is_write() && !prot.writable() {
            return Err(VmemError::ReadOnly);
        }

        let room = Size4K::SIZE - addr.page_offset::<Size4K>();
        let len = usize::try_from(room).map_or(access.len(), |room| access.len().min(room));

        match access {
            Access::Read(buf) => self.memory.read(pa, &mut buf[..len])?,
            Access::Write(buf) => self.memory.write(pa, &buf[..len])?,
        }
        log::trace!("access {len} byte(s) at {addr} -> {pa}");
        Ok(len)
    }
}
