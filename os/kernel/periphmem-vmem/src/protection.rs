//! # Page Protection and VM Area Flags
//!
//! [`PageProtection`] is the leaf-level permission and caching descriptor
//! installed for every page of a mapping. Its low bits follow the x86-64 PTE
//! layout (P, RW, US, PWT, PCD) so a real page-table backend can copy them
//! verbatim; `no_execute` sits at bit 63 like NX.
//!
//! [`VmFlags`] are per-area bookkeeping flags, set by
//! [`remap_pfn_range`](crate::remap_pfn_range) on areas that map raw frames.

use bitfield_struct::bitfield;

/// Permission and caching bits for a leaf mapping.
///
/// | Bit | Name | Meaning |
/// |-----|------|---------|
/// | 0 | `P` | Present |
/// | 1 | `RW` | Writable |
/// | 2 | `US` | User-mode accessible |
/// | 3 | `PWT` | Write-through |
/// | 4 | `PCD` | Cache disabled |
/// | 63 | `NX` | Execute disable |
///
/// ### Example
/// ```rust
/// # use periphmem_vmem::PageProtection;
/// let prot = PageProtection::user_rw().device_memory();
/// assert!(prot.cache_disabled());
/// assert!(prot.write_through());
/// assert!(prot.no_execute());
/// assert!(prot.writable());
/// ```
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct PageProtection {
    /// Present (P, bit 0).
    pub present: bool,

    /// Writable (RW, bit 1). Clear for read-only mappings.
    pub writable: bool,

    /// User/Supervisor (US, bit 2). Set to allow user-mode access.
    pub user_access: bool,

    /// Page Write-Through (PWT, bit 3).
    pub write_through: bool,

    /// Page Cache Disable (PCD, bit 4).
    ///
    /// Required for device registers: every load and store must reach the
    /// peripheral, in program order, without being absorbed by a cache line.
    pub cache_disabled: bool,

    #[bits(58)]
    __: u64,

    /// No-Execute (NX, bit 63).
    pub no_execute: bool,
}

impl PageProtection {
    /// Present, user-accessible, read-only.
    #[inline]
    #[must_use]
    pub const fn user_ro() -> Self {
        Self::new()
            .with_present(true)
            .with_user_access(true)
            .with_writable(false)
    }

    /// Present, user-accessible, read-write.
    #[inline]
    #[must_use]
    pub const fn user_rw() -> Self {
        Self::user_ro().with_writable(true)
    }

    /// Derive the attributes for an uncached device-memory mapping.
    ///
    /// Keeps the caller's `writable` choice; forces `present` and
    /// `user_access`, disables caching (PCD|PWT) and execution.
    #[inline]
    #[must_use]
    pub const fn device_memory(self) -> Self {
        self.with_present(true)
            .with_user_access(true)
            .with_cache_disabled(true)
            .with_write_through(true)
            .with_no_execute(true)
    }

    /// `true` if this protection describes uncached device memory.
    #[inline]
    #[must_use]
    pub const fn is_device_memory(self) -> bool {
        self.cache_disabled() && self.write_through()
    }
}

/// Bookkeeping flags of a [`VmArea`](crate::VmArea).
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct VmFlags {
    /// Area maps device I/O memory.
    pub io: bool,
    /// Area maps raw page frames without `struct page` backing.
    pub pfn_map: bool,
    /// Area must not be grown by `mremap`.
    pub dont_expand: bool,
    /// Area is excluded from core dumps.
    pub dont_dump: bool,
    #[bits(4)]
    __: u8,
}
