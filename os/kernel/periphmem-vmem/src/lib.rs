//! # User Virtual Memory for Peripheral Mappings
//!
//! The pieces a device driver needs to hand a caller a direct window onto a
//! physical register range:
//!
//! - [`VmArea`]: the caller's virtual extent, requested page offset (`pgoff`),
//!   protection and, once mapped, the area's access operations.
//! - [`UserAddressSpace`]: the seam to the caller's page tables. One 4 KiB leaf
//!   at a time, plus translation.
//! - [`remap_pfn_range`]: install a contiguous frame range into an area, all
//!   or nothing.
//! - [`PageProtection`]: leaf permission and caching bits.
//! - [`VmOperations`] / [`PhysicalAccess`]: byte-granular access to a mapped
//!   area on behalf of debuggers (`ptrace`, `/proc/<pid>/mem`), which cannot
//!   fault in `VM_PFNMAP` pages the normal way.
//! - [`SoftAddressSpace`]: an in-memory page table with a bounded frame pool
//!   for page-table pages, usable as a host backend and in tests. Behind the
//!   default `sim` feature.
//!
//! ## Mapping walk
//!
//! ```text
//!  VmArea [start, end)  pgoff
//!      │                  │
//!      ▼                  ▼
//!  VirtualPage<4K>  →  PhysicalPage<4K>   (one leaf per page, PageProtection)
//!      │
//!      └── leaf table per 2 MiB of VA, backed by a frame from FrameAlloc
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod access;
pub mod address_space;
mod error;
#[cfg(any(test, feature = "sim"))]
mod frame_alloc;
mod protection;
mod vma;

pub use crate::access::{Access, PhysicalAccess, PhysicalMemory, VmOperations};
#[cfg(any(test, feature = "sim"))]
pub use crate::address_space::SoftAddressSpace;
pub use crate::address_space::{UserAddressSpace, remap_pfn_range, zap_range};
pub use crate::error::VmemError;
#[cfg(any(test, feature = "sim"))]
pub use crate::frame_alloc::{FrameAlloc, FrameBudget};
pub use crate::protection::{PageProtection, VmFlags};
pub use crate::vma::VmArea;

pub use periphmem_addresses as addresses;
