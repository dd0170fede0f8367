use periphmem_addresses::{PhysicalAddress, VirtualAddress};

/// Errors of the virtual memory layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmemError {
    #[error("out of memory (page table)")]
    OutOfMemory,
    #[error("unaligned address or length")]
    Unaligned,
    #[error("invalid range")]
    InvalidRange,
    #[error("virtual address {0} is already mapped")]
    AlreadyMapped(VirtualAddress),
    #[error("virtual address {0} is not mapped")]
    NotMapped(VirtualAddress),
    #[error("address {0} lies outside the area")]
    OutsideArea(VirtualAddress),
    #[error("write through a read-only mapping")]
    ReadOnly,
    #[error("area has no access operations")]
    NoAccessHandler,
    #[error("physical access at {0} failed")]
    PhysicalAccess(PhysicalAddress),
}
