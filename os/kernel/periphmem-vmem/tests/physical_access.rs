#![cfg(feature = "sim")]

use periphmem_vmem::addresses::{PageFrameNumber, PhysicalAddress, VirtualAddress};
use periphmem_vmem::{
    Access, PageProtection, PhysicalAccess, PhysicalMemory, SoftAddressSpace, VmArea, VmemError,
    remap_pfn_range,
};
use std::sync::{Arc, Mutex};

const BLOCK_BASE: u64 = 0x3F20_0000;

/// Two pages of fake registers starting at `BLOCK_BASE`.
#[derive(Clone)]
struct Registers {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl Registers {
    fn new() -> Self {
        let bytes = (0..8192u32).map(|i| (i % 251) as u8).collect();
        Self {
            bytes: Arc::new(Mutex::new(bytes)),
        }
    }

    fn index(pa: PhysicalAddress, len: usize) -> Result<std::ops::Range<usize>, VmemError> {
        let start = pa
            .as_u64()
            .checked_sub(BLOCK_BASE)
            .ok_or(VmemError::PhysicalAccess(pa))? as usize;
        if start + len > 8192 {
            return Err(VmemError::PhysicalAccess(pa));
        }
        Ok(start..start + len)
    }
}

impl PhysicalMemory for Registers {
    fn read(&self, pa: PhysicalAddress, buf: &mut [u8]) -> Result<(), VmemError> {
        let range = Registers::index(pa, buf.len())?;
        buf.copy_from_slice(&self.bytes.lock().unwrap()[range]);
        Ok(())
    }

    fn write(&self, pa: PhysicalAddress, buf: &[u8]) -> Result<(), VmemError> {
        let range = Registers::index(pa, buf.len())?;
        self.bytes.lock().unwrap()[range].copy_from_slice(buf);
        Ok(())
    }
}

fn mapped(prot: PageProtection) -> (SoftAddressSpace, VmArea, Registers) {
    let regs = Registers::new();
    let mut aspace = SoftAddressSpace::unbounded();
    let mut vma = VmArea::new(
        VirtualAddress::new(0x7000_0000),
        8192,
        PageFrameNumber::new(BLOCK_BASE >> 12),
        prot,
    )
    .unwrap();
    let (start, pgoff, len) = (vma.start(), vma.pgoff(), vma.len());
    remap_pfn_range(&mut aspace, &mut vma, start, pgoff, len, prot).unwrap();
    vma.set_operations(Arc::new(PhysicalAccess::new(regs.clone())));
    (aspace, vma, regs)
}

#[test]
fn reads_single_register_bytes() {
    let (aspace, vma, _regs) = mapped(PageProtection::user_rw().device_memory());

    let mut buf = [0u8; 4];
    let n = vma
        .access(&aspace, VirtualAddress::new(0x7000_0034), Access::Read(&mut buf))
        .unwrap();
    assert_eq!(n, 4);
    assert_eq!(buf, [0x34, 0x35, 0x36, 0x37]);
}

#[test]
fn writes_reach_the_physical_bytes() {
    let (aspace, vma, regs) = mapped(PageProtection::user_rw().device_memory());

    let n = vma
        .access(
            &aspace,
            VirtualAddress::new(0x7000_1000),
            Access::Write(&[0xAA, 0xBB]),
        )
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(&regs.bytes.lock().unwrap()[4096..4098], &[0xAA, 0xBB]);
}

#[test]
fn access_is_clipped_at_the_page_boundary() {
    let (aspace, vma, _regs) = mapped(PageProtection::user_rw().device_memory());

    let mut buf = [0u8; 16];
    let n = vma
        .access(&aspace, VirtualAddress::new(0x7000_0FFC), Access::Read(&mut buf))
        .unwrap();
    assert_eq!(n, 4);
}

#[test]
fn write_through_read_only_mapping_is_refused() {
    let (aspace, vma, regs) = mapped(PageProtection::user_ro().device_memory());

    let err = vma
        .access(&aspace, VirtualAddress::new(0x7000_0000), Access::Write(&[1]))
        .unwrap_err();
    assert_eq!(err, VmemError::ReadOnly);
    assert_eq!(regs.bytes.lock().unwrap()[0], 0);
}

#[test]
fn access_outside_the_area_is_refused() {
    let (aspace, vma, _regs) = mapped(PageProtection::user_rw().device_memory());

    let mut buf = [0u8; 1];
    let addr = VirtualAddress::new(0x7000_2000);
    assert_eq!(
        vma.access(&aspace, addr, Access::Read(&mut buf)).unwrap_err(),
        VmemError::OutsideArea(addr)
    );
}

#[test]
fn area_without_operations_has_no_access() {
    let aspace = SoftAddressSpace::unbounded();
    let vma = VmArea::new(
        VirtualAddress::new(0x7000_0000),
        4096,
        PageFrameNumber::new(BLOCK_BASE >> 12),
        PageProtection::user_rw(),
    )
    .unwrap();

    let mut buf = [0u8; 1];
    assert_eq!(
        vma.access(&aspace, VirtualAddress::new(0x7000_0000), Access::Read(&mut buf))
            .unwrap_err(),
        VmemError::NoAccessHandler
    );
}
