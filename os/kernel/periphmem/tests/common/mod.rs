#![allow(dead_code)]

use periphmem::addresses::{PageFrameNumber, PhysicalAddress, VirtualAddress};
use periphmem::vmem::{PageProtection, PhysicalMemory, VmArea, VmemError};
use periphmem::{
    ClassId, DeviceNumber, DeviceRegistry, DriverHost, FileOperations, MemoryRegistry,
    RegistryError, StaticPlatformDevice,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const BASE: u64 = 0x3F00_0000;
pub const LIMIT: u64 = 0x3F30_0000;
pub const COMPATIBLE: &str = "brcm,bcm2835-periphmem";

pub fn bcm2835() -> StaticPlatformDevice {
    StaticPlatformDevice::new("3f000000.periphmem", COMPATIBLE).with_memory(BASE, LIMIT)
}

/// One page request at `va` for physical page `pfn`.
pub fn request(va: u64, pfn: u64, pages: u64) -> VmArea {
    VmArea::new(
        VirtualAddress::new(va),
        pages * 4096,
        PageFrameNumber::new(pfn),
        PageProtection::user_rw(),
    )
    .unwrap()
}

/// Sparse fake register file; unwritten bytes read as the low address byte.
#[derive(Clone, Default)]
pub struct Registers {
    bytes: Arc<Mutex<HashMap<u64, u8>>>,
}

impl Registers {
    pub fn peek(&self, pa: u64) -> u8 {
        self.bytes
            .lock()
            .unwrap()
            .get(&pa)
            .copied()
            .unwrap_or(pa.to_le_bytes()[0])
    }
}

impl PhysicalMemory for Registers {
    fn read(&self, pa: PhysicalAddress, buf: &mut [u8]) -> Result<(), VmemError> {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.peek(pa.as_u64() + i as u64);
        }
        Ok(())
    }

    fn write(&self, pa: PhysicalAddress, buf: &[u8]) -> Result<(), VmemError> {
        let mut bytes = self.bytes.lock().unwrap();
        for (i, b) in buf.iter().enumerate() {
            bytes.insert(pa.as_u64() + i as u64, *b);
        }
        Ok(())
    }
}

/// Where a probe is made to fail.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Fault {
    AllocInstance,
    ReserveNumbers,
    RegisterEndpoint,
    CreateClass,
    CreateNode,
}

/// [`MemoryRegistry`] with one injectable failure.
#[derive(Debug, Default)]
pub struct FaultyRegistry {
    pub inner: MemoryRegistry,
    fault: Option<Fault>,
}

impl FaultyRegistry {
    fn fails(&self, fault: Fault) -> bool {
        self.fault == Some(fault)
    }
}

impl DeviceRegistry for FaultyRegistry {
    fn alloc_chrdev_region(
        &mut self,
        first_minor: u32,
        count: u32,
        name: &str,
    ) -> Result<DeviceNumber, RegistryError> {
        if self.fails(Fault::ReserveNumbers) {
            return Err(RegistryError::Busy);
        }
        self.inner.alloc_chrdev_region(first_minor, count, name)
    }

    fn unregister_chrdev_region(&mut self, first: DeviceNumber, count: u32) {
        self.inner.unregister_chrdev_region(first, count);
    }

    fn cdev_add(
        &mut self,
        dev: DeviceNumber,
        count: u32,
        fops: Arc<dyn FileOperations>,
    ) -> Result<(), RegistryError> {
        if self.fails(Fault::RegisterEndpoint) {
            return Err(RegistryError::OutOfMemory);
        }
        self.inner.cdev_add(dev, count, fops)
    }

    fn cdev_del(&mut self, dev: DeviceNumber) {
        self.inner.cdev_del(dev);
    }

    fn class_create(&mut self, name: &str) -> Result<ClassId, RegistryError> {
        if self.fails(Fault::CreateClass) {
            return Err(RegistryError::OutOfMemory);
        }
        self.inner.class_create(name)
    }

    fn class_destroy(&mut self, class: ClassId) {
        self.inner.class_destroy(class);
    }

    fn device_create(
        &mut self,
        class: ClassId,
        dev: DeviceNumber,
        name: &str,
    ) -> Result<(), RegistryError> {
        if self.fails(Fault::CreateNode) {
            return Err(RegistryError::Exists);
        }
        self.inner.device_create(class, dev, name)
    }

    fn device_destroy(&mut self, class: ClassId, dev: DeviceNumber) {
        self.inner.device_destroy(class, dev);
    }
}

/// A host that fails the configured stage.
pub struct FaultyHost {
    registry: FaultyRegistry,
    memory: Registers,
}

impl FaultyHost {
    pub fn new() -> Self {
        Self {
            registry: FaultyRegistry::default(),
            memory: Registers::default(),
        }
    }

    pub fn inject(&mut self, fault: Option<Fault>) {
        self.registry.fault = fault;
    }

    pub fn memory(&self) -> &Registers {
        &self.memory
    }
}

impl DriverHost for FaultyHost {
    type Registry = FaultyRegistry;

    fn registry(&self) -> &FaultyRegistry {
        &self.registry
    }

    fn registry_mut(&mut self) -> &mut FaultyRegistry {
        &mut self.registry
    }

    fn alloc_instance(&mut self) -> Option<Box<periphmem::DriverInstance>> {
        if self.registry.fails(Fault::AllocInstance) {
            return None;
        }
        Some(Box::default())
    }

    fn physical_memory(&self) -> Arc<dyn PhysicalMemory> {
        Arc::new(self.memory.clone())
    }
}
