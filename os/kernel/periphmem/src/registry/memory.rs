//! In-memory [`DeviceRegistry`].

use crate::endpoint::FileOperations;
use crate::error::PeriphMemError;
use crate::mapper::MappedRegion;
use crate::registry::{ClassId, DeviceNumber, DeviceRegistry, RegistryError};
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use periphmem_vmem::{UserAddressSpace, VmArea};

/// First dynamically assigned major, counting upwards.
const DYNAMIC_MAJOR_FIRST: u32 = 234;
const DYNAMIC_MAJOR_LAST: u32 = 254;

#[derive(Debug)]
struct Region {
    name: String,
    first_minor: u32,
    count: u32,
}

#[derive(Debug)]
struct Node {
    class: ClassId,
    dev: DeviceNumber,
}

/// In-memory registry.
#[derive(Default)]
pub struct MemoryRegistry {
    regions: BTreeMap<u32, Region>,
    cdevs: BTreeMap<DeviceNumber, Arc<dyn FileOperations>>,
    classes: BTreeMap<ClassId, String>,
    next_class: u32,
    nodes: BTreeMap<String, Node>,
}

impl MemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if nothing is registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
            && self.cdevs.is_empty()
            && self.classes.is_empty()
            && self.nodes.is_empty()
    }

    /// Device number published under node `name`.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<DeviceNumber> {
        self.nodes.get(name).map(|n| n.dev)
    }

    /// The endpoint registered for `dev`.
    #[must_use]
    pub fn endpoint(&self, dev: DeviceNumber) -> Option<Arc<dyn FileOperations>> {
        self.cdevs.get(&dev).cloned()
    }

    #[must_use]
    pub fn region_name(&self, major: u32) -> Option<&str> {
        self.regions.get(&major).map(|r| r.name.as_str())
    }

    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    fn dispatch(&self, dev: DeviceNumber) -> Result<&Arc<dyn FileOperations>, PeriphMemError> {
        self.cdevs.get(&dev).ok_or(PeriphMemError::NoDevice(dev))
    }

    /// # Errors
    /// [`PeriphMemError::NoDevice`] if `dev` has no endpoint, else whatever
    /// the endpoint returns.
    pub fn open(&self, dev: DeviceNumber) -> Result<(), PeriphMemError> {
        self.dispatch(dev)?.open(dev.minor())
    }

    /// # Errors
    /// [`PeriphMemError::NoDevice`] if `dev` has no endpoint, else whatever
    /// the endpoint returns.
    pub fn release(&self, dev: DeviceNumber) -> Result<(), PeriphMemError> {
        self.dispatch(dev)?.release(dev.minor())
    }

    /// # Errors
    /// [`PeriphMemError::NoDevice`] if `dev` has no endpoint, else whatever
    /// the endpoint returns.
    pub fn mmap(
        &self,
        dev: DeviceNumber,
        vma: &mut VmArea,
        aspace: &mut dyn UserAddressSpace,
    ) -> Result<MappedRegion, PeriphMemError> {
        self.dispatch(dev)?.mmap(vma, aspace)
    }
}

impl fmt::Debug for MemoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRegistry")
            .field("regions", &self.regions)
            .field("cdevs", &self.cdevs.keys())
            .field("classes", &self.classes)
            .field("nodes", &self.nodes)
            .finish()
    }
}

impl DeviceRegistry for MemoryRegistry {
    fn alloc_chrdev_region(
        &mut self,
        first_minor: u32,
        count: u32,
        name: &str,
    ) -> Result<DeviceNumber, RegistryError> {
        let major = (DYNAMIC_MAJOR_FIRST..=DYNAMIC_MAJOR_LAST)
            .find(|m| !self.regions.contains_key(m))
            .ok_or(RegistryError::Busy)?;
        self.regions.insert(
            major,
            Region {
                name: String::from(name),
                first_minor,
                count,
            },
        );
        Ok(DeviceNumber::new(major, first_minor))
    }

    fn unregister_chrdev_region(&mut self, first: DeviceNumber, count: u32) {
        if let Some(region) = self.regions.get(&first.major)
            && region.first_minor == first.minor
            && region.count == count
        {
            self.regions.remove(&first.major);
        }
    }

    fn cdev_add(
        &mut self,
        dev: DeviceNumber,
        count: u32,
        fops: Arc<dyn FileOperations>,
    ) -> Result<(), RegistryError> {
        let minors = dev.minor..dev.minor.saturating_add(count);
        if minors
            .clone()
            .any(|m| self.cdevs.contains_key(&DeviceNumber::new(dev.major, m)))
        {
            return Err(RegistryError::Busy);
        }
        for m in minors {
            self.cdevs
                .insert(DeviceNumber::new(dev.major, m), Arc::clone(&fops));
        }
        Ok(())
    }

    fn cdev_del(&mut self, dev: DeviceNumber) {
        let Some(fops) = self.cdevs.remove(&dev) else {
            return;
        };
        // Drop every minor that shares the endpoint.
        self.cdevs
            .retain(|k, v| k.major != dev.major || !Arc::ptr_eq(v, &fops));
    }

    fn class_create(&mut self, name: &str) -> Result<ClassId, RegistryError> {
        if self.classes.values().any(|c| c == name) {
            return Err(RegistryError::Exists);
        }
        let id = ClassId(self.next_class);
        self.next_class = self
            .next_class
            .checked_add(1)
            .ok_or(RegistryError::OutOfMemory)?;
        self.classes.insert(id, String::from(name));
        Ok(id)
    }

    fn class_destroy(&mut self, class: ClassId) {
        self.classes.remove(&class);
    }

    fn device_create(
        &mut self,
        class: ClassId,
        dev: DeviceNumber,
        name: &str,
    ) -> Result<(), RegistryError> {
        if !self.classes.contains_key(&class) {
            return Err(RegistryError::NoSuchDevice);
        }
        if self.nodes.contains_key(name) {
            return Err(RegistryError::Exists);
        }
        self.nodes.insert(String::from(name), Node { class, dev });
        Ok(())
    }

    fn device_destroy(&mut self, class: ClassId, dev: DeviceNumber) {
        self.nodes.retain(|_, n| n.class != class || n.dev != dev);
    }
}
