//! # Device Registry
//!
//! The host framework's bookkeeping for character devices: device-number
//! regions, registered endpoints, device classes and published nodes.
//! [`DeviceRegistry`] is what the lifecycle consumes. With the `sim` feature,
//! `MemoryRegistry` is a complete in-memory implementation that also
//! dispatches file operations by device number.

#[cfg(any(test, feature = "sim"))]
mod memory;

#[cfg(any(test, feature = "sim"))]
pub use crate::registry::memory::MemoryRegistry;
use crate::endpoint::FileOperations;
use crate::errno::Errno;
use alloc::sync::Arc;
use core::fmt;

/// A `(major, minor)` pair.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DeviceNumber {
    major: u32,
    minor: u32,
}

impl DeviceNumber {
    #[inline]
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    #[inline]
    #[must_use]
    pub const fn major(self) -> u32 {
        self.major
    }

    #[inline]
    #[must_use]
    pub const fn minor(self) -> u32 {
        self.minor
    }
}

impl fmt::Debug for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev({}:{})", self.major, self.minor)
    }
}

impl fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// Handle to a device class.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClassId(pub(crate) u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("no free device numbers")]
    Busy,
    #[error("out of memory")]
    OutOfMemory,
    #[error("already exists")]
    Exists,
    #[error("no such device")]
    NoSuchDevice,
}

impl RegistryError {
    #[must_use]
    pub const fn errno(&self) -> Errno {
        match self {
            Self::Busy => Errno::Busy,
            Self::OutOfMemory => Errno::OutOfMemory,
            Self::Exists => Errno::Exists,
            Self::NoSuchDevice => Errno::NoDeviceOrAddress,
        }
    }
}

/// Character-device registration services of the host.
///
/// The release methods tolerate handles that are already gone.
pub trait DeviceRegistry {
    /// Reserve `count` minors starting at `first_minor` under a dynamic major.
    ///
    /// # Errors
    /// [`RegistryError::Busy`] if no major is free.
    fn alloc_chrdev_region(
        &mut self,
        first_minor: u32,
        count: u32,
        name: &str,
    ) -> Result<DeviceNumber, RegistryError>;

    fn unregister_chrdev_region(&mut self, first: DeviceNumber, count: u32);

    /// Make `fops` reachable through `count` device numbers starting at `dev`.
    ///
    /// # Errors
    /// [`RegistryError::Busy`] if one of the numbers already has an endpoint.
    fn cdev_add(
        &mut self,
        dev: DeviceNumber,
        count: u32,
        fops: Arc<dyn FileOperations>,
    ) -> Result<(), RegistryError>;

    fn cdev_del(&mut self, dev: DeviceNumber);

    /// # Errors
    /// [`RegistryError::Exists`] if a class of that name exists.
    fn class_create(&mut self, name: &str) -> Result<ClassId, RegistryError>;

    fn class_destroy(&mut self, class: ClassId);

    /// Publish a node `name` for `dev` in `class`.
    ///
    /// # Errors
    /// - [`RegistryError::NoSuchDevice`] if `class` does not exist.
    /// - [`RegistryError::Exists`] if a node of that name exists.
    fn device_create(
        &mut self,
        class: ClassId,
        dev: DeviceNumber,
        name: &str,
    ) -> Result<(), RegistryError>;

    fn device_destroy(&mut self, class: ClassId, dev: DeviceNumber);
}
