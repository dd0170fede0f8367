//! # Session Endpoints
//!
//! The operation set the registry dispatches to: `open`, `release` and
//! `mmap`. There is no per-open state; every `mmap` is self-contained.

use crate::config::DriverConfig;
use crate::error::PeriphMemError;
use crate::gate::{AccessGate, Decision};
use crate::instance::DriverInstance;
use crate::mapper::{MappedRegion, MemoryMapper};
use crate::registry::DeviceNumber;
use alloc::sync::{Arc, Weak};
use periphmem_vmem::{UserAddressSpace, VmArea};

/// File operations of a character device.
pub trait FileOperations: Send + Sync {
    /// # Errors
    /// - [`PeriphMemError::UnknownMinor`] if `minor` is not served here.
    /// - [`PeriphMemError::NoDevice`] if the device has been removed.
    fn open(&self, minor: u32) -> Result<(), PeriphMemError>;

    /// # Errors
    /// As for [`FileOperations::open`].
    fn release(&self, minor: u32) -> Result<(), PeriphMemError>;

    /// Map the physical range `vma` asks for (`pgoff`, length) into `aspace`.
    ///
    /// # Errors
    /// - [`PeriphMemError::NoDevice`] if the device has been removed.
    /// - [`PeriphMemError::Denied`] if the range is not authorized.
    /// - [`PeriphMemError::Map`] if installation fails.
    fn mmap(
        &self,
        vma: &mut VmArea,
        aspace: &mut dyn UserAddressSpace,
    ) -> Result<MappedRegion, PeriphMemError>;
}

/// The single endpoint of a bound peripheral block.
///
/// Holds the instance weakly: once [`PeriphMem::remove`](crate::PeriphMem::remove)
/// has dropped the binding, every operation fails with
/// [`PeriphMemError::NoDevice`], even through a handle kept from before.
#[derive(Debug)]
pub struct PeriphMemEndpoint {
    dev: DeviceNumber,
    instance: Weak<DriverInstance>,
    config: DriverConfig,
    mapper: MemoryMapper,
}

impl PeriphMemEndpoint {
    #[must_use]
    pub fn new(
        dev: DeviceNumber,
        instance: &Arc<DriverInstance>,
        config: DriverConfig,
        mapper: MemoryMapper,
    ) -> Self {
        Self {
            dev,
            instance: Arc::downgrade(instance),
            config,
            mapper,
        }
    }

    /// `false` once the binding this endpoint serves has been removed.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.instance.strong_count() > 0
    }

    fn bound(&self) -> Result<Arc<DriverInstance>, PeriphMemError> {
        self.instance.upgrade().ok_or_else(|| {
            log::debug!("{}: endpoint used after remove", self.dev);
            PeriphMemError::NoDevice(self.dev)
        })
    }

    fn check_minor(&self, instance: &DriverInstance, minor: u32) -> Result<(), PeriphMemError> {
        if minor == self.config.minor {
            return Ok(());
        }
        log::error!("{}: Unknown minor device: {minor}", instance.device());
        Err(PeriphMemError::UnknownMinor(minor))
    }
}

impl FileOperations for PeriphMemEndpoint {
    fn open(&self, minor: u32) -> Result<(), PeriphMemError> {
        self.check_minor(&*self.bound()?, minor)
    }

    fn release(&self, minor: u32) -> Result<(), PeriphMemError> {
        self.check_minor(&*self.bound()?, minor)
    }

    fn mmap(
        &self,
        vma: &mut VmArea,
        aspace: &mut dyn UserAddressSpace,
    ) -> Result<MappedRegion, PeriphMemError> {
        let instance = self.bound()?;
        let gate = AccessGate::new(instance.resource(), self.config.windows, self.config.policy);
        let auth = match gate.authorize_request(vma.pgoff(), vma.len()) {
            Decision::Allowed(auth) => auth,
            Decision::Denied(denial) => {
                log::debug!("{}: {denial}", instance.device());
                return Err(denial.into());
            }
        };
        log::debug!(
            "{}: allowed {} ({})",
            instance.device(),
            auth.range(),
            auth.window().unwrap_or("unlisted")
        );
        self.mapper.install(aspace, vma, &auth).map_err(|e| {
            log::debug!("{}: {e}", instance.device());
            PeriphMemError::from(e)
        })
    }
}
