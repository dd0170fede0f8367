//! # Lifecycle Manager
//!
//! Brings a driver binding up in five stages and tears it down again:
//!
//! | # | Stage | Acquires | Released by |
//! |---|-------|----------|-------------|
//! | 1 | [`ProbeStage::AllocateInstance`] | instance record | drop |
//! | 2 | [`ProbeStage::GetResource`] | nothing | n/a |
//! | 3 | [`ProbeStage::ReserveDeviceNumbers`] | device numbers | `unregister_chrdev_region` |
//! | 4 | [`ProbeStage::RegisterEndpoint`] | endpoint | `cdev_del` |
//! | 5 | [`ProbeStage::PublishNode`] | class, node | `device_destroy`, `class_destroy` |
//!
//! Every acquisition is pushed onto an unwind stack as it happens. A failure
//! pops the stack, so exactly the completed acquisitions are released, newest
//! first. Teardown pops the same stack.

use crate::config::DriverConfig;
use crate::endpoint::PeriphMemEndpoint;
use crate::errno::Errno;
use crate::error::{ProbeError, ProbeStage};
use crate::gate::AccessGate;
use crate::host::DriverHost;
use crate::instance::DriverInstance;
use crate::mapper::MemoryMapper;
use crate::registry::{ClassId, DeviceNumber, DeviceRegistry};
use crate::resource::{self, PlatformDevice, ResourceDescriptor};
use alloc::sync::Arc;
use alloc::vec::Vec;

/// Minors reserved and registered per binding.
const DEVICE_COUNT: u32 = 1;

#[derive(Debug)]
enum Acquisition {
    Instance(Arc<DriverInstance>),
    DeviceNumbers(DeviceNumber),
    Endpoint(DeviceNumber),
    Class(ClassId),
    Node(ClassId, DeviceNumber),
}

impl Acquisition {
    const fn stage(&self) -> ProbeStage {
        match self {
            Self::Instance(_) => ProbeStage::AllocateInstance,
            Self::DeviceNumbers(_) => ProbeStage::ReserveDeviceNumbers,
            Self::Endpoint(_) => ProbeStage::RegisterEndpoint,
            Self::Class(_) | Self::Node(..) => ProbeStage::PublishNode,
        }
    }

    fn release<R: DeviceRegistry + ?Sized>(self, registry: &mut R) {
        match self {
            Self::Instance(instance) => drop(instance),
            Self::DeviceNumbers(dev) => registry.unregister_chrdev_region(dev, DEVICE_COUNT),
            Self::Endpoint(dev) => registry.cdev_del(dev),
            Self::Class(class) => registry.class_destroy(class),
            Self::Node(class, dev) => registry.device_destroy(class, dev),
        }
    }
}

#[derive(Debug, Default)]
struct Unwind {
    stack: Vec<Acquisition>,
}

impl Unwind {
    fn push(&mut self, acquisition: Acquisition) {
        self.stack.push(acquisition);
    }

    fn release_all<R: DeviceRegistry + ?Sized>(mut self, registry: &mut R, device: &str) {
        while let Some(acquisition) = self.stack.pop() {
            log::debug!("{device}: undo {}: {acquisition:?}", acquisition.stage());
            acquisition.release(registry);
        }
    }

    fn abort<R: DeviceRegistry + ?Sized>(
        self,
        registry: &mut R,
        device: &str,
        stage: ProbeStage,
        errno: Errno,
    ) -> ProbeError {
        let err = failed(device, stage, errno);
        self.release_all(registry, device);
        err
    }
}

fn failed(device: &str, stage: ProbeStage, errno: Errno) -> ProbeError {
    let err = ProbeError::new(stage, errno);
    log::error!("{device}: {err}");
    err
}

/// An active driver binding.
///
/// Only [`PeriphMem::remove`] releases what [`PeriphMem::probe`] acquired.
#[must_use = "an active binding must be released with `PeriphMem::remove`"]
#[derive(Debug)]
pub struct PeriphMem {
    instance: Arc<DriverInstance>,
    dev: DeviceNumber,
    config: DriverConfig,
    unwind: Unwind,
}

impl PeriphMem {
    /// Bind `config` to `pdev`, registering the endpoint with `host`.
    ///
    /// # Errors
    /// A [`ProbeError`] naming the failed stage. `host` is left as it was
    /// before the call.
    pub fn probe<H, P>(host: &mut H, pdev: &P, config: &DriverConfig) -> Result<Self, ProbeError>
    where
        H: DriverHost + ?Sized,
        P: PlatformDevice + ?Sized,
    {
        let name = pdev.name();
        log::debug!("{name}: probing {}", config.driver_name);

        let Some(mut instance) = host.alloc_instance() else {
            return Err(failed(name, ProbeStage::AllocateInstance, Errno::OutOfMemory));
        };

        let Some(resource) = resource::lookup(pdev, config) else {
            drop(instance);
            return Err(failed(name, ProbeStage::GetResource, Errno::NoEntry));
        };
        instance.bind(name, resource);
        let instance: Arc<DriverInstance> = Arc::from(instance);

        let mut unwind = Unwind::default();
        unwind.push(Acquisition::Instance(Arc::clone(&instance)));

        let dev = match host.registry_mut().alloc_chrdev_region(
            config.minor,
            DEVICE_COUNT,
            config.device_name,
        ) {
            Ok(dev) => dev,
            Err(e) => {
                let stage = ProbeStage::ReserveDeviceNumbers;
                return Err(unwind.abort(host.registry_mut(), name, stage, e.errno()));
            }
        };
        unwind.push(Acquisition::DeviceNumbers(dev));

        let endpoint = Arc::new(PeriphMemEndpoint::new(
            dev,
            &instance,
            *config,
            MemoryMapper::new(host.physical_memory()),
        ));
        if let Err(e) = host.registry_mut().cdev_add(dev, DEVICE_COUNT, endpoint) {
            let stage = ProbeStage::RegisterEndpoint;
            return Err(unwind.abort(host.registry_mut(), name, stage, e.errno()));
        }
        unwind.push(Acquisition::Endpoint(dev));

        let class = match host.registry_mut().class_create(config.device_name) {
            Ok(class) => class,
            Err(e) => {
                let stage = ProbeStage::PublishNode;
                return Err(unwind.abort(host.registry_mut(), name, stage, e.errno()));
            }
        };
        unwind.push(Acquisition::Class(class));
        if let Err(e) = host
            .registry_mut()
            .device_create(class, dev, config.device_name)
        {
            let stage = ProbeStage::PublishNode;
            return Err(unwind.abort(host.registry_mut(), name, stage, e.errno()));
        }
        unwind.push(Acquisition::Node(class, dev));

        log::info!(
            "{name}: Initialised: Registers at {:#010x}",
            resource.base().as_u64()
        );
        Ok(Self {
            instance,
            dev,
            config: *config,
            unwind,
        })
    }

    /// Release every stage in reverse order.
    ///
    /// The endpoint only holds the instance weakly, so handles to it taken
    /// from the registry stop working here too.
    pub fn remove<H: DriverHost + ?Sized>(self, host: &mut H) {
        let Self {
            instance, unwind, ..
        } = self;
        unwind.release_all(host.registry_mut(), instance.device());
        log::info!("{}: Peripheral mem driver removed - OK", instance.device());
    }

    #[must_use]
    pub const fn device_number(&self) -> DeviceNumber {
        self.dev
    }

    #[must_use]
    pub fn resource(&self) -> ResourceDescriptor {
        self.instance.resource()
    }

    /// The gate the endpoint applies to mapping requests.
    #[must_use]
    pub fn gate(&self) -> AccessGate<'static> {
        AccessGate::new(self.resource(), self.config.windows, self.config.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimHost;
    use crate::resource::StaticPlatformDevice;
    use periphmem_addresses::PhysicalAddress;
    use periphmem_vmem::{PhysicalMemory, VmemError};

    struct Unbacked;

    impl PhysicalMemory for Unbacked {
        fn read(&self, pa: PhysicalAddress, _buf: &mut [u8]) -> Result<(), VmemError> {
            Err(VmemError::PhysicalAccess(pa))
        }

        fn write(&self, pa: PhysicalAddress, _buf: &[u8]) -> Result<(), VmemError> {
            Err(VmemError::PhysicalAccess(pa))
        }
    }

    fn pdev() -> StaticPlatformDevice {
        StaticPlatformDevice::new("3f000000.periphmem", "brcm,bcm2835-periphmem")
            .with_memory(0x3F00_0000, 0x3F30_0000)
    }

    #[test]
    fn probe_publishes_node_and_remove_clears_registry() {
        let mut host = SimHost::new(Arc::new(Unbacked));
        let drv = PeriphMem::probe(&mut host, &pdev(), &DriverConfig::BCM2835).unwrap();

        assert_eq!(host.registry().node("periphmem"), Some(drv.device_number()));
        assert_eq!(drv.device_number().minor(), 0);
        assert_eq!(drv.resource().base().as_u64(), 0x3F00_0000);
        assert!(host.registry().open(drv.device_number()).is_ok());

        drv.remove(&mut host);
        assert!(host.registry().is_empty());
    }

    #[test]
    fn missing_resource_fails_stage_two() {
        let mut host = SimHost::new(Arc::new(Unbacked));
        let pdev = StaticPlatformDevice::new("soc:periphmem", "brcm,bcm2835-periphmem");
        let err = PeriphMem::probe(&mut host, &pdev, &DriverConfig::BCM2835).unwrap_err();
        assert_eq!(err, ProbeError::new(ProbeStage::GetResource, Errno::NoEntry));
        assert!(host.registry().is_empty());
    }

    #[test]
    fn unwind_releases_newest_first() {
        #[derive(Default)]
        struct Journal(Vec<&'static str>);

        impl DeviceRegistry for Journal {
            fn alloc_chrdev_region(
                &mut self,
                _first_minor: u32,
                _count: u32,
                _name: &str,
            ) -> Result<DeviceNumber, crate::RegistryError> {
                unreachable!()
            }
            fn unregister_chrdev_region(&mut self, _first: DeviceNumber, _count: u32) {
                self.0.push("numbers");
            }
            fn cdev_add(
                &mut self,
                _dev: DeviceNumber,
                _count: u32,
                _fops: Arc<dyn crate::FileOperations>,
            ) -> Result<(), crate::RegistryError> {
                unreachable!()
            }
            fn cdev_del(&mut self, _dev: DeviceNumber) {
                self.0.push("endpoint");
            }
            fn class_create(&mut self, _name: &str) -> Result<ClassId, crate::RegistryError> {
                unreachable!()
            }
            fn class_destroy(&mut self, _class: ClassId) {
                self.0.push("class");
            }
            fn device_create(
                &mut self,
                _class: ClassId,
                _dev: DeviceNumber,
                _name: &str,
            ) -> Result<(), crate::RegistryError> {
                unreachable!()
            }
            fn device_destroy(&mut self, _class: ClassId, _dev: DeviceNumber) {
                self.0.push("node");
            }
        }

        let dev = DeviceNumber::new(240, 0);
        let class = ClassId(7);
        let mut unwind = Unwind::default();
        unwind.push(Acquisition::Instance(Arc::new(DriverInstance::empty())));
        unwind.push(Acquisition::DeviceNumbers(dev));
        unwind.push(Acquisition::Endpoint(dev));
        unwind.push(Acquisition::Class(class));
        unwind.push(Acquisition::Node(class, dev));

        let mut journal = Journal::default();
        unwind.release_all(&mut journal, "test");
        assert_eq!(journal.0, ["node", "class", "endpoint", "numbers"]);
    }
}
