//! # Whitelisted Peripheral Register Mapping
//!
//! A character-device driver that lets callers `mmap` a narrow set of
//! physical peripheral register pages (on the BCM2835: clock manager, GPIO,
//! PCM, PWM) instead of the whole peripheral block.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`gate`] | Pure allow/deny decision over block bounds and whitelist windows. |
//! | [`mapper`] | Installs an authorized range into the caller's page tables, uncached, all or nothing. |
//! | [`lifecycle`] | Five-stage probe with exact reverse rollback; teardown. |
//! | [`endpoint`] | `open` / `release` / `mmap` as dispatched by the registry. |
//! | [`registry`] | Host device-number, endpoint, class and node bookkeeping. |
//!
//! The default `sim` feature adds [`SimHost`] and [`MemoryRegistry`], an
//! in-memory host used by the example below and the tests.
//!
//! ## Flow
//!
//! ```text
//!  probe ─► DriverInstance { resource } ─► PeriphMemEndpoint ─► DeviceRegistry
//!                                                │
//!  mmap(vma) ─► AccessGate::authorize ─► Authorization ─► MemoryMapper::install
//! ```
//!
//! ## Example
//!
//! ```rust
//! # use std::sync::Arc;
//! # use periphmem::*;
//! # use periphmem::vmem::{PageProtection, PhysicalMemory, SoftAddressSpace, VmArea, VmemError};
//! # use periphmem::addresses::{PageFrameNumber, PhysicalAddress, VirtualAddress};
//! # struct Bus;
//! # impl PhysicalMemory for Bus {
//! #     fn read(&self, _: PhysicalAddress, b: &mut [u8]) -> Result<(), VmemError> { b.fill(0); Ok(()) }
//! #     fn write(&self, _: PhysicalAddress, _: &[u8]) -> Result<(), VmemError> { Ok(()) }
//! # }
//! let mut host = SimHost::new(Arc::new(Bus));
//! let pdev = StaticPlatformDevice::new("3f000000.periphmem", "brcm,bcm2835-periphmem")
//!     .with_memory(0x3F00_0000, 0x3F30_0000);
//! let drv = PeriphMem::probe(&mut host, &pdev, &DriverConfig::BCM2835).unwrap();
//!
//! let dev = host.registry().node("periphmem").unwrap();
//! let mut aspace = SoftAddressSpace::unbounded();
//! let mut vma = VmArea::new(
//!     VirtualAddress::new(0x7000_0000),
//!     4096,
//!     PageFrameNumber::new(0x3F200), // GPIO
//!     PageProtection::user_rw(),
//! )
//! .unwrap();
//! host.registry().mmap(dev, &mut vma, &mut aspace).unwrap();
//!
//! drv.remove(&mut host);
//! assert!(host.registry().is_empty());
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod config;
pub mod endpoint;
mod errno;
mod error;
pub mod gate;
mod host;
mod instance;
pub mod lifecycle;
pub mod mapper;
pub mod registry;
mod resource;

pub use crate::config::DriverConfig;
pub use crate::endpoint::{FileOperations, PeriphMemEndpoint};
pub use crate::errno::Errno;
pub use crate::error::{PeriphMemError, ProbeError, ProbeStage};
pub use crate::gate::{
    AccessGate, Authorization, BCM2835_WINDOWS, Decision, Denial, WhitelistPolicy,
    WhitelistWindow,
};
pub use crate::host::DriverHost;
#[cfg(feature = "sim")]
pub use crate::host::SimHost;
pub use crate::instance::DriverInstance;
pub use crate::lifecycle::PeriphMem;
pub use crate::mapper::{MapError, MappedRegion, MemoryMapper, device_memory_protection};
#[cfg(feature = "sim")]
pub use crate::registry::MemoryRegistry;
pub use crate::registry::{ClassId, DeviceNumber, DeviceRegistry, RegistryError};
pub use crate::resource::{PlatformDevice, ResourceDescriptor, ResourceError, StaticPlatformDevice};

pub use periphmem_addresses as addresses;
pub use periphmem_vmem as vmem;
