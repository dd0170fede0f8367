//! # Resource Descriptor and Platform Resource Provider
//!
//! The platform (device tree, ACPI, board file) describes the peripheral
//! block as a memory resource `[start, end]` with an **inclusive** end, the
//! way `struct resource` does. [`ResourceDescriptor`] keeps that convention.

use crate::config::DriverConfig;
use alloc::string::String;
use alloc::vec::Vec;
use periphmem_addresses::{PhysicalAddress, PhysicalRange};

/// Immutable bounds of the peripheral block.
///
/// ### Invariants
/// - `base <= limit`; both are inclusive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ResourceDescriptor {
    base: PhysicalAddress,
    limit: PhysicalAddress,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("resource base {base} lies above its limit {limit}")]
    Inverted {
        base: PhysicalAddress,
        limit: PhysicalAddress,
    },
}

impl ResourceDescriptor {
    /// Placeholder held by a freshly allocated instance until the platform
    /// resource is known. Contains only address zero.
    pub(crate) const ZEROED: Self = Self {
        base: PhysicalAddress::new(0),
        limit: PhysicalAddress::new(0),
    };

    /// # Errors
    /// [`ResourceError::Inverted`] if `base > limit`.
    pub const fn new(base: PhysicalAddress, limit: PhysicalAddress) -> Result<Self, ResourceError> {
        if base.as_u64() > limit.as_u64() {
            return Err(ResourceError::Inverted { base, limit });
        }
        Ok(Self { base, limit })
    }

    /// First address of the block (inclusive).
    #[inline]
    #[must_use]
    pub const fn base(&self) -> PhysicalAddress {
        self.base
    }

    /// Last address of the block (inclusive).
    #[inline]
    #[must_use]
    pub const fn limit(&self) -> PhysicalAddress {
        self.limit
    }

    /// `true` if `range` starts at or above `base` and its exclusive end does
    /// not pass `limit`.
    #[inline]
    #[must_use]
    pub const fn contains(&self, range: PhysicalRange) -> bool {
        range.start().as_u64() >= self.base.as_u64() && range.end().as_u64() <= self.limit.as_u64()
    }
}

/// The platform's description of one device, keyed by its compatible string.
pub trait PlatformDevice {
    /// Device name, used as the prefix of every diagnostic.
    fn name(&self) -> &str;

    /// Compatible string of the matched hardware description.
    fn compatible(&self) -> &str;

    /// The `index`-th memory resource as inclusive `(start, end)`.
    fn memory_resource(&self, index: usize) -> Option<(PhysicalAddress, PhysicalAddress)>;
}

/// Look up the peripheral block of `pdev` if `config` binds to it.
///
/// `None` if the description does not match, has no memory resource, or the
/// resource is malformed.
#[must_use]
pub fn lookup<P: PlatformDevice + ?Sized>(
    pdev: &P,
    config: &DriverConfig,
) -> Option<ResourceDescriptor> {
    if !config.matches(pdev) {
        log::debug!(
            "{}: not a {} device (compatible {:?})",
            pdev.name(),
            config.driver_name,
            pdev.compatible()
        );
        return None;
    }
    let (start, end) = pdev.memory_resource(0)?;
    match ResourceDescriptor::new(start, end) {
        Ok(res) => Some(res),
        Err(e) => {
            log::debug!("{}: {e}", pdev.name());
            None
        }
    }
}

/// A platform device described statically, e.g. by a board file.
#[derive(Debug, Clone)]
pub struct StaticPlatformDevice {
    name: String,
    compatible: String,
    memory: Vec<(PhysicalAddress, PhysicalAddress)>,
}

impl StaticPlatformDevice {
    #[must_use]
    pub fn new(name: &str, compatible: &str) -> Self {
        Self {
            name: String::from(name),
            compatible: String::from(compatible),
            memory: Vec::new(),
        }
    }

    /// Add a memory resource `[start, end]` (inclusive end).
    #[must_use]
    pub fn with_memory(mut self, start: u64, end: u64) -> Self {
        self.memory
            .push((PhysicalAddress::new(start), PhysicalAddress::new(end)));
        self
    }
}

impl PlatformDevice for StaticPlatformDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn compatible(&self) -> &str {
        &self.compatible
    }

    fn memory_resource(&self, index: usize) -> Option<(PhysicalAddress, PhysicalAddress)> {
        self.memory.get(index).copied()
    }
}
