use crate::instance::DriverInstance;
use crate::registry::DeviceRegistry;
#[cfg(any(test, feature = "sim"))]
use crate::registry::MemoryRegistry;
use alloc::boxed::Box;
use alloc::sync::Arc;
use periphmem_vmem::PhysicalMemory;

/// Services the host framework lends the driver during probe and remove.
pub trait DriverHost {
    type Registry: DeviceRegistry;

    fn registry(&self) -> &Self::Registry;

    fn registry_mut(&mut self) -> &mut Self::Registry;

    /// Allocate an empty instance record; `None` when out of memory.
    fn alloc_instance(&mut self) -> Option<Box<DriverInstance>> {
        Some(Box::default())
    }

    /// Byte access to physical memory, for debugger access to mapped pages.
    fn physical_memory(&self) -> Arc<dyn PhysicalMemory>;
}

/// A host backed by [`MemoryRegistry`].
#[cfg(any(test, feature = "sim"))]
pub struct SimHost {
    registry: MemoryRegistry,
    memory: Arc<dyn PhysicalMemory>,
}

#[cfg(any(test, feature = "sim"))]
impl SimHost {
    #[must_use]
    pub fn new(memory: Arc<dyn PhysicalMemory>) -> Self {
        Self {
            registry: MemoryRegistry::new(),
            memory,
        }
    }
}

#[cfg(any(test, feature = "sim"))]
impl DriverHost for SimHost {
    type Registry = MemoryRegistry;

    fn registry(&self) -> &MemoryRegistry {
        &self.registry
    }

    fn registry_mut(&mut self) -> &mut MemoryRegistry {
        &mut self.registry
    }

    fn physical_memory(&self) -> Arc<dyn PhysicalMemory> {
        Arc::clone(&self.memory)
    }
}

#[cfg(any(test, feature = "sim"))]
impl core::fmt::Debug for SimHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimHost")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
