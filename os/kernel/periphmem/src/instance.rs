use crate::resource::ResourceDescriptor;
use alloc::string::String;

/// Per-binding state, shared read-only with the endpoint once probe has
/// filled it in.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DriverInstance {
    device: String,
    resource: ResourceDescriptor,
}

impl DriverInstance {
    /// An empty record, as handed out by the host allocator.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            device: String::new(),
            resource: ResourceDescriptor::ZEROED,
        }
    }

    #[must_use]
    pub fn bound(device: &str, resource: ResourceDescriptor) -> Self {
        let mut instance = Self::empty();
        instance.bind(device, resource);
        instance
    }

    pub(crate) fn bind(&mut self, device: &str, resource: ResourceDescriptor) {
        self.device.clear();
        self.device.push_str(device);
        self.resource = resource;
    }

    /// Name of the platform device, prefixed to diagnostics.
    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    #[must_use]
    pub const fn resource(&self) -> ResourceDescriptor {
        self.resource
    }
}

impl Default for DriverInstance {
    fn default() -> Self {
        Self::empty()
    }
}
