use crate::errno::Errno;
use crate::gate::Denial;
use crate::mapper::MapError;
use crate::registry::DeviceNumber;
use core::fmt;

/// Errors returned to callers of the endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriphMemError {
    #[error("Unknown minor device: {0}")]
    UnknownMinor(u32),
    #[error("no device at {0}")]
    NoDevice(DeviceNumber),
    #[error("mapping denied: {0}")]
    Denied(#[from] Denial),
    #[error(transparent)]
    Map(#[from] MapError),
}

impl PeriphMemError {
    #[must_use]
    pub const fn errno(&self) -> Errno {
        match self {
            Self::UnknownMinor(_) | Self::NoDevice(_) => Errno::NoDeviceOrAddress,
            Self::Denied(_) => Errno::InvalidArgument,
            Self::Map(e) => e.errno(),
        }
    }
}

/// Initialization stages, in acquisition order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ProbeStage {
    AllocateInstance = 1,
    GetResource = 2,
    ReserveDeviceNumbers = 3,
    RegisterEndpoint = 4,
    PublishNode = 5,
}

impl ProbeStage {
    pub const ALL: [Self; 5] = [
        Self::AllocateInstance,
        Self::GetResource,
        Self::ReserveDeviceNumbers,
        Self::RegisterEndpoint,
        Self::PublishNode,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllocateInstance => "allocate instance",
            Self::GetResource => "get IO resource",
            Self::ReserveDeviceNumbers => "reserve device numbers",
            Self::RegisterEndpoint => "register endpoint",
            Self::PublishNode => "publish device node",
        }
    }
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed initialization. Every earlier stage has been rolled back.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to {stage}: {errno}")]
pub struct ProbeError {
    pub stage: ProbeStage,
    pub errno: Errno,
}

impl ProbeError {
    #[must_use]
    pub const fn new(stage: ProbeStage, errno: Errno) -> Self {
        Self { stage, errno }
    }
}
