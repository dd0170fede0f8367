use core::fmt;

/// Error numbers surfaced to callers and to the host framework.
///
/// Values match Linux so that [`Errno::as_neg`] can be returned verbatim
/// from a file operation.
#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Errno {
    /// `EPERM`
    NotPermitted = 1,
    /// `ENOENT`
    NoEntry = 2,
    /// `ENXIO`
    NoDeviceOrAddress = 6,
    /// `EAGAIN`
    TryAgain = 11,
    /// `ENOMEM`
    OutOfMemory = 12,
    /// `EBUSY`
    Busy = 16,
    /// `EEXIST`
    Exists = 17,
    /// `EINVAL`
    InvalidArgument = 22,
}

impl Errno {
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Kernel-style negative return code, e.g. `-22` for `EINVAL`.
    #[inline]
    #[must_use]
    pub const fn as_neg(self) -> i32 {
        -(self as i32)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NotPermitted => "EPERM",
            Self::NoEntry => "ENOENT",
            Self::NoDeviceOrAddress => "ENXIO",
            Self::TryAgain => "EAGAIN",
            Self::OutOfMemory => "ENOMEM",
            Self::Busy => "EBUSY",
            Self::Exists => "EEXIST",
            Self::InvalidArgument => "EINVAL",
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_i32())
    }
}
