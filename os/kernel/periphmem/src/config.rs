use crate::gate::{BCM2835_WINDOWS, WhitelistPolicy, WhitelistWindow};
use crate::resource::PlatformDevice;

/// Static identity and policy of one driver binding.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DriverConfig {
    /// Name of the device numbers, the class and the published node.
    pub device_name: &'static str,
    pub driver_name: &'static str,
    /// Compatible string of the hardware description this driver binds to.
    pub compatible: &'static str,
    /// The one minor the endpoint answers to.
    pub minor: u32,
    pub windows: &'static [WhitelistWindow],
    pub policy: WhitelistPolicy,
}

impl DriverConfig {
    /// Raspberry Pi (BCM2835/6/7) peripheral block.
    pub const BCM2835: Self = Self {
        device_name: "periphmem",
        driver_name: "periphmem-bcm2835",
        compatible: "brcm,bcm2835-periphmem",
        minor: 0,
        windows: &BCM2835_WINDOWS,
        policy: if cfg!(feature = "literal-whitelist") {
            WhitelistPolicy::Literal
        } else {
            WhitelistPolicy::AnyWindow
        },
    };

    #[must_use]
    pub const fn with_policy(mut self, policy: WhitelistPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Whether `pdev` describes hardware this configuration binds to.
    #[must_use]
    pub fn matches<P: PlatformDevice + ?Sized>(&self, pdev: &P) -> bool {
        pdev.compatible() == self.compatible
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::BCM2835
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::StaticPlatformDevice;

    #[test]
    fn bcm2835_identity() {
        let cfg = DriverConfig::default();
        assert_eq!(cfg.device_name, "periphmem");
        assert_eq!(cfg.driver_name, "periphmem-bcm2835");
        assert_eq!(cfg.minor, 0);
        assert_eq!(cfg.windows.len(), 4);
        assert_eq!(cfg.policy, WhitelistPolicy::default());
    }

    #[test]
    fn matches_on_compatible_only() {
        let cfg = DriverConfig::BCM2835;
        assert!(cfg.matches(&StaticPlatformDevice::new("a", "brcm,bcm2835-periphmem")));
        assert!(!cfg.matches(&StaticPlatformDevice::new("a", "brcm,bcm2835-gpio")));
    }

    #[test]
    fn policy_override() {
        let cfg = DriverConfig::BCM2835.with_policy(WhitelistPolicy::Literal);
        assert_eq!(cfg.policy, WhitelistPolicy::Literal);
        assert_eq!(cfg.compatible, DriverConfig::BCM2835.compatible);
    }
}
