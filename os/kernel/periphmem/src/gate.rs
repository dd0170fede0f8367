//! # Access Gate
//!
//! Decides whether a requested physical range may be handed to a caller.
//!
//! Two checks compose with AND:
//!
//! 1. **Bounds**: the range must start at or above the block base and its
//!    exclusive end must not pass the (inclusive) block limit.
//! 2. **Whitelist**: the range, translated to offsets from the base, must
//!    satisfy the configured [`WhitelistPolicy`] over the window table.
//!
//! ```text
//!  base                                                          limit
//!   │ clk 0x101000 │      │ gpio 0x200000 │ pcm 0x203000 │ pwm 0x20c000 │
//!   ├──────────────┼──...─┼───────────────┼──────────────┼──────────────┤
//!          ▲                      ▲
//!          │                      └── [0x3F200000, 0x3F201000) allowed
//!          └── one page each
//! ```
//!
//! The gate is pure: no side effects, no interior state, `Copy`.

use crate::resource::ResourceDescriptor;
use core::fmt;
use periphmem_addresses::{OffsetRange, PageFrameNumber, PageSize, PhysicalRange, Size4K};

/// A single-page sub-block of the peripheral block considered safe to expose.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct WhitelistWindow {
    pub name: &'static str,
    /// Offset from the block base.
    pub offset: u64,
    pub size: u64,
}

impl WhitelistWindow {
    #[must_use]
    pub const fn page(name: &'static str, offset: u64) -> Self {
        Self {
            name,
            offset,
            size: Size4K::SIZE,
        }
    }

    /// `window.offset <= start && end <= window.offset + window.size`
    #[inline]
    #[must_use]
    pub const fn contains(&self, range: OffsetRange) -> bool {
        range.within(self.offset, self.size)
    }
}

/// BCM2835 clock manager, GPIO, PCM and PWM register pages.
pub const BCM2835_WINDOWS: [WhitelistWindow; 4] = [
    WhitelistWindow::page("clk", 0x0010_1000),
    WhitelistWindow::page("gpio", 0x0020_0000),
    WhitelistWindow::page("pcm", 0x0020_3000),
    WhitelistWindow::page("pwm", 0x0020_C000),
];

/// How the window tests combine.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum WhitelistPolicy {
    /// Allowed iff the range lies inside any one window.
    #[cfg_attr(not(feature = "literal-whitelist"), default)]
    AnyWindow,
    /// Denied iff the range lies outside the first two windows and inside
    /// every remaining one. With the BCM2835 table this never denies a
    /// single contiguous range, so every in-bounds request passes.
    #[cfg_attr(feature = "literal-whitelist", default)]
    Literal,
}

impl WhitelistPolicy {
    /// Returns the window that admitted `range`, `Ok(None)` if the policy
    /// admitted it without a matching window.
    fn admit(
        self,
        windows: &[WhitelistWindow],
        range: OffsetRange,
    ) -> Result<Option<&WhitelistWindow>, ()> {
        let matched = windows.iter().find(|w| w.contains(range));
        match self {
            Self::AnyWindow => matched.map(Some).ok_or(()),
            Self::Literal => {
                let (head, tail) = windows.split_at(windows.len().min(2));
                let deny = !head.iter().any(|w| w.contains(range))
                    && !tail.is_empty()
                    && tail.iter().all(|w| w.contains(range));
                if deny { Err(()) } else { Ok(matched) }
            }
        }
    }
}

impl fmt::Display for WhitelistPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyWindow => f.write_str("any-window"),
            Self::Literal => f.write_str("literal"),
        }
    }
}

/// Why a request was refused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, thiserror::Error)]
pub enum Denial {
    #[error("range {0} lies outside the peripheral block")]
    OutOfBounds(PhysicalRange),
    #[error("request for page {pfn:?} with length {len:#x} overflows the physical address space")]
    Overflow { pfn: PageFrameNumber, len: u64 },
    #[error("range {0} is not inside a whitelisted window")]
    NotWhitelisted(PhysicalRange),
}

/// Proof that the gate allowed a range.
///
/// Only [`AccessGate`] constructs it; the mapper refuses to install a range
/// that differs from the one recorded here.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Authorization {
    range: PhysicalRange,
    window: Option<&'static str>,
}

impl Authorization {
    #[inline]
    #[must_use]
    pub const fn range(&self) -> PhysicalRange {
        self.range
    }

    /// Name of the window that admitted the range, if one did.
    #[inline]
    #[must_use]
    pub const fn window(&self) -> Option<&'static str> {
        self.window
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Decision {
    Allowed(Authorization),
    Denied(Denial),
}

impl Decision {
    #[inline]
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    /// # Errors
    /// The [`Denial`] if the range was refused.
    #[inline]
    pub const fn into_result(self) -> Result<Authorization, Denial> {
        match self {
            Self::Allowed(auth) => Ok(auth),
            Self::Denied(denial) => Err(denial),
        }
    }
}

/// Pure decision function over immutable inputs.
#[derive(Copy, Clone, Debug)]
pub struct AccessGate<'a> {
    resource: ResourceDescriptor,
    windows: &'a [WhitelistWindow],
    policy: WhitelistPolicy,
}

impl<'a> AccessGate<'a> {
    #[must_use]
    pub const fn new(
        resource: ResourceDescriptor,
        windows: &'a [WhitelistWindow],
        policy: WhitelistPolicy,
    ) -> Self {
        Self {
            resource,
            windows,
            policy,
        }
    }

    /// Decide on a request expressed as page index and byte length.
    #[must_use]
    pub fn authorize_request(&self, pfn: PageFrameNumber, len: u64) -> Decision {
        let range = pfn
            .checked_base::<Size4K>()
            .and_then(|start| PhysicalRange::from_len(start, len));
        match range {
            Some(range) => self.authorize(range),
            None => Decision::Denied(Denial::Overflow { pfn, len }),
        }
    }

    #[must_use]
    pub fn authorize(&self, range: PhysicalRange) -> Decision {
        if !self.resource.contains(range) {
            return Decision::Denied(Denial::OutOfBounds(range));
        }
        let Some(offsets) = range.offset_from(self.resource.base()) else {
            return Decision::Denied(Denial::OutOfBounds(range));
        };
        match self.policy.admit(self.windows, offsets) {
            Ok(window) => Decision::Allowed(Authorization {
                range,
                window: window.map(|w| w.name),
            }),
            Err(()) => Decision::Denied(Denial::NotWhitelisted(range)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use periphmem_addresses::PhysicalAddress;

    const BASE: u64 = 0x3F00_0000;
    const LIMIT: u64 = 0x3F30_0000;

    fn gate(policy: WhitelistPolicy) -> AccessGate<'static> {
        let res =
            ResourceDescriptor::new(PhysicalAddress::new(BASE), PhysicalAddress::new(LIMIT)).unwrap();
        AccessGate::new(res, &BCM2835_WINDOWS, policy)
    }

    fn gate_any() -> AccessGate<'static> {
        gate(WhitelistPolicy::AnyWindow)
    }

    fn range(start: u64, len: u64) -> PhysicalRange {
        PhysicalRange::from_len(PhysicalAddress::new(start), len).unwrap()
    }

    #[test]
    fn gpio_page_is_allowed() {
        let auth = gate(WhitelistPolicy::AnyWindow)
            .authorize(range(0x3F20_0000, 0x1000))
            .into_result()
            .unwrap();
        assert_eq!(auth.window(), Some("gpio"));
        assert_eq!(auth.range(), range(0x3F20_0000, 0x1000));
    }

    #[test]
    fn every_window_admits_its_own_page() {
        let gate = gate(WhitelistPolicy::AnyWindow);
        for w in &BCM2835_WINDOWS {
            let decision = gate.authorize(range(BASE + w.offset, w.size));
            assert_eq!(decision.into_result().unwrap().window(), Some(w.name));
        }
    }

    #[test]
    fn sub_page_range_inside_a_window_is_allowed() {
        let gate = gate(WhitelistPolicy::AnyWindow);
        assert!(gate.authorize(range(0x3F20_0800, 0x100)).is_allowed());
    }

    #[test]
    fn in_bounds_range_outside_windows_is_denied() {
        let gate = gate(WhitelistPolicy::AnyWindow);
        assert_eq!(
            gate.authorize(range(0x3F01_0000, 0x1000)),
            Decision::Denied(Denial::NotWhitelisted(range(0x3F01_0000, 0x1000)))
        );
    }

    #[test]
    fn out_of_bounds_is_denied_by_both_policies() {
        for policy in [WhitelistPolicy::AnyWindow, WhitelistPolicy::Literal] {
            let gate = gate(policy);
            assert_eq!(
                gate.authorize(range(0x3E00_0000, 0x1000)),
                Decision::Denied(Denial::OutOfBounds(range(0x3E00_0000, 0x1000)))
            );
            // Straddles the base.
            assert!(!gate.authorize(range(0x3EFF_F000, 0x2000)).is_allowed());
            // Ends past the limit.
            assert!(!gate.authorize(range(0x3F30_0000, 0x1000)).is_allowed());
        }
    }

    #[test]
    fn range_ending_exactly_at_limit_passes_bounds() {
        let last = range(LIMIT - 0x1000, 0x1000);
        assert!(gate(WhitelistPolicy::Literal).authorize(last).is_allowed());
        // Still outside every window.
        assert_eq!(
            gate_any().authorize(last),
            Decision::Denied(Denial::NotWhitelisted(last))
        );
    }

    #[test]
    fn range_spanning_two_windows_is_denied() {
        // gpio (0x200000) .. pcm (0x203000 + 0x1000)
        let gate = gate_any();
        assert!(!gate.authorize(range(0x3F20_0000, 0x4000)).is_allowed());
        // Tail of one window plus head of the next page.
        assert!(!gate.authorize(range(0x3F20_0800, 0x1000)).is_allowed());
    }

    #[test]
    fn literal_policy_admits_any_in_bounds_range() {
        let gate = gate(WhitelistPolicy::Literal);
        let auth = gate
            .authorize(range(0x3F01_0000, 0x1000))
            .into_result()
            .unwrap();
        assert_eq!(auth.window(), None);
        assert!(gate.authorize(range(0x3F20_0000, 0x4000)).is_allowed());
        assert_eq!(
            gate.authorize(range(0x3F20_0000, 0x1000))
                .into_result()
                .unwrap()
                .window(),
            Some("gpio")
        );
    }

    #[test]
    fn literal_policy_denies_range_inside_all_trailing_windows() {
        // Overlapping third and fourth windows make the deny branch reachable.
        static OVERLAP: [WhitelistWindow; 4] = [
            WhitelistWindow::page("a", 0x0000),
            WhitelistWindow::page("b", 0x1000),
            WhitelistWindow::page("c", 0x4000),
            WhitelistWindow::page("d", 0x4000),
        ];
        let res = ResourceDescriptor::new(PhysicalAddress::new(BASE), PhysicalAddress::new(LIMIT))
            .unwrap();
        let literal = AccessGate::new(res, &OVERLAP, WhitelistPolicy::Literal);
        assert!(!literal.authorize(range(BASE + 0x4000, 0x1000)).is_allowed());
        assert!(literal.authorize(range(BASE + 0x1000, 0x1000)).is_allowed());

        let any = AccessGate::new(res, &OVERLAP, WhitelistPolicy::AnyWindow);
        assert!(any.authorize(range(BASE + 0x4000, 0x1000)).is_allowed());
    }

    #[test]
    fn request_overflow_is_denied() {
        let gate = gate_any();
        let pfn = PageFrameNumber::new(u64::MAX >> 12);
        assert_eq!(
            gate.authorize_request(pfn, 0x2000),
            Decision::Denied(Denial::Overflow { pfn, len: 0x2000 })
        );
        assert!(
            gate.authorize_request(PageFrameNumber::new(0x3F200), 0x1000)
                .is_allowed()
        );
    }

    #[test]
    fn default_policy_follows_feature() {
        let expected = if cfg!(feature = "literal-whitelist") {
            WhitelistPolicy::Literal
        } else {
            WhitelistPolicy::AnyWindow
        };
        assert_eq!(WhitelistPolicy::default(), expected);
    }
}
