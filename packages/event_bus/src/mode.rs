use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Governs which handler configurations an [`EventBus`][crate::EventBus] accepts.
///
/// Modes are bit flags and can be combined with `|`.
///
/// # Example
///
/// ```rust
/// use event_bus::EventBusMode;
///
/// let mode = EventBusMode::ALLOW_MULTI_HANDLER | EventBusMode::ALLOW_NO_HANDLER;
///
/// assert!(mode.contains(EventBusMode::ALLOW_NO_HANDLER));
/// assert!(!mode.contains(EventBusMode::ALLOW_DUPLICATE_HANDLER));
/// ```
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct EventBusMode {
    bits: u8,
}

impl EventBusMode {
    /// Every event must have exactly one handler.
    pub const DEFAULT: Self = Self { bits: 0 };

    /// Dispatching an event that has no handler and no default handler is not an error.
    pub const ALLOW_NO_HANDLER: Self = Self { bits: 1 };

    /// An event may have more than one handler.
    pub const ALLOW_MULTI_HANDLER: Self = Self { bits: 1 << 1 };

    /// The same handler may be subscribed to an event more than once. It is then invoked once per
    /// subscription.
    pub const ALLOW_DUPLICATE_HANDLER: Self = Self { bits: 1 << 2 };

    /// Returns the raw flag bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.bits
    }

    /// Returns whether every flag in `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }
}

impl BitOr for EventBusMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

impl BitOrAssign for EventBusMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

impl fmt::Debug for EventBusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(EventBusMode, &str); 3] = [
            (EventBusMode::ALLOW_NO_HANDLER, "ALLOW_NO_HANDLER"),
            (EventBusMode::ALLOW_MULTI_HANDLER, "ALLOW_MULTI_HANDLER"),
            (EventBusMode::ALLOW_DUPLICATE_HANDLER, "ALLOW_DUPLICATE_HANDLER"),
        ];

        if *self == Self::DEFAULT {
            return write!(f, "EventBusMode(DEFAULT)");
        }

        write!(f, "EventBusMode(")?;

        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    write!(f, " | ")?;
                }

                write!(f, "{name}")?;
                first = false;
            }
        }

        write!(f, ")")
    }
}
