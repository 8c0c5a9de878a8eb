//! Tick arithmetic for scheduler periods and accumulators

use core::fmt;

/// Duration measured in time-source base units
///
/// Periods, elapsed accumulators and watchdog timeouts are all plain tick
/// counts; the time source defines what one tick means in wall-clock terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticks(pub u32);

impl Ticks {
    /// Zero duration
    pub const ZERO: Self = Self(0);

    /// Maximum representable duration
    pub const MAX: Self = Self(u32::MAX);

    /// Create a new tick count
    pub const fn new(ticks: u32) -> Self {
        Self(ticks)
    }

    /// Get the raw tick count
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if the count is zero
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Add two counts, clamping at the maximum
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ticks", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Ticks {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}ticks", self.0);
    }
}
