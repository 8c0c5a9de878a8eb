//! Dispatch lanes

use core::fmt;

/// Priority lane a task runs in
///
/// Interrupt-lane task bodies run inside the tick handler itself and finish
/// before it returns; main-loop bodies run only when the application calls
/// the scheduler watcher. There is no preemption within a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    /// Cooperative context, dispatched from the watcher
    MainLoop,
    /// Tick-handler context, preemptive relative to the main loop
    Interrupt,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MainLoop => write!(f, "MainLoop"),
            Self::Interrupt => write!(f, "Interrupt"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Lane {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::MainLoop => defmt::write!(fmt, "MainLoop"),
            Self::Interrupt => defmt::write!(fmt, "Interrupt"),
        }
    }
}
