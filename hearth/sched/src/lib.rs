#![no_std]

//! # Hearth Scheduler
//!
//! Cooperative task scheduler for the Hearth controller firmware. Tasks are
//! plain callbacks in a growable registry, time-multiplexed across two
//! priority lanes without preemption: interrupt-lane bodies run inside the
//! tick handler, main-loop bodies run when the application calls
//! [`Scheduler::watcher`]. Subscribing returns a generational [`TaskHandle`]
//! used for every later operation on the task.

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use core::fmt;

pub mod registry;
pub mod scheduler;
pub mod task;

pub use registry::TaskHandle;
pub use scheduler::{SchedConfig, SchedConfigBuilder, Scheduler};
pub use task::{TaskKind, TaskState};

/// Result type used throughout the scheduler
pub type SchedResult<T> = Result<T, SchedError>;

/// Error types for scheduler operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// Handle does not name a live task
    UnknownTask,
    /// Period is below the time source's base granularity
    PeriodTooShort,
    /// Trigger on a task that is not manually triggered
    NotTriggerable,
    /// Registry growth failed; existing tasks are unaffected
    Exhausted,
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::UnknownTask => write!(f, "handle does not name a live task"),
            SchedError::PeriodTooShort => write!(f, "period below base tick granularity"),
            SchedError::NotTriggerable => write!(f, "task is not manually triggered"),
            SchedError::Exhausted => write!(f, "registry growth failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SchedError {}

#[cfg(feature = "defmt")]
impl defmt::Format for SchedError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            SchedError::UnknownTask => defmt::write!(fmt, "UnknownTask"),
            SchedError::PeriodTooShort => defmt::write!(fmt, "PeriodTooShort"),
            SchedError::NotTriggerable => defmt::write!(fmt, "NotTriggerable"),
            SchedError::Exhausted => defmt::write!(fmt, "Exhausted"),
        }
    }
}
