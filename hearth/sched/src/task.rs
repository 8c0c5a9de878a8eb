//! Task records and lifecycle types

use alloc::boxed::Box;
use core::fmt;

use hearth_core::{Lane, Ticks};

use crate::scheduler::Scheduler;

/// Boxed task body
///
/// Bodies receive the scheduler so they can operate on other tasks (or on
/// themselves) while they run; the dispatcher moves the body out of its
/// slot for the duration of the call, so re-entrant registry operations are
/// safe.
pub type TaskFn = Box<dyn FnMut(&mut Scheduler) + Send>;

/// How a task's firing is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Fires once per explicit trigger, after its period elapses
    ManualTrigger,
    /// Fires every period while running
    Periodic,
    /// Fires once, then is unsubscribed automatically
    OneShot,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManualTrigger => write!(f, "ManualTrigger"),
            Self::Periodic => write!(f, "Periodic"),
            Self::OneShot => write!(f, "OneShot"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TaskKind {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ManualTrigger => defmt::write!(fmt, "ManualTrigger"),
            Self::Periodic => defmt::write!(fmt, "Periodic"),
            Self::OneShot => defmt::write!(fmt, "OneShot"),
        }
    }
}

/// Run state of a subscribed task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Subscribed but not accumulating time
    Stopped,
    /// Accumulating time and eligible to fire
    Running,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "Stopped"),
            Self::Running => write!(f, "Running"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TaskState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Stopped => defmt::write!(fmt, "Stopped"),
            Self::Running => defmt::write!(fmt, "Running"),
        }
    }
}

/// One subscribed unit of work
pub(crate) struct TaskRecord {
    /// Body; `None` only while the dispatcher is running it
    pub(crate) task: Option<TaskFn>,
    pub(crate) lane: Lane,
    pub(crate) period: Ticks,
    pub(crate) elapsed: Ticks,
    pub(crate) kind: TaskKind,
    pub(crate) state: TaskState,
}

impl TaskRecord {
    /// Fresh record with subscribe defaults: stopped, period 0, main-loop,
    /// manually triggered
    pub(crate) fn new(task: TaskFn) -> Self {
        Self {
            task: Some(task),
            lane: Lane::MainLoop,
            period: Ticks::ZERO,
            elapsed: Ticks::ZERO,
            kind: TaskKind::ManualTrigger,
            state: TaskState::Stopped,
        }
    }
}
