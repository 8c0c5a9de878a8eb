//! Periodic tick source abstraction

use crate::error::HalResult;

/// Periodic tick generator driving the scheduler
///
/// The embedding starts the source at the kernel's base tick period and
/// calls `Scheduler::tick()` whenever `poll_tick` reports an elapsed
/// period (from the timer interrupt on hardware, from the main loop on a
/// host port).
pub trait TickSource: Send {
    /// Start generating ticks with the given period in microseconds
    fn start(&mut self, period_us: u64) -> HalResult<()>;

    /// Stop generating ticks
    fn stop(&mut self) -> HalResult<()>;

    /// True if at least one tick period elapsed since the last call
    fn poll_tick(&mut self) -> bool;
}
