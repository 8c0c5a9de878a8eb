//! Scheduler context object and dispatch loop

use alloc::boxed::Box;

use hearth_core::{Lane, Ticks};

use crate::registry::{Registry, TaskHandle};
use crate::task::{TaskKind, TaskRecord, TaskState};
use crate::{SchedError, SchedResult};

/// Scheduler sizing and timing configuration
#[derive(Debug, Clone)]
pub struct SchedConfig {
    /// Smallest granularity the time source notifies at; periods below
    /// this are rejected
    pub base_tick: Ticks,
    /// Slots allocated up front
    pub initial_slots: usize,
    /// Slots appended per growth step
    pub grow_by: usize,
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            base_tick: Ticks::new(10),
            initial_slots: 8,
            grow_by: 4,
        }
    }
}

impl SchedConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> SchedConfigBuilder {
        SchedConfigBuilder::default()
    }
}

/// Builder for ergonomic scheduler configuration construction.
#[derive(Debug, Clone, Default)]
pub struct SchedConfigBuilder {
    config: SchedConfig,
}

impl SchedConfigBuilder {
    /// Sets the base tick granularity.
    pub fn base_tick(mut self, base_tick: Ticks) -> Self {
        self.config.base_tick = base_tick;
        self
    }

    /// Sets the number of slots allocated up front.
    pub fn initial_slots(mut self, initial_slots: usize) -> Self {
        self.config.initial_slots = initial_slots;
        self
    }

    /// Sets the number of slots appended per growth step.
    pub fn grow_by(mut self, grow_by: usize) -> Self {
        self.config.grow_by = grow_by;
        self
    }

    /// Builds the scheduler configuration.
    pub fn build(self) -> SchedConfig {
        self.config
    }
}

/// Cooperative task scheduler
///
/// The embedding calls [`tick`](Self::tick) from its periodic timer
/// interrupt and [`watcher`](Self::watcher) from the main loop; everything
/// else is registry bookkeeping. The scheduler is a plain context object;
/// exclusion between the two call sites is the embedding's job (on
/// single-core hardware it comes for free, a threaded port wraps the
/// scheduler in a critical-section cell).
pub struct Scheduler {
    registry: Registry,
    base_tick: Ticks,
    pending: u32,
}

impl Scheduler {
    /// Build a scheduler with the given configuration
    pub fn new(config: SchedConfig) -> Self {
        Self {
            registry: Registry::with_capacity(config.initial_slots, config.grow_by),
            base_tick: config.base_tick,
            pending: 0,
        }
    }

    /// Base tick granularity
    pub fn base_tick(&self) -> Ticks {
        self.base_tick
    }

    /// Number of subscribed tasks
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// True if no task is subscribed
    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Registry capacity, vacant slots included
    pub fn capacity(&self) -> usize {
        self.registry.capacity()
    }

    /// Ticks seen by the tick handler and not yet drained by the watcher
    pub fn pending_ticks(&self) -> u32 {
        self.pending
    }

    /// Add a task with subscribe defaults: stopped, period 0, main-loop
    /// lane, manually triggered
    pub fn subscribe<F>(&mut self, task: F) -> SchedResult<TaskHandle>
    where
        F: FnMut(&mut Scheduler) + Send + 'static,
    {
        self.registry.insert(TaskRecord::new(Box::new(task)))
    }

    /// Subscribe and configure in one step
    ///
    /// The composite is atomic: if any configuration step is rejected the
    /// task is unsubscribed again and the error returned.
    pub fn subscribe_configured<F>(
        &mut self,
        task: F,
        lane: Lane,
        period: Ticks,
        state: TaskState,
        kind: TaskKind,
    ) -> SchedResult<TaskHandle>
    where
        F: FnMut(&mut Scheduler) + Send + 'static,
    {
        let handle = self.subscribe(task)?;
        match self.configure(handle, lane, period, state, kind) {
            Ok(()) => Ok(handle),
            Err(err) => {
                let _ = self.unsubscribe(handle);
                Err(err)
            }
        }
    }

    fn configure(
        &mut self,
        handle: TaskHandle,
        lane: Lane,
        period: Ticks,
        state: TaskState,
        kind: TaskKind,
    ) -> SchedResult<()> {
        self.set_lane(handle, lane)?;
        self.set_period(handle, period)?;
        self.set_kind(handle, kind)?;
        self.set_state(handle, state)
    }

    /// Remove a task; its handle is invalid afterwards
    pub fn unsubscribe(&mut self, handle: TaskHandle) -> SchedResult<()> {
        self.registry
            .remove(handle)
            .map(|_| ())
            .ok_or(SchedError::UnknownTask)
    }

    /// Change a task's period
    ///
    /// Rejects periods below the base tick granularity, leaving the
    /// previous period intact. Resets the elapsed accumulator on success.
    pub fn set_period(&mut self, handle: TaskHandle, period: Ticks) -> SchedResult<()> {
        if period < self.base_tick {
            return Err(SchedError::PeriodTooShort);
        }
        let record = self.registry.get_mut(handle).ok_or(SchedError::UnknownTask)?;
        record.period = period;
        record.elapsed = Ticks::ZERO;
        Ok(())
    }

    /// Change a task's run state
    pub fn set_state(&mut self, handle: TaskHandle, state: TaskState) -> SchedResult<()> {
        let record = self.registry.get_mut(handle).ok_or(SchedError::UnknownTask)?;
        record.state = state;
        Ok(())
    }

    /// Change how a task's firing is driven
    pub fn set_kind(&mut self, handle: TaskHandle, kind: TaskKind) -> SchedResult<()> {
        let record = self.registry.get_mut(handle).ok_or(SchedError::UnknownTask)?;
        record.kind = kind;
        Ok(())
    }

    /// Move a task to the other dispatch lane
    pub fn set_lane(&mut self, handle: TaskHandle, lane: Lane) -> SchedResult<()> {
        let record = self.registry.get_mut(handle).ok_or(SchedError::UnknownTask)?;
        record.lane = lane;
        Ok(())
    }

    /// Arm a manually triggered task for its next firing
    pub fn trigger(&mut self, handle: TaskHandle) -> SchedResult<()> {
        let record = self.registry.get_mut(handle).ok_or(SchedError::UnknownTask)?;
        if record.kind != TaskKind::ManualTrigger {
            return Err(SchedError::NotTriggerable);
        }
        record.elapsed = Ticks::ZERO;
        record.state = TaskState::Running;
        Ok(())
    }

    /// Run state of a task, `None` for a stale handle
    pub fn state_of(&self, handle: TaskHandle) -> Option<TaskState> {
        self.registry.get(handle).map(|record| record.state)
    }

    /// Kind of a task, `None` for a stale handle
    pub fn kind_of(&self, handle: TaskHandle) -> Option<TaskKind> {
        self.registry.get(handle).map(|record| record.kind)
    }

    /// Lane of a task, `None` for a stale handle
    pub fn lane_of(&self, handle: TaskHandle) -> Option<Lane> {
        self.registry.get(handle).map(|record| record.lane)
    }

    /// Period of a task, `None` for a stale handle
    pub fn period_of(&self, handle: TaskHandle) -> Option<Ticks> {
        self.registry.get(handle).map(|record| record.period)
    }

    /// Tick handler, called once per base tick from interrupt context
    ///
    /// Runs due interrupt-lane tasks to completion before returning and
    /// records one pending tick for the watcher.
    pub fn tick(&mut self) {
        self.run_due(Lane::Interrupt);
        self.pending = self.pending.saturating_add(1);
    }

    /// Main-loop watcher; drains pending ticks into the main-loop lane
    pub fn watcher(&mut self) {
        while self.pending > 0 {
            self.pending -= 1;
            self.run_due(Lane::MainLoop);
        }
    }

    /// Idle hook for the embedding's main loop: waits for the next
    /// interrupt on ARM targets, no-op elsewhere
    #[cfg(feature = "cortex-m")]
    pub fn on_idle() {
        #[cfg(target_arch = "arm")]
        cortex_m::asm::wfi();
    }

    /// One due-task pass over a lane, in registry order
    fn run_due(&mut self, lane: Lane) {
        let base = self.base_tick;
        // Snapshot the slot count: tasks subscribed while the pass runs are
        // first considered on the next tick.
        let count = self.registry.slot_count();
        for index in 0..count {
            let Some(handle) = self.registry.handle_at(index) else {
                continue;
            };
            let fired_kind = {
                let Some(record) = self.registry.get_mut(handle) else {
                    continue;
                };
                if record.lane != lane || record.state != TaskState::Running {
                    continue;
                }
                record.elapsed = record.elapsed.saturating_add(base);
                if record.elapsed < record.period {
                    continue;
                }
                record.elapsed = Ticks::ZERO;
                // Stopped before the body runs: a repeat firing requires an
                // explicit re-trigger.
                if record.kind == TaskKind::ManualTrigger {
                    record.state = TaskState::Stopped;
                }
                record.kind
            };
            let Some(mut task) = self.registry.take_task(handle) else {
                continue;
            };
            task(self);
            self.registry.restore_task(handle, task);
            if fired_kind == TaskKind::OneShot {
                // The body cannot veto its own one-shot cleanup.
                let _ = self.registry.remove(handle);
            }
        }
    }
}
