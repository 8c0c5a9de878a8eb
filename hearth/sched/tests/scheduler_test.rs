//! Scheduler behavior tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use hearth_core::{Lane, Ticks};
use hearth_sched::{SchedConfig, SchedError, Scheduler, TaskKind, TaskState};

fn scheduler() -> Scheduler {
    Scheduler::new(SchedConfig::default())
}

fn counter() -> (Arc<AtomicU32>, impl FnMut(&mut Scheduler) + Send + 'static) {
    let count = Arc::new(AtomicU32::new(0));
    let probe = count.clone();
    (count, move |_: &mut Scheduler| {
        probe.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn periodic_task_fires_every_period() {
    let mut sched = scheduler();
    let (count, task) = counter();
    sched
        .subscribe_configured(
            task,
            Lane::Interrupt,
            Ticks::new(30),
            TaskState::Running,
            TaskKind::Periodic,
        )
        .unwrap();

    // Base tick 10, period 30: fires on ticks 3, 6 and 9.
    for tick in 1..=9 {
        sched.tick();
        let expected = tick / 3;
        assert_eq!(count.load(Ordering::SeqCst), expected, "after tick {tick}");
    }
}

#[test]
fn set_period_resets_elapsed_accumulator() {
    let mut sched = scheduler();
    let (count, task) = counter();
    let handle = sched
        .subscribe_configured(
            task,
            Lane::Interrupt,
            Ticks::new(30),
            TaskState::Running,
            TaskKind::Periodic,
        )
        .unwrap();

    sched.tick();
    sched.tick();
    // Re-arming the same period restarts the accumulator from zero.
    sched.set_period(handle, Ticks::new(30)).unwrap();
    sched.tick();
    sched.tick();
    assert_eq!(count.load(Ordering::SeqCst), 0);
    sched.tick();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn set_period_below_base_granularity_is_rejected() {
    let mut sched = scheduler();
    let (_, task) = counter();
    let handle = sched.subscribe(task).unwrap();
    sched.set_period(handle, Ticks::new(20)).unwrap();

    assert_eq!(
        sched.set_period(handle, Ticks::new(5)),
        Err(SchedError::PeriodTooShort)
    );
    assert_eq!(sched.period_of(handle), Some(Ticks::new(20)));
}

#[test]
fn one_shot_is_unsubscribed_after_firing() {
    let mut sched = scheduler();
    let (count, task) = counter();
    let handle = sched
        .subscribe_configured(
            task,
            Lane::Interrupt,
            Ticks::new(10),
            TaskState::Running,
            TaskKind::OneShot,
        )
        .unwrap();

    sched.tick();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(sched.state_of(handle), None);
    assert_eq!(sched.len(), 0);

    sched.tick();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn manual_trigger_fires_once_per_trigger() {
    let mut sched = scheduler();
    let (count, task) = counter();
    let handle = sched
        .subscribe_configured(
            task,
            Lane::Interrupt,
            Ticks::new(10),
            TaskState::Stopped,
            TaskKind::ManualTrigger,
        )
        .unwrap();

    sched.tick();
    assert_eq!(count.load(Ordering::SeqCst), 0);

    sched.trigger(handle).unwrap();
    sched.tick();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(sched.state_of(handle), Some(TaskState::Stopped));

    // No re-fire without an explicit re-trigger.
    sched.tick();
    sched.tick();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    sched.trigger(handle).unwrap();
    sched.tick();
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn trigger_rejects_non_manual_tasks() {
    let mut sched = scheduler();
    let (_, task) = counter();
    let handle = sched
        .subscribe_configured(
            task,
            Lane::Interrupt,
            Ticks::new(10),
            TaskState::Running,
            TaskKind::Periodic,
        )
        .unwrap();

    assert_eq!(sched.trigger(handle), Err(SchedError::NotTriggerable));
}

#[test]
fn growth_preserves_existing_tasks() {
    let mut sched = Scheduler::new(
        SchedConfig::builder()
            .base_tick(Ticks::new(10))
            .initial_slots(2)
            .grow_by(2)
            .build(),
    );

    let mut handles = Vec::new();
    for i in 0..5u32 {
        let (_, task) = counter();
        let handle = sched.subscribe(task).unwrap();
        sched.set_period(handle, Ticks::new(10 * (i + 1))).unwrap();
        handles.push(handle);
    }

    assert_eq!(sched.len(), 5);
    assert_eq!(sched.capacity(), 6);
    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(
            sched.period_of(*handle),
            Some(Ticks::new(10 * (i as u32 + 1)))
        );
        assert_eq!(sched.state_of(*handle), Some(TaskState::Stopped));
    }
}

#[test]
fn stale_handle_is_rejected_after_slot_reuse() {
    let mut sched = scheduler();
    let (_, task) = counter();
    let old = sched.subscribe(task).unwrap();
    sched.unsubscribe(old).unwrap();

    let (_, task) = counter();
    let new = sched.subscribe(task).unwrap();

    assert_ne!(old, new);
    assert_eq!(sched.state_of(old), None);
    assert_eq!(sched.unsubscribe(old), Err(SchedError::UnknownTask));
    assert_eq!(
        sched.set_state(old, TaskState::Running),
        Err(SchedError::UnknownTask)
    );
    assert_eq!(sched.state_of(new), Some(TaskState::Stopped));
}

#[test]
fn subscribe_configured_rolls_back_on_bad_period() {
    let mut sched = scheduler();
    let (_, task) = counter();
    let result = sched.subscribe_configured(
        task,
        Lane::Interrupt,
        Ticks::new(5), // below the base tick
        TaskState::Running,
        TaskKind::Periodic,
    );

    assert_eq!(result, Err(SchedError::PeriodTooShort));
    assert_eq!(sched.len(), 0);
}

#[test]
fn watcher_drains_all_pending_ticks() {
    let mut sched = scheduler();
    let (count, task) = counter();
    sched
        .subscribe_configured(
            task,
            Lane::MainLoop,
            Ticks::new(10),
            TaskState::Running,
            TaskKind::Periodic,
        )
        .unwrap();

    sched.tick();
    sched.tick();
    sched.tick();
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(sched.pending_ticks(), 3);

    sched.watcher();
    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert_eq!(sched.pending_ticks(), 0);
}

#[test]
fn interrupt_lane_does_not_run_main_loop_tasks() {
    let mut sched = scheduler();
    let (main_count, main_task) = counter();
    let (irq_count, irq_task) = counter();
    sched
        .subscribe_configured(
            main_task,
            Lane::MainLoop,
            Ticks::new(10),
            TaskState::Running,
            TaskKind::Periodic,
        )
        .unwrap();
    sched
        .subscribe_configured(
            irq_task,
            Lane::Interrupt,
            Ticks::new(10),
            TaskState::Running,
            TaskKind::Periodic,
        )
        .unwrap();

    sched.tick();
    assert_eq!(irq_count.load(Ordering::SeqCst), 1);
    assert_eq!(main_count.load(Ordering::SeqCst), 0);

    sched.watcher();
    assert_eq!(main_count.load(Ordering::SeqCst), 1);
}

#[test]
fn due_tasks_run_in_registry_order() {
    let mut sched = scheduler();
    let order = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second", "third"] {
        let log = order.clone();
        sched
            .subscribe_configured(
                move |_: &mut Scheduler| log.lock().unwrap().push(name),
                Lane::Interrupt,
                Ticks::new(10),
                TaskState::Running,
                TaskKind::Periodic,
            )
            .unwrap();
    }

    sched.tick();
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn task_can_unsubscribe_itself_while_running() {
    let mut sched = scheduler();
    let slot = Arc::new(Mutex::new(None));
    let (count, mut bump) = counter();

    let me = slot.clone();
    let handle = sched
        .subscribe_configured(
            move |sched: &mut Scheduler| {
                bump(sched);
                if let Some(handle) = *me.lock().unwrap() {
                    sched.unsubscribe(handle).unwrap();
                }
            },
            Lane::Interrupt,
            Ticks::new(10),
            TaskState::Running,
            TaskKind::Periodic,
        )
        .unwrap();
    *slot.lock().unwrap() = Some(handle);

    sched.tick();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(sched.len(), 0);

    sched.tick();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn task_can_stop_its_own_future_firing() {
    let mut sched = scheduler();
    let slot = Arc::new(Mutex::new(None));
    let (count, mut bump) = counter();

    let me = slot.clone();
    let handle = sched
        .subscribe_configured(
            move |sched: &mut Scheduler| {
                bump(sched);
                if let Some(handle) = *me.lock().unwrap() {
                    sched.set_state(handle, TaskState::Stopped).unwrap();
                }
            },
            Lane::Interrupt,
            Ticks::new(10),
            TaskState::Running,
            TaskKind::Periodic,
        )
        .unwrap();
    *slot.lock().unwrap() = Some(handle);

    sched.tick();
    sched.tick();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(sched.state_of(handle), Some(TaskState::Stopped));
}

#[test]
fn task_can_subscribe_another_task_while_running() {
    let mut sched = Scheduler::new(
        SchedConfig::builder()
            .base_tick(Ticks::new(10))
            .initial_slots(1)
            .grow_by(1)
            .build(),
    );
    let (inner_count, inner_task) = counter();
    let (outer_count, mut bump) = counter();

    let inner = Arc::new(Mutex::new(Some(inner_task)));
    sched
        .subscribe_configured(
            move |sched: &mut Scheduler| {
                bump(sched);
                if let Some(task) = inner.lock().unwrap().take() {
                    sched
                        .subscribe_configured(
                            task,
                            Lane::Interrupt,
                            Ticks::new(10),
                            TaskState::Running,
                            TaskKind::Periodic,
                        )
                        .unwrap();
                }
            },
            Lane::Interrupt,
            Ticks::new(10),
            TaskState::Running,
            TaskKind::Periodic,
        )
        .unwrap();

    // Subscribing forces growth mid-pass; the new task first runs on the
    // following tick.
    sched.tick();
    assert_eq!(outer_count.load(Ordering::SeqCst), 1);
    assert_eq!(inner_count.load(Ordering::SeqCst), 0);
    assert_eq!(sched.len(), 2);

    sched.tick();
    assert_eq!(outer_count.load(Ordering::SeqCst), 2);
    assert_eq!(inner_count.load(Ordering::SeqCst), 1);
}
