//! Tick type tests for hearth-core

use hearth_core::Ticks;

#[test]
fn test_tick_construction() {
    assert_eq!(Ticks::new(0), Ticks::ZERO);
    assert_eq!(Ticks::new(7).raw(), 7);
    assert_eq!(Ticks::MAX.raw(), u32::MAX);
}

#[test]
fn test_tick_display() {
    assert_eq!(format!("{}", Ticks::new(30)), "30ticks");
}
