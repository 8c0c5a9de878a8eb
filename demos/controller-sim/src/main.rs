//! Hearth controller main loop on a simulated board
//!
//! Wires the scheduler and the I2C driver the way the firmware does on
//! hardware: a periodic tick source drives `Scheduler::tick`, the main loop
//! drains `Scheduler::watcher`, and a relay-board task keeps its output
//! state in sync over blocking I2C against a simulated expander that
//! mirrors written bytes.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use hearth_core::{Lane, Ticks};
use hearth_hal::{BusConfig, BusEvent, BusInterface, HalResult, TickSource};
use hearth_i2c::{I2cConfig, I2cMaster};
use hearth_sched::{SchedConfig, Scheduler, TaskKind, TaskState};

/// Relay expander address on the simulated bus
const RELAY_BOARD_ADDR: u8 = 0x20;

/// Tick source backed by the host clock
struct HostClock {
    period: Duration,
    last: Instant,
    running: bool,
}

impl HostClock {
    fn new() -> Self {
        Self {
            period: Duration::from_millis(10),
            last: Instant::now(),
            running: false,
        }
    }
}

impl TickSource for HostClock {
    fn start(&mut self, period_us: u64) -> HalResult<()> {
        self.period = Duration::from_micros(period_us);
        self.last = Instant::now();
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> HalResult<()> {
        self.running = false;
        Ok(())
    }

    fn poll_tick(&mut self) -> bool {
        if !self.running || self.last.elapsed() < self.period {
            return false;
        }
        self.last += self.period;
        true
    }
}

/// Simulated I2C expander that mirrors written bytes back on reads
#[derive(Default)]
struct SimExpander {
    queue: std::collections::VecDeque<BusEvent>,
    awaiting_addr: bool,
    reading: bool,
    ack: bool,
    stop_requested: bool,
    memory: Vec<u8>,
    read_pos: usize,
}

impl BusInterface for SimExpander {
    fn configure(&mut self, _config: &BusConfig) -> HalResult<()> {
        Ok(())
    }

    fn enable_start(&mut self) {
        self.awaiting_addr = true;
        self.stop_requested = false;
        self.queue.push_back(BusEvent::StartSent);
    }

    fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    fn set_ack(&mut self, enabled: bool) {
        self.ack = enabled;
    }

    fn write_data(&mut self, byte: u8) {
        if self.awaiting_addr {
            self.awaiting_addr = false;
            self.reading = byte & 1 == 1;
            self.queue.push_back(BusEvent::AddressAcked);
            if self.reading {
                self.queue.push_back(BusEvent::ByteReceived);
            }
        } else {
            self.memory.push(byte);
            self.queue.push_back(BusEvent::ByteSent);
        }
    }

    fn read_data(&mut self) -> u8 {
        let byte = self.memory.get(self.read_pos).copied().unwrap_or(0xFF);
        self.read_pos += 1;
        if self.ack && !self.stop_requested {
            self.queue.push_back(BusEvent::ByteReceived);
        }
        byte
    }

    fn set_rx_notify(&mut self, _enabled: bool) {}

    fn reset(&mut self) {
        self.queue.clear();
        self.awaiting_addr = false;
        self.stop_requested = false;
    }

    fn poll_event(&mut self) -> Option<BusEvent> {
        self.queue.pop_front()
    }
}

fn main() {
    println!("hearth controller simulation");

    let mut sched = Scheduler::new(
        SchedConfig::builder()
            .base_tick(Ticks::new(10))
            .initial_slots(4)
            .grow_by(4)
            .build(),
    );

    let master = I2cMaster::new(SimExpander::default(), &mut sched, I2cConfig::default())
        .expect("driver init");
    let master = Arc::new(Mutex::new(master));

    // Input-board debounce stand-in: interrupt lane, every 2 base ticks.
    let debounce_count = Arc::new(AtomicU32::new(0));
    let debounce_probe = debounce_count.clone();
    sched
        .subscribe_configured(
            move |_: &mut Scheduler| {
                debounce_probe.fetch_add(1, Ordering::SeqCst);
            },
            Lane::Interrupt,
            Ticks::new(20),
            TaskState::Running,
            TaskKind::Periodic,
        )
        .expect("subscribe debounce");

    // Relay board sync: main loop lane, every 5 base ticks. Writes the
    // current relay mask, reads it back to verify.
    let relay_master = master.clone();
    let relay_mask = Arc::new(AtomicU32::new(0b0001));
    let mask_probe = relay_mask.clone();
    sched
        .subscribe_configured(
            move |sched: &mut Scheduler| {
                let mask = mask_probe.load(Ordering::SeqCst) as u8;
                let mut master = relay_master.lock().expect("driver lock");
                if master.write(sched, RELAY_BOARD_ADDR, &[mask]).is_err() {
                    println!("relay sync: write failed, board reset");
                    return;
                }
                let mut echo = [0u8; 1];
                match master.read(sched, RELAY_BOARD_ADDR, &mut echo) {
                    Ok(1) if echo[0] == mask => {
                        println!("relay sync: mask {mask:#04b} verified");
                    }
                    _ => println!("relay sync: verify mismatch"),
                }
                mask_probe.store(u32::from(mask.rotate_left(1)), Ordering::SeqCst);
            },
            Lane::MainLoop,
            Ticks::new(50),
            TaskState::Running,
            TaskKind::Periodic,
        )
        .expect("subscribe relay sync");

    let mut clock = HostClock::new();
    clock.start(10_000).expect("clock start");

    let started = Instant::now();
    while started.elapsed() < Duration::from_millis(500) {
        if clock.poll_tick() {
            sched.tick();
        }
        sched.watcher();
        std::thread::sleep(Duration::from_millis(1));
    }

    println!(
        "done: {} debounce passes, {} tasks live",
        debounce_count.load(Ordering::SeqCst),
        sched.len()
    );
}
