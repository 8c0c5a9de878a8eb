//! I2C master driver
//!
//! The driver owns the controller through the [`BusInterface`] trait and a
//! shared transaction descriptor. Hardware events step the descriptor
//! through its phases; everything else (admission, result consumption,
//! callback invocation, recovery resets) happens in the API methods, never
//! in the event handler.

use hearth_core::{Lane, Shared, Ticks};
use hearth_hal::{BusConfig, BusEvent, BusInterface};
use hearth_sched::{Scheduler, TaskHandle, TaskKind, TaskState};
use heapless::Vec;

use crate::transaction::{
    Completion, CompletionFn, Phase, Transaction, TransferKind, TransferStatus, BUF_CAPACITY,
};
use crate::{I2cError, I2cResult};

/// Smallest accepted watchdog timeout, in base ticks
pub const TIMEOUT_MIN: Ticks = Ticks::new(10);
/// Default watchdog timeout
pub const TIMEOUT_DEFAULT: Ticks = Ticks::new(100);
/// Largest accepted watchdog timeout
pub const TIMEOUT_MAX: Ticks = Ticks::new(10_000);

/// Driver configuration
#[derive(Debug, Clone)]
pub struct I2cConfig {
    /// Controller configuration handed to the hardware
    pub bus: BusConfig,
    /// Initial watchdog timeout in base ticks
    pub timeout: Ticks,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            timeout: TIMEOUT_DEFAULT,
        }
    }
}

/// Single-transaction I2C master
///
/// At most one transaction is in flight; a second request while the
/// descriptor is not idle fails immediately with [`I2cError::Busy`]; there
/// is no queueing.
pub struct I2cMaster<B: BusInterface> {
    bus: B,
    txn: Shared<Transaction>,
    watchdog: TaskHandle,
    timeout: Ticks,
}

impl<B: BusInterface> I2cMaster<B> {
    /// Initialize the driver: configure and reset the controller and
    /// subscribe the transaction watchdog with the scheduler
    pub fn new(mut bus: B, sched: &mut Scheduler, config: I2cConfig) -> I2cResult<Self> {
        if config.timeout < TIMEOUT_MIN || config.timeout > TIMEOUT_MAX {
            return Err(I2cError::BadTimeout);
        }
        bus.configure(&config.bus).map_err(I2cError::Hardware)?;

        let txn = Shared::new(Transaction::new());
        let watchdog_txn = txn.clone();
        let watchdog = sched
            .subscribe_configured(
                move |_: &mut Scheduler| watchdog_txn.with(Transaction::expire),
                Lane::Interrupt,
                config.timeout,
                TaskState::Stopped,
                TaskKind::ManualTrigger,
            )
            .map_err(I2cError::Scheduler)?;

        let mut master = Self {
            bus,
            txn,
            watchdog,
            timeout: config.timeout,
        };
        master.reset();
        Ok(master)
    }

    /// Current watchdog timeout
    pub fn timeout(&self) -> Ticks {
        self.timeout
    }

    /// Change the watchdog timeout
    ///
    /// Rejects values outside `[TIMEOUT_MIN, TIMEOUT_MAX]`; on success both
    /// the stored value and the watchdog task period are updated.
    pub fn set_timeout(&mut self, sched: &mut Scheduler, timeout: Ticks) -> I2cResult<()> {
        if timeout < TIMEOUT_MIN || timeout > TIMEOUT_MAX {
            return Err(I2cError::BadTimeout);
        }
        sched
            .set_period(self.watchdog, timeout)
            .map_err(I2cError::Scheduler)?;
        self.timeout = timeout;
        Ok(())
    }

    /// Hard reset of the controller and descriptor; idempotent, always
    /// leaves the driver idle
    pub fn reset(&mut self) {
        self.bus.reset();
        self.txn.with(Transaction::reset);
    }

    /// Start an asynchronous write
    ///
    /// Fails without touching the hardware if the payload exceeds the
    /// transfer buffer or a transaction is already in flight.
    pub fn write_async(
        &mut self,
        sched: &mut Scheduler,
        address: u8,
        data: &[u8],
        callback: Option<CompletionFn>,
    ) -> I2cResult<()> {
        if data.len() > BUF_CAPACITY {
            return Err(I2cError::PayloadTooLarge);
        }
        if !self.txn.with(|t| t.phase.is_idle()) {
            return Err(I2cError::Busy);
        }
        sched.trigger(self.watchdog).map_err(I2cError::Scheduler)?;
        self.txn.with(|t| t.begin_write(address, data, callback));
        self.bus.set_ack(true);
        self.bus.enable_start();
        Ok(())
    }

    /// Start an asynchronous read of `len` bytes
    pub fn read_async(
        &mut self,
        sched: &mut Scheduler,
        address: u8,
        len: usize,
        callback: Option<CompletionFn>,
    ) -> I2cResult<()> {
        if len > BUF_CAPACITY {
            return Err(I2cError::PayloadTooLarge);
        }
        if !self.txn.with(|t| t.phase.is_idle()) {
            return Err(I2cError::Busy);
        }
        sched.trigger(self.watchdog).map_err(I2cError::Scheduler)?;
        self.txn.with(|t| t.begin_read(address, len, callback));
        self.bus.set_rx_notify(true);
        self.bus.set_ack(true);
        self.bus.enable_start();
        Ok(())
    }

    /// Blocking write: admit, drive until ready, consume the result
    ///
    /// Spins by draining bus events and advancing scheduler ticks, so the
    /// watchdog bounds it. Must never run in interrupt context.
    pub fn write(&mut self, sched: &mut Scheduler, address: u8, data: &[u8]) -> I2cResult<()> {
        self.write_async(sched, address, data, None)?;
        self.drive(sched).map(|_| ())
    }

    /// Blocking read into `out`; returns the number of bytes received
    pub fn read(&mut self, sched: &mut Scheduler, address: u8, out: &mut [u8]) -> I2cResult<usize> {
        self.read_async(sched, address, out.len(), None)?;
        let done = self.drive(sched)?;
        let handled = done.handled();
        out[..handled].copy_from_slice(&done.data);
        Ok(handled)
    }

    /// Consume a completed transaction
    ///
    /// `WouldBlock` until the event handler or watchdog sets the ready
    /// flag. Consuming clears the flag, invokes the completion callback if
    /// one was supplied, returns the descriptor to idle and, after a
    /// failure, resets the bus so the next transaction starts clean.
    pub fn poll(&mut self) -> nb::Result<Completion, I2cError> {
        let consumed = self.txn.with(|t| {
            if !t.ready {
                return None;
            }
            t.ready = false;
            let ok = t.phase == Phase::Done(TransferStatus::Ok);
            let kind = t.kind;
            let handled = t.handled.min(t.buffer.len());
            let callback = t.callback.take();
            let fault = t.fault.take();
            let mut data = Vec::new();
            let _ = data.extend_from_slice(&t.buffer[..handled]);
            t.reset();
            Some((ok, kind, callback, fault, data))
        });

        match consumed {
            None => Err(nb::Error::WouldBlock),
            Some((true, kind, callback, _, data)) => {
                if let Some(callback) = callback {
                    callback(kind, TransferStatus::Ok, &data);
                }
                Ok(Completion { kind, data })
            }
            Some((false, kind, callback, fault, data)) => {
                self.reset();
                if let Some(callback) = callback {
                    callback(kind, TransferStatus::Error, &data);
                }
                Err(nb::Error::Other(fault.unwrap_or(I2cError::BusFault)))
            }
        }
    }

    /// Drain pending bus events into the state machine
    ///
    /// On hardware the interrupt service routine calls
    /// [`on_event`](Self::on_event) directly; polling covers blocking paths
    /// and hosts without interrupts.
    pub fn pump(&mut self, sched: &mut Scheduler) {
        while let Some(event) = self.bus.poll_event() {
            self.on_event(sched, event);
        }
    }

    /// Advance the transaction state machine by one hardware event
    ///
    /// Fast and non-blocking: only phase stepping, byte shuffling and the
    /// ready flag. Invoked from interrupt context on hardware.
    pub fn on_event(&mut self, sched: &mut Scheduler, event: BusEvent) {
        let bus = &mut self.bus;
        let watchdog = self.watchdog;
        self.txn.with(|t| match event {
            BusEvent::StartSent => {
                if t.phase == Phase::Start {
                    t.phase = Phase::Address;
                    bus.write_data(t.address_byte());
                }
            }
            BusEvent::AddressAcked => {
                if t.phase != Phase::Address {
                    return;
                }
                t.phase = Phase::Data;
                match t.kind {
                    TransferKind::Write => {
                        if t.requested == 0 {
                            bus.request_stop();
                            complete(t, sched, watchdog, TransferStatus::Ok);
                        } else {
                            bus.write_data(t.buffer[0]);
                            t.handled = 1;
                        }
                    }
                    TransferKind::Read => {
                        if t.requested == 0 {
                            bus.request_stop();
                            bus.set_rx_notify(false);
                            complete(t, sched, watchdog, TransferStatus::Ok);
                        } else if t.requested == 1 {
                            // The last-byte NACK must be armed before the
                            // byte starts clocking in.
                            bus.set_ack(false);
                            bus.request_stop();
                        }
                    }
                }
            }
            BusEvent::ByteSent => {
                if t.phase != Phase::Data || t.kind != TransferKind::Write {
                    return;
                }
                if t.handled < t.requested {
                    bus.write_data(t.buffer[t.handled]);
                    t.handled += 1;
                } else {
                    bus.request_stop();
                    complete(t, sched, watchdog, TransferStatus::Ok);
                }
            }
            BusEvent::ByteReceived => {
                if t.phase != Phase::Data || t.kind != TransferKind::Read {
                    return;
                }
                let byte = bus.read_data();
                let _ = t.buffer.push(byte);
                t.handled += 1;
                if t.requested - t.handled == 1 {
                    bus.set_ack(false);
                    bus.request_stop();
                }
                if t.handled == t.requested {
                    bus.set_rx_notify(false);
                    complete(t, sched, watchdog, TransferStatus::Ok);
                }
            }
            BusEvent::Nack => fail(t, sched, watchdog, I2cError::Nack),
            BusEvent::BusFault => fail(t, sched, watchdog, I2cError::BusFault),
        });
    }

    /// Drive until the in-flight transaction is consumable, then consume it
    fn drive(&mut self, sched: &mut Scheduler) -> I2cResult<Completion> {
        loop {
            self.pump(sched);
            match self.poll() {
                Ok(done) => return Ok(done),
                Err(nb::Error::Other(err)) => return Err(err),
                // One base tick per spin keeps the watchdog counting.
                Err(nb::Error::WouldBlock) => sched.tick(),
            }
        }
    }
}

/// Terminal phase transition: latch the result and park the watchdog
fn complete(t: &mut Transaction, sched: &mut Scheduler, watchdog: TaskHandle, status: TransferStatus) {
    t.phase = Phase::Done(status);
    t.ready = true;
    let _ = sched.set_state(watchdog, TaskState::Stopped);
}

fn fail(t: &mut Transaction, sched: &mut Scheduler, watchdog: TaskHandle, err: I2cError) {
    if !t.phase.in_flight() {
        return;
    }
    t.fault = Some(err);
    complete(t, sched, watchdog, TransferStatus::Error);
}
