#![no_std]

//! # Hearth I2C
//!
//! Interrupt-stepped I2C master driver. One transaction is in flight at a
//! time, described by a single shared descriptor and advanced by hardware
//! bus events; a scheduler-hosted watchdog bounds every transaction, so the
//! blocking wrappers can never spin forever on a stalled bus. Results are
//! consumed through [`I2cMaster::poll`], which is also the only place that
//! invokes completion callbacks or resets the bus after a failure.

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use core::fmt;

use hearth_hal::HalError;
use hearth_sched::SchedError;

pub mod driver;
pub mod transaction;

pub use driver::{I2cConfig, I2cMaster, TIMEOUT_DEFAULT, TIMEOUT_MAX, TIMEOUT_MIN};
pub use transaction::{Completion, CompletionFn, TransferKind, TransferStatus, BUF_CAPACITY};

/// Result type used throughout the driver
pub type I2cResult<T> = Result<T, I2cError>;

/// Error types for I2C operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cError {
    /// Payload exceeds the transfer buffer capacity
    PayloadTooLarge,
    /// A transaction is already in flight
    Busy,
    /// Target did not acknowledge
    Nack,
    /// Electrical or protocol fault on the bus
    BusFault,
    /// Watchdog expired before the transaction completed
    Timeout,
    /// Timeout outside the accepted range
    BadTimeout,
    /// Scheduler rejected a watchdog operation
    Scheduler(SchedError),
    /// Controller hardware reported an error
    Hardware(HalError),
}

impl fmt::Display for I2cError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            I2cError::PayloadTooLarge => write!(f, "payload exceeds transfer buffer"),
            I2cError::Busy => write!(f, "transaction already in flight"),
            I2cError::Nack => write!(f, "target did not acknowledge"),
            I2cError::BusFault => write!(f, "bus fault"),
            I2cError::Timeout => write!(f, "transaction timed out"),
            I2cError::BadTimeout => write!(f, "timeout outside accepted range"),
            I2cError::Scheduler(err) => write!(f, "watchdog scheduling failed: {}", err),
            I2cError::Hardware(err) => write!(f, "controller error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for I2cError {}

#[cfg(feature = "defmt")]
impl defmt::Format for I2cError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            I2cError::PayloadTooLarge => defmt::write!(fmt, "PayloadTooLarge"),
            I2cError::Busy => defmt::write!(fmt, "Busy"),
            I2cError::Nack => defmt::write!(fmt, "Nack"),
            I2cError::BusFault => defmt::write!(fmt, "BusFault"),
            I2cError::Timeout => defmt::write!(fmt, "Timeout"),
            I2cError::BadTimeout => defmt::write!(fmt, "BadTimeout"),
            I2cError::Scheduler(err) => defmt::write!(fmt, "Scheduler({})", err),
            I2cError::Hardware(err) => defmt::write!(fmt, "Hardware({})", err),
        }
    }
}

impl embedded_hal::i2c::Error for I2cError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
        match self {
            I2cError::Nack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            I2cError::BusFault => ErrorKind::Bus,
            _ => ErrorKind::Other,
        }
    }
}
