//! Transaction descriptor and completion types

use alloc::boxed::Box;
use core::fmt;

use heapless::Vec;

use crate::I2cError;

/// Transfer buffer capacity in bytes, shared by all transactions
pub const BUF_CAPACITY: usize = 32;

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Write,
    Read,
}

impl TransferKind {
    /// Direction bit carried in the address byte
    pub(crate) const fn direction_bit(self) -> u8 {
        match self {
            Self::Write => 0,
            Self::Read => 1,
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => write!(f, "Write"),
            Self::Read => write!(f, "Read"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TransferKind {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Write => defmt::write!(fmt, "Write"),
            Self::Read => defmt::write!(fmt, "Read"),
        }
    }
}

/// Final status handed to completion callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Ok,
    Error,
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "Ok"),
            Self::Error => write!(f, "Error"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TransferStatus {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Ok => defmt::write!(fmt, "Ok"),
            Self::Error => defmt::write!(fmt, "Error"),
        }
    }
}

/// Completion callback: kind, final status, and the handled bytes
pub type CompletionFn = Box<dyn FnOnce(TransferKind, TransferStatus, &[u8]) + Send>;

/// Successful result returned by [`I2cMaster::poll`](crate::I2cMaster::poll)
#[derive(Debug, Clone)]
pub struct Completion {
    pub kind: TransferKind,
    /// Bytes sent (writes) or received (reads)
    pub data: Vec<u8, BUF_CAPACITY>,
}

impl Completion {
    /// Number of bytes handled before the stop condition
    pub fn handled(&self) -> usize {
        self.data.len()
    }
}

/// Bus protocol position of the in-flight transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Start,
    Address,
    Data,
    Done(TransferStatus),
}

impl Phase {
    pub(crate) fn is_idle(self) -> bool {
        self == Self::Idle
    }

    /// True between admission and completion
    pub(crate) fn in_flight(self) -> bool {
        matches!(self, Self::Start | Self::Address | Self::Data)
    }
}

/// The driver's single mutable in-flight-operation record
pub(crate) struct Transaction {
    pub(crate) address: u8,
    pub(crate) kind: TransferKind,
    pub(crate) requested: usize,
    pub(crate) handled: usize,
    pub(crate) phase: Phase,
    pub(crate) ready: bool,
    pub(crate) fault: Option<I2cError>,
    pub(crate) buffer: Vec<u8, BUF_CAPACITY>,
    pub(crate) callback: Option<CompletionFn>,
}

impl Transaction {
    pub(crate) fn new() -> Self {
        Self {
            address: 0,
            kind: TransferKind::Write,
            requested: 0,
            handled: 0,
            phase: Phase::Idle,
            ready: false,
            fault: None,
            buffer: Vec::new(),
            callback: None,
        }
    }

    /// Return the descriptor to idle, dropping any unconsumed result
    pub(crate) fn reset(&mut self) {
        self.address = 0;
        self.kind = TransferKind::Write;
        self.requested = 0;
        self.handled = 0;
        self.phase = Phase::Idle;
        self.ready = false;
        self.fault = None;
        self.buffer.clear();
        self.callback = None;
    }

    /// Admit a write: payload copied into the transfer buffer
    pub(crate) fn begin_write(&mut self, address: u8, data: &[u8], callback: Option<CompletionFn>) {
        self.address = address;
        self.kind = TransferKind::Write;
        self.requested = data.len();
        self.handled = 0;
        self.phase = Phase::Start;
        self.ready = false;
        self.fault = None;
        self.buffer.clear();
        // Length was checked at admission.
        let _ = self.buffer.extend_from_slice(data);
        self.callback = callback;
    }

    /// Admit a read of `len` bytes
    pub(crate) fn begin_read(&mut self, address: u8, len: usize, callback: Option<CompletionFn>) {
        self.address = address;
        self.kind = TransferKind::Read;
        self.requested = len;
        self.handled = 0;
        self.phase = Phase::Start;
        self.ready = false;
        self.fault = None;
        self.buffer.clear();
        self.callback = callback;
    }

    /// Address byte with the direction bit
    pub(crate) fn address_byte(&self) -> u8 {
        (self.address << 1) | self.kind.direction_bit()
    }

    /// Watchdog expiry: fault the transaction if it is still in flight
    pub(crate) fn expire(&mut self) {
        if self.phase.in_flight() {
            self.fault = Some(I2cError::Timeout);
            self.phase = Phase::Done(TransferStatus::Error);
            self.ready = true;
        }
    }
}
