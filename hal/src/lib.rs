//! Hardware access layer for the Hearth controller kernel
//!
//! This crate defines the narrow, vendor-agnostic traits the timing kernel
//! needs from the hardware: the I2C controller register interface and the
//! periodic tick source. Concrete implementations live in board crates;
//! tests and the host demo supply scripted doubles.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod bus;
pub mod error;
pub mod tick;

// Re-export commonly used types
pub use bus::{BusConfig, BusEvent, BusInterface, BusSpeed};
pub use error::{HalError, HalResult};
pub use tick::TickSource;
