#![no_std]

//! # Hearth Core
//!
//! Core types shared by the Hearth controller kernel crates: tick
//! arithmetic, the two dispatch lanes, and the critical-section cell used
//! wherever interrupt and main-loop code share a record.

extern crate alloc;

pub mod cell;
pub mod lane;
pub mod time;

pub use cell::Shared;
pub use lane::Lane;
pub use time::Ticks;

/// Kernel crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
