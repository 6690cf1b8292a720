//! Host-testable core of the chargeport firmware.
//!
//! Everything here is pure logic (port registry, charging state machine,
//! tick scheduler, notification bridge, GATT wire format) and runs on the
//! host without hardware.
//!
//! Usage: `cargo test`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and links this library for the station core.

#![cfg_attr(not(test), no_std)]

// This must go first so the logging macros are visible to every module.
mod fmt;

pub mod bridge;
pub mod config;
pub mod error;
pub mod machine;
pub mod port;
pub mod power_logic;
pub mod protocol;
pub mod registry;
pub mod scheduler;
pub mod station;

pub use bridge::{NotificationBridge, StatusSink};
pub use error::{Error, Result};
pub use machine::{Event, Timing, Transition};
pub use port::{PortRecord, PortStatus, Ticks};
pub use protocol::{Command, CommandResult, PortSelector, PortUpdate};
pub use registry::PortRegistry;
pub use station::ChargingStation;
