//! Application-wide constants and compile-time configuration.
//!
//! All port timing parameters, BLE identifiers and wire-protocol
//! constants live here so they can be tuned in one place.

// Ports

/// Number of physical USB charging ports on the station.
///
/// This is the single source of truth for the registry capacity.  It must
/// stay below [`CHOOSE_AVAILABLE_PORT`], which is reserved on the wire.
pub const PORT_COUNT: usize = 4;

/// Length of one scheduler tick (seconds).
pub const TICK_PERIOD_SECS: u64 = 60;

/// Free-grace charging budget, in ticks (5 min).
pub const FREE_TIME_TICKS: u16 = 5;

/// Paid charging session budget, in ticks (1 h).
pub const CHARGE_TIME_TICKS: u16 = 60;

// Wire protocol

/// Port byte meaning "pick the lowest available port".
pub const CHOOSE_AVAILABLE_PORT: u8 = 255;

/// Result byte: the requested port index does not exist.
pub const ERROR_ILLEGAL_PORT: u8 = 0xF0;

/// Result byte: every port is busy.
pub const ERROR_NO_AVAILABLE_PORT: u8 = 0xF1;

/// Result byte: the event is not legal in the port's current state.
pub const ERROR_INVALID_TRANSITION: u8 = 0xF2;

/// Result byte: the command write could not be decoded.
pub const ERROR_MALFORMED_COMMAND: u8 = 0xF3;

/// Depth of the queue between the state machine and the BLE notifier.
pub const NOTIFY_QUEUE_DEPTH: usize = 8;

// BLE

/// Advertised device name.
pub const BLE_DEVICE_NAME: &str = "ChargePort";

/// 128-bit service UUID (base `0000xxxx-1212-efde-1523-785fef13d123`,
/// 16-bit service id 0xF00D), little-endian as carried in advertising data.
pub const SERVICE_UUID_LE: [u8; 16] = 0x0000_f00d_1212_efde_1523_785f_ef13_d123_u128.to_le_bytes();

/// Advertising interval (in 0.625 ms units). 400 = 250 ms.
pub const BLE_ADV_INTERVAL: u32 = 400;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   USB port 0 power enable → P0.03
//   USB port 1 power enable → P0.04
//   USB port 2 power enable → P0.28
//   USB port 3 power enable → P0.29
//
// Power enables are active-high.
