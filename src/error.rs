//! Unified error type for chargeport.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

use core::fmt;

use crate::config::{
    ERROR_ILLEGAL_PORT, ERROR_INVALID_TRANSITION, ERROR_MALFORMED_COMMAND, ERROR_NO_AVAILABLE_PORT,
};
use crate::machine::Event;
use crate::port::PortStatus;

/// Top-level error type used across the station core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Port index outside `0..capacity`.
    InvalidPort(usize),

    /// "Any port" was requested but every port is busy.
    NoAvailablePort,

    /// The event is not accepted in the port's current state.
    InvalidTransition {
        port: usize,
        from: PortStatus,
        event: Event,
    },

    /// A command write could not be decoded.
    MalformedCommand,
}

impl Error {
    /// One-byte code reported to the BLE client in the command result.
    pub const fn wire_code(&self) -> u8 {
        match self {
            Error::InvalidPort(_) => ERROR_ILLEGAL_PORT,
            Error::NoAvailablePort => ERROR_NO_AVAILABLE_PORT,
            Error::InvalidTransition { .. } => ERROR_INVALID_TRANSITION,
            Error::MalformedCommand => ERROR_MALFORMED_COMMAND,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPort(index) => write!(f, "invalid port {}", index),
            Error::NoAvailablePort => f.write_str("no port available"),
            Error::InvalidTransition { port, from, event } => {
                write!(f, "port {}: {:?} not accepted in {:?}", port, event, from)
            }
            Error::MalformedCommand => f.write_str("malformed command"),
        }
    }
}

/// Shorthand used by every fallible core operation.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_match_reserved_values() {
        assert_eq!(Error::InvalidPort(9).wire_code(), 0xF0);
        assert_eq!(Error::NoAvailablePort.wire_code(), 0xF1);
        assert_eq!(
            Error::InvalidTransition {
                port: 0,
                from: PortStatus::Available,
                event: Event::PaymentConfirmed,
            }
            .wire_code(),
            0xF2
        );
        assert_eq!(Error::MalformedCommand.wire_code(), 0xF3);
    }

    #[test]
    fn display_names_the_port() {
        assert_eq!(Error::InvalidPort(10).to_string(), "invalid port 10");
        assert_eq!(
            Error::InvalidTransition {
                port: 2,
                from: PortStatus::Available,
                event: Event::Unplug,
            }
            .to_string(),
            "port 2: Unplug not accepted in Available"
        );
    }
}
