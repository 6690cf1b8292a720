//! GATT wire format for the charging service.
//!
//! Command write (2 bytes):
//! ```text
//! Byte 0: Opcode   0x01 plug-in, 0x02 payment confirmed,
//!                  0x03 unplug,  0x04 admin reset
//! Byte 1: Port     0..PORT_COUNT-1, or 0xFF = any available port
//! ```
//!
//! Command result (2 bytes, readable + notified after every write):
//! ```text
//! Byte 0: Opcode echoed back (0x00 if the write did not decode)
//! Byte 1: Resolved port index, or an error code (0xF0..=0xF3)
//! ```
//!
//! Port state notification (4 bytes):
//! ```text
//! Byte 0:   Port index
//! Byte 1:   Status (0 available, 1 free charge, 2 active charge,
//!           3 free time expired)
//! Byte 2-3: Remaining ticks, little-endian
//! ```

use crate::config::CHOOSE_AVAILABLE_PORT;
use crate::error::{Error, Result};
use crate::machine::{Event, Transition};
use crate::port::{PortStatus, Ticks};

/// Command write size in bytes.
pub const COMMAND_SIZE: usize = 2;

/// Command result size in bytes.
pub const COMMAND_RESULT_SIZE: usize = 2;

/// Port state notification size in bytes.
pub const PORT_UPDATE_SIZE: usize = 4;

/// Which port a command targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortSelector {
    /// Lowest-index available port.
    Any,
    /// A specific port (not yet range-checked).
    Index(usize),
}

impl PortSelector {
    pub const fn from_wire(byte: u8) -> Self {
        if byte == CHOOSE_AVAILABLE_PORT {
            PortSelector::Any
        } else {
            PortSelector::Index(byte as usize)
        }
    }
}

/// Decoded command write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    pub event: Event,
    pub port: PortSelector,
}

impl Command {
    pub const fn opcode_of(event: Event) -> u8 {
        match event {
            Event::PlugIn => 0x01,
            Event::PaymentConfirmed => 0x02,
            Event::Unplug => 0x03,
            Event::AdminReset => 0x04,
        }
    }

    /// Parse a command write. Extra trailing bytes are ignored.
    pub fn from_ble_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < COMMAND_SIZE {
            return Err(Error::MalformedCommand);
        }
        let event = match data[0] {
            0x01 => Event::PlugIn,
            0x02 => Event::PaymentConfirmed,
            0x03 => Event::Unplug,
            0x04 => Event::AdminReset,
            _ => return Err(Error::MalformedCommand),
        };
        Ok(Self {
            event,
            port: PortSelector::from_wire(data[1]),
        })
    }

    pub const fn opcode(&self) -> u8 {
        Self::opcode_of(self.event)
    }
}

/// Outcome of one command write as reported back to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandResult {
    pub opcode: u8,
    pub code: u8,
}

impl CommandResult {
    /// Build the result for `opcode`; the port index on success, the error's
    /// wire code otherwise.
    pub fn new(opcode: u8, outcome: &Result<Transition>) -> Self {
        let code = match outcome {
            Ok(t) => t.port as u8,
            Err(e) => e.wire_code(),
        };
        Self { opcode, code }
    }

    /// Result for a write that did not decode.
    pub const fn malformed() -> Self {
        Self {
            opcode: 0,
            code: Error::MalformedCommand.wire_code(),
        }
    }

    pub const fn to_bytes(&self) -> [u8; COMMAND_RESULT_SIZE] {
        [self.opcode, self.code]
    }
}

/// "Port state changed" payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortUpdate {
    pub port: u8,
    pub status: PortStatus,
    pub remaining_ticks: Ticks,
}

impl PortUpdate {
    pub const fn to_bytes(&self) -> [u8; PORT_UPDATE_SIZE] {
        let ticks = self.remaining_ticks.to_le_bytes();
        [self.port, self.status.to_wire(), ticks[0], ticks[1]]
    }

    pub fn from_ble_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < PORT_UPDATE_SIZE {
            return None;
        }
        Some(Self {
            port: data[0],
            status: PortStatus::from_wire(data[1])?,
            remaining_ticks: u16::from_le_bytes([data[2], data[3]]),
        })
    }
}

impl From<&Transition> for PortUpdate {
    fn from(t: &Transition) -> Self {
        Self {
            // Registry capacity is capped below 255, so every index fits.
            port: t.port as u8,
            status: t.to,
            remaining_ticks: t.remaining_ticks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_decodes_each_opcode() {
        let cases = [
            (0x01, Event::PlugIn),
            (0x02, Event::PaymentConfirmed),
            (0x03, Event::Unplug),
            (0x04, Event::AdminReset),
        ];
        for (opcode, event) in cases {
            let cmd = Command::from_ble_bytes(&[opcode, 2]).unwrap();
            assert_eq!(cmd.event, event);
            assert_eq!(cmd.port, PortSelector::Index(2));
            assert_eq!(cmd.opcode(), opcode);
        }
    }

    #[test]
    fn command_sentinel_selects_any_port() {
        let cmd = Command::from_ble_bytes(&[0x01, 0xFF]).unwrap();
        assert_eq!(cmd.port, PortSelector::Any);
    }

    #[test]
    fn command_rejects_short_or_unknown() {
        assert_eq!(Command::from_ble_bytes(&[]), Err(Error::MalformedCommand));
        assert_eq!(Command::from_ble_bytes(&[0x01]), Err(Error::MalformedCommand));
        assert_eq!(
            Command::from_ble_bytes(&[0x00, 0x01]),
            Err(Error::MalformedCommand)
        );
        assert_eq!(
            Command::from_ble_bytes(&[0x05, 0x01]),
            Err(Error::MalformedCommand)
        );
    }

    #[test]
    fn command_ignores_trailing_bytes() {
        let cmd = Command::from_ble_bytes(&[0x03, 0x01, 0xAA, 0xBB]).unwrap();
        assert_eq!(cmd.event, Event::Unplug);
    }

    #[test]
    fn result_carries_port_or_error_code() {
        let ok = Ok(Transition {
            port: 3,
            from: PortStatus::Available,
            to: PortStatus::FreeCharge,
            remaining_ticks: 5,
        });
        assert_eq!(CommandResult::new(0x01, &ok).to_bytes(), [0x01, 3]);

        let busy: Result<Transition> = Err(Error::NoAvailablePort);
        assert_eq!(CommandResult::new(0x01, &busy).to_bytes(), [0x01, 0xF1]);

        let bad: Result<Transition> = Err(Error::InvalidPort(9));
        assert_eq!(CommandResult::new(0x03, &bad).to_bytes(), [0x03, 0xF0]);

        assert_eq!(CommandResult::malformed().to_bytes(), [0x00, 0xF3]);
    }

    #[test]
    fn port_update_layout() {
        let update = PortUpdate {
            port: 1,
            status: PortStatus::ActiveCharge,
            remaining_ticks: 0x0102,
        };
        assert_eq!(update.to_bytes(), [0x01, 0x02, 0x02, 0x01]);
        assert_eq!(PortUpdate::from_ble_bytes(&update.to_bytes()), Some(update));
    }

    #[test]
    fn port_update_rejects_unknown_status() {
        assert_eq!(PortUpdate::from_ble_bytes(&[0, 9, 0, 0]), None);
        assert_eq!(PortUpdate::from_ble_bytes(&[0, 1, 0]), None);
    }
}
