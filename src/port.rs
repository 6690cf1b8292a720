//! Per-port record and charging status.
//!
//! A [`PortRecord`] is a small `Copy` value: status and both countdowns are
//! always read and written together, so a transition can never leave the
//! record half-updated.

/// Countdown unit; one tick is [`crate::config::TICK_PERIOD_SECS`] long.
pub type Ticks = u16;

/// Charging state of one USB port.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PortStatus {
    /// Idle, ready for a new device.
    #[default]
    Available = 0,
    /// Busy, charging inside the free grace period (not paid for).
    FreeCharge = 1,
    /// Busy, charging inside a paid session.
    ActiveCharge = 2,
    /// Busy, free grace period expired; power is off until unplugged.
    FreeChargeNotAvailable = 3,
}

impl PortStatus {
    /// Whether the port's USB power line should be switched on.
    pub const fn supplies_power(self) -> bool {
        matches!(self, PortStatus::FreeCharge | PortStatus::ActiveCharge)
    }

    /// Whether the periodic tick counts this port down.
    pub const fn is_ticking(self) -> bool {
        matches!(self, PortStatus::FreeCharge | PortStatus::ActiveCharge)
    }

    /// Status byte used in the port-state notification.
    pub const fn to_wire(self) -> u8 {
        self as u8
    }

    /// Parse a status byte.
    pub const fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(PortStatus::Available),
            1 => Some(PortStatus::FreeCharge),
            2 => Some(PortStatus::ActiveCharge),
            3 => Some(PortStatus::FreeChargeNotAvailable),
            _ => None,
        }
    }
}

/// State of a single charging port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortRecord {
    /// Position in the registry, fixed for the registry's lifetime.
    pub index: usize,
    /// Current charging state.
    pub status: PortStatus,
    /// Free-grace ticks in `FreeCharge`, paid ticks in `ActiveCharge`, 0 otherwise.
    pub remaining_charge_ticks: Ticks,
    /// Reserved lockout countdown after free time expires. Always 0 for now.
    pub not_available_ticks: Ticks,
}

impl PortRecord {
    /// A fresh, available port.
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            status: PortStatus::Available,
            remaining_charge_ticks: 0,
            not_available_ticks: 0,
        }
    }

    /// Return to `Available` with both countdowns cleared.
    pub fn reset(&mut self) {
        *self = Self::new(self.index);
    }

    pub const fn is_available(&self) -> bool {
        matches!(self.status, PortStatus::Available)
    }

    pub const fn is_free_charging(&self) -> bool {
        matches!(self.status, PortStatus::FreeCharge)
    }

    pub const fn is_actively_charging(&self) -> bool {
        matches!(self.status, PortStatus::ActiveCharge)
    }
}
