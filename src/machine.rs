//! Charging state machine.
//!
//! Pure transition logic over a single [`PortRecord`]: no locking, no
//! logging, no I/O.  The registry wraps every call in the port's critical
//! section.
//!
//! ```text
//!               plug_in                 payment_confirmed
//!  Available ───────────▶ FreeCharge ───────────────────▶ ActiveCharge
//!      ▲                      │                                │
//!      │          free ticks  │ run out          paid ticks    │ run out
//!      │                      ▼                                │
//!      │          FreeChargeNotAvailable                       │
//!      │                      │                                │
//!      └──────── unplug ──────┴────────────────────────────────┘
//! ```
//!
//! `AdminReset` returns any state to `Available`.

use crate::config::{CHARGE_TIME_TICKS, FREE_TIME_TICKS};
use crate::error::{Error, Result};
use crate::port::{PortRecord, PortStatus, Ticks};

/// Discrete events delivered by the transport layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// A device was plugged into the port.
    PlugIn,
    /// Payment for the port's session was confirmed.
    PaymentConfirmed,
    /// The device was removed.
    Unplug,
    /// Unconditional return to `Available`.
    AdminReset,
}

/// Countdown budgets loaded on entry to the charging states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    pub free_ticks: Ticks,
    pub charge_ticks: Ticks,
}

impl Timing {
    pub const DEFAULT: Timing = Timing {
        free_ticks: FREE_TIME_TICKS,
        charge_ticks: CHARGE_TIME_TICKS,
    };
}

impl Default for Timing {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A resolved status change on one port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub port: usize,
    pub from: PortStatus,
    pub to: PortStatus,
    /// Countdown of the port right after the transition.
    pub remaining_ticks: Ticks,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Apply `event` to `record`.
///
/// On rejection the record is left exactly as it was.
pub fn handle(record: &mut PortRecord, event: Event, timing: &Timing) -> Result<Transition> {
    let from = record.status;

    match (from, event) {
        (_, Event::AdminReset) => record.reset(),
        (PortStatus::Available, Event::PlugIn) => {
            record.status = PortStatus::FreeCharge;
            record.remaining_charge_ticks = timing.free_ticks;
        }
        (PortStatus::FreeCharge, Event::PaymentConfirmed) => {
            record.status = PortStatus::ActiveCharge;
            record.remaining_charge_ticks = timing.charge_ticks;
        }
        (
            PortStatus::FreeCharge | PortStatus::ActiveCharge | PortStatus::FreeChargeNotAvailable,
            Event::Unplug,
        ) => record.reset(),
        _ => {
            return Err(Error::InvalidTransition {
                port: record.index,
                from,
                event,
            })
        }
    }

    Ok(Transition {
        port: record.index,
        from,
        to: record.status,
        remaining_ticks: record.remaining_charge_ticks,
    })
}

/// Advance `record` by one tick.
///
/// Only `FreeCharge` and `ActiveCharge` count down.  The decrement saturates
/// at zero, and the tick that lands on zero also performs the expiry
/// transition, which is returned.  A charging port already at zero (only
/// reachable through an admin override) expires on its next tick.
pub fn tick(record: &mut PortRecord) -> Option<Transition> {
    if !record.status.is_ticking() {
        return None;
    }

    record.remaining_charge_ticks = record.remaining_charge_ticks.saturating_sub(1);
    if record.remaining_charge_ticks > 0 {
        return None;
    }

    let from = record.status;
    match from {
        PortStatus::FreeCharge => record.status = PortStatus::FreeChargeNotAvailable,
        _ => record.reset(),
    }

    Some(Transition {
        port: record.index,
        from,
        to: record.status,
        remaining_ticks: record.remaining_charge_ticks,
    })
}

/// Administrative overwrite of status and countdown in one step.
///
/// No legality check. Only `FreeCharge` and `ActiveCharge` keep `ticks`;
/// every other status gets a zero countdown.
pub fn overwrite(record: &mut PortRecord, status: PortStatus, ticks: Ticks) -> Transition {
    let from = record.status;
    record.reset();
    record.status = status;
    if status.is_ticking() {
        record.remaining_charge_ticks = ticks;
    }

    Transition {
        port: record.index,
        from,
        to: record.status,
        remaining_ticks: record.remaining_charge_ticks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Timing = Timing {
        free_ticks: 3,
        charge_ticks: 5,
    };

    fn record_in(status: PortStatus, remaining: Ticks) -> PortRecord {
        PortRecord {
            index: 1,
            status,
            remaining_charge_ticks: remaining,
            not_available_ticks: 0,
        }
    }

    #[test]
    fn plug_in_starts_free_grace() {
        let mut r = PortRecord::new(1);
        let t = handle(&mut r, Event::PlugIn, &T).unwrap();
        assert_eq!(t.from, PortStatus::Available);
        assert_eq!(t.to, PortStatus::FreeCharge);
        assert_eq!(t.remaining_ticks, 3);
        assert_eq!(r.remaining_charge_ticks, 3);
    }

    #[test]
    fn payment_reloads_paid_budget() {
        let mut r = record_in(PortStatus::FreeCharge, 1);
        handle(&mut r, Event::PaymentConfirmed, &T).unwrap();
        assert_eq!(r.status, PortStatus::ActiveCharge);
        assert_eq!(r.remaining_charge_ticks, 5);
    }

    #[test]
    fn unplug_resets_every_busy_state() {
        for status in [
            PortStatus::FreeCharge,
            PortStatus::ActiveCharge,
            PortStatus::FreeChargeNotAvailable,
        ] {
            let mut r = record_in(status, 2);
            r.not_available_ticks = 7;
            let t = handle(&mut r, Event::Unplug, &T).unwrap();
            assert_eq!(t.to, PortStatus::Available);
            assert_eq!(r, PortRecord::new(1));
        }
    }

    #[test]
    fn admin_reset_accepted_everywhere() {
        for status in [
            PortStatus::Available,
            PortStatus::FreeCharge,
            PortStatus::ActiveCharge,
            PortStatus::FreeChargeNotAvailable,
        ] {
            let mut r = record_in(status, 4);
            let t = handle(&mut r, Event::AdminReset, &T).unwrap();
            assert_eq!(t.to, PortStatus::Available);
            assert_eq!(r.remaining_charge_ticks, 0);
        }
    }

    #[test]
    fn rejected_events_leave_record_untouched() {
        let cases = [
            (PortStatus::Available, Event::PaymentConfirmed),
            (PortStatus::Available, Event::Unplug),
            (PortStatus::FreeCharge, Event::PlugIn),
            (PortStatus::ActiveCharge, Event::PlugIn),
            (PortStatus::ActiveCharge, Event::PaymentConfirmed),
            (PortStatus::FreeChargeNotAvailable, Event::PlugIn),
            (PortStatus::FreeChargeNotAvailable, Event::PaymentConfirmed),
        ];
        for (status, event) in cases {
            let mut r = record_in(status, 2);
            let before = r;
            let err = handle(&mut r, event, &T).unwrap_err();
            assert_eq!(
                err,
                Error::InvalidTransition {
                    port: 1,
                    from: status,
                    event
                }
            );
            assert_eq!(r, before);
        }
    }

    #[test]
    fn free_grace_expiry_holds_counter_at_zero() {
        let mut r = record_in(PortStatus::FreeCharge, 1);
        let t = tick(&mut r).unwrap();
        assert_eq!(t.to, PortStatus::FreeChargeNotAvailable);
        assert_eq!(r.remaining_charge_ticks, 0);
        assert_eq!(tick(&mut r), None);
        assert_eq!(r.remaining_charge_ticks, 0);
    }

    #[test]
    fn paid_expiry_frees_port() {
        let mut r = record_in(PortStatus::ActiveCharge, 2);
        assert_eq!(tick(&mut r), None);
        assert_eq!(r.remaining_charge_ticks, 1);
        let t = tick(&mut r).unwrap();
        assert_eq!((t.from, t.to), (PortStatus::ActiveCharge, PortStatus::Available));
        assert_eq!(r, PortRecord::new(1));
    }

    #[test]
    fn charging_port_at_zero_expires_next_tick() {
        let mut r = record_in(PortStatus::FreeCharge, 0);
        assert!(tick(&mut r).is_some());
        assert_eq!(r.status, PortStatus::FreeChargeNotAvailable);
    }

    #[test]
    fn idle_states_ignore_ticks() {
        for status in [PortStatus::Available, PortStatus::FreeChargeNotAvailable] {
            let mut r = record_in(status, 0);
            let before = r;
            assert_eq!(tick(&mut r), None);
            assert_eq!(r, before);
        }
    }

    #[test]
    fn admin_reset_on_available_is_not_a_change() {
        let t = Transition {
            port: 0,
            from: PortStatus::Available,
            to: PortStatus::Available,
            remaining_ticks: 0,
        };
        assert!(!t.changed());
    }

    #[test]
    fn overwrite_sets_status_and_countdown_together() {
        let mut r = PortRecord::new(1);
        let t = overwrite(&mut r, PortStatus::ActiveCharge, 30);
        assert_eq!((t.from, t.to), (PortStatus::Available, PortStatus::ActiveCharge));
        assert_eq!(t.remaining_ticks, 30);
        assert_eq!(r, record_in(PortStatus::ActiveCharge, 30));
    }

    #[test]
    fn overwrite_clears_countdown_of_idle_statuses() {
        for status in [PortStatus::Available, PortStatus::FreeChargeNotAvailable] {
            let mut r = record_in(PortStatus::FreeCharge, 3);
            let t = overwrite(&mut r, status, 9);
            assert_eq!(t.remaining_ticks, 0);
            assert_eq!(r, record_in(status, 0));
        }
    }
}
