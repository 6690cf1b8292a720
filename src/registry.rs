//! Fixed-capacity port registry.
//!
//! Owns one [`PortRecord`] per physical port.  Each record sits behind its
//! own critical-section mutex, so the radio event handler and the tick task
//! can touch the same port without ever observing a half-applied
//! transition.  Cross-port operations lock one port at a time.
//!
//! The registry is created once at startup (the firmware places it in a
//! `StaticCell`) and shared by `&'static` reference; it is never resized and
//! ports are never removed, only reset to `Available`.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::CHOOSE_AVAILABLE_PORT;
use crate::error::{Error, Result};
use crate::machine::{self, Event, Timing, Transition};
use crate::port::{PortRecord, PortStatus, Ticks};

type PortCell = Mutex<CriticalSectionRawMutex, Cell<PortRecord>>;

/// Fixed set of `N` charging ports.
pub struct PortRegistry<const N: usize> {
    ports: [PortCell; N],
    timing: Timing,
}

impl<const N: usize> PortRegistry<N> {
    // Port indices travel as one byte and 255 means "any port".
    const CAPACITY_OK: () = assert!(
        N > 0 && N < CHOOSE_AVAILABLE_PORT as usize,
        "port count must be in 1..=254"
    );

    /// All ports `Available`, default timing.
    pub fn new() -> Self {
        Self::with_timing(Timing::DEFAULT)
    }

    /// All ports `Available`, custom countdown budgets.
    pub fn with_timing(timing: Timing) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_OK;

        Self {
            ports: core::array::from_fn(|index| Mutex::new(Cell::new(PortRecord::new(index)))),
            timing,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    fn cell(&self, index: usize) -> Result<&PortCell> {
        self.ports.get(index).ok_or(Error::InvalidPort(index))
    }

    /// Read-modify-write one record inside its critical section.
    fn update<R>(&self, index: usize, f: impl FnOnce(&mut PortRecord) -> R) -> Result<R> {
        let cell = self.cell(index)?;
        Ok(cell.lock(|c| {
            let mut record = c.get();
            let out = f(&mut record);
            c.set(record);
            out
        }))
    }

    /// Consistent copy of one port.
    pub fn get(&self, index: usize) -> Result<PortRecord> {
        self.cell(index).map(|cell| cell.lock(Cell::get))
    }

    /// Copy of every port, in index order.
    ///
    /// Each record is individually consistent; the set is not a single
    /// atomic snapshot.
    pub fn snapshot(&self) -> [PortRecord; N] {
        core::array::from_fn(|index| self.ports[index].lock(Cell::get))
    }

    pub fn status_of(&self, index: usize) -> Result<PortStatus> {
        self.get(index).map(|r| r.status)
    }

    pub fn is_available(&self, index: usize) -> Result<bool> {
        self.get(index).map(|r| r.is_available())
    }

    pub fn is_free_charging(&self, index: usize) -> Result<bool> {
        self.get(index).map(|r| r.is_free_charging())
    }

    pub fn is_actively_charging(&self, index: usize) -> Result<bool> {
        self.get(index).map(|r| r.is_actively_charging())
    }

    pub fn remaining_ticks_of(&self, index: usize) -> Result<Ticks> {
        self.get(index).map(|r| r.remaining_charge_ticks)
    }

    /// Administrative status override. No legality check.
    ///
    /// `FreeCharge` and `ActiveCharge` keep the current countdown; every
    /// other status clears it.
    pub fn set_status(&self, index: usize, status: PortStatus) -> Result<Transition> {
        let t = self.update(index, |record| {
            let ticks = record.remaining_charge_ticks;
            machine::overwrite(record, status, ticks)
        })?;
        warn!("port {}: status overridden {} -> {}", index, t.from, t.to);
        Ok(t)
    }

    /// Administrative override of status and countdown as one atomic write.
    ///
    /// `ticks` only applies to `FreeCharge` and `ActiveCharge`.
    pub fn init_port(&self, index: usize, status: PortStatus, ticks: Ticks) -> Result<Transition> {
        let t = self.update(index, |record| machine::overwrite(record, status, ticks))?;
        warn!(
            "port {}: initialised {} -> {} with {} ticks",
            index, t.from, t.to, t.remaining_ticks
        );
        Ok(t)
    }

    /// Administrative countdown override.
    ///
    /// Ignored for ports that are not counting down, whose countdown stays 0.
    pub fn set_remaining_ticks(&self, index: usize, ticks: Ticks) -> Result<()> {
        let applied = self.update(index, |record| {
            if record.status.is_ticking() {
                record.remaining_charge_ticks = ticks;
            }
            record.status.is_ticking()
        })?;
        if applied {
            debug!("port {}: remaining ticks overridden to {}", index, ticks);
        } else {
            warn!("port {}: not counting down, ticks override ignored", index);
        }
        Ok(())
    }

    /// Apply a discrete event to one port as a single atomic step.
    pub fn apply_event(&self, index: usize, event: Event) -> Result<Transition> {
        let timing = self.timing;
        let result = self.update(index, |record| machine::handle(record, event, &timing))?;

        match &result {
            Ok(t) => info!("port {}: {} -> {} on {}", index, t.from, t.to, event),
            Err(e) => warn!("port {}: rejected {}", index, e),
        }
        result
    }

    /// Tick one port; `Some` when the tick expired it.
    pub fn tick_port(&self, index: usize) -> Result<Option<Transition>> {
        let expired = self.update(index, machine::tick)?;
        if let Some(t) = &expired {
            info!("port {}: {} -> {} on expiry", index, t.from, t.to);
        }
        Ok(expired)
    }

    /// Tick one port; true exactly when this tick brought its counter to 0.
    pub fn apply_tick(&self, index: usize) -> Result<bool> {
        self.tick_port(index).map(|t| t.is_some())
    }

    /// Lowest-index port currently `Available`.
    pub fn find_available(&self) -> Result<usize> {
        self.ports
            .iter()
            .position(|cell| cell.lock(|c| c.get().is_available()))
            .ok_or(Error::NoAvailablePort)
    }

    /// Plug into the lowest-index `Available` port.
    ///
    /// The availability check and the transition happen inside the same
    /// critical section, so a port is never claimed twice.
    pub fn claim_available(&self) -> Result<Transition> {
        let timing = self.timing;
        for cell in &self.ports {
            let claimed = cell.lock(|c| {
                let mut record = c.get();
                if !record.is_available() {
                    return None;
                }
                let t = machine::handle(&mut record, Event::PlugIn, &timing).ok()?;
                c.set(record);
                Some(t)
            });

            if let Some(t) = claimed {
                info!("port {}: {} -> {} on allocation", t.port, t.from, t.to);
                return Ok(t);
            }
        }

        warn!("no port available");
        Err(Error::NoAvailablePort)
    }
}

impl<const N: usize> Default for PortRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CHARGE_TIME_TICKS, FREE_TIME_TICKS};

    #[test]
    fn initial_ports_are_available() {
        let reg = PortRegistry::<4>::new();
        assert_eq!(reg.capacity(), 4);
        for (index, record) in reg.snapshot().iter().enumerate() {
            assert_eq!(*record, PortRecord::new(index));
        }
    }

    #[test]
    fn out_of_range_index_is_invalid_port() {
        let reg = PortRegistry::<4>::new();
        assert_eq!(reg.get(10), Err(Error::InvalidPort(10)));
        assert_eq!(reg.get(4), Err(Error::InvalidPort(4)));
        assert_eq!(
            reg.set_status(4, PortStatus::FreeCharge),
            Err(Error::InvalidPort(4))
        );
        assert_eq!(reg.set_remaining_ticks(7, 1), Err(Error::InvalidPort(7)));
        assert_eq!(reg.apply_tick(4), Err(Error::InvalidPort(4)));
        assert_eq!(
            reg.apply_event(200, Event::PlugIn),
            Err(Error::InvalidPort(200))
        );
    }

    #[test]
    fn queries_track_events() {
        let reg = PortRegistry::<4>::new();
        reg.apply_event(2, Event::PlugIn).unwrap();
        assert!(reg.is_free_charging(2).unwrap());
        assert!(!reg.is_available(2).unwrap());
        assert_eq!(reg.remaining_ticks_of(2), Ok(FREE_TIME_TICKS));

        reg.apply_event(2, Event::PaymentConfirmed).unwrap();
        assert!(reg.is_actively_charging(2).unwrap());
        assert_eq!(reg.status_of(2), Ok(PortStatus::ActiveCharge));
        assert_eq!(reg.remaining_ticks_of(2), Ok(CHARGE_TIME_TICKS));
    }

    #[test]
    fn set_status_to_expired_clears_countdown() {
        let reg = PortRegistry::<4>::new();
        reg.apply_event(0, Event::PlugIn).unwrap();
        let t = reg
            .set_status(0, PortStatus::FreeChargeNotAvailable)
            .unwrap();
        assert_eq!(t.from, PortStatus::FreeCharge);
        assert_eq!(t.remaining_ticks, 0);
        assert_eq!(reg.remaining_ticks_of(0), Ok(0));
    }

    #[test]
    fn init_port_writes_status_and_ticks_together() {
        let reg = PortRegistry::<4>::new();
        let t = reg.init_port(1, PortStatus::ActiveCharge, 30).unwrap();
        assert!(t.changed());
        assert_eq!(reg.status_of(1), Ok(PortStatus::ActiveCharge));
        assert_eq!(reg.remaining_ticks_of(1), Ok(30));

        // A tick landing right after the override sees a consistent record.
        assert_eq!(reg.apply_tick(1), Ok(false));
        assert_eq!(reg.remaining_ticks_of(1), Ok(29));

        assert_eq!(
            reg.init_port(4, PortStatus::FreeCharge, 1),
            Err(Error::InvalidPort(4))
        );
    }

    #[test]
    fn ticks_override_ignored_on_idle_port() {
        let reg = PortRegistry::<4>::new();
        reg.set_remaining_ticks(2, 30).unwrap();
        assert_eq!(reg.get(2), Ok(PortRecord::new(2)));
    }

    #[test]
    fn set_status_is_unchecked_override() {
        let reg = PortRegistry::<4>::new();
        reg.set_status(1, PortStatus::FreeChargeNotAvailable).unwrap();
        assert_eq!(reg.status_of(1), Ok(PortStatus::FreeChargeNotAvailable));

        reg.apply_event(0, Event::PlugIn).unwrap();
        reg.set_status(0, PortStatus::Available).unwrap();
        assert_eq!(reg.get(0), Ok(PortRecord::new(0)));
    }

    #[test]
    fn set_remaining_ticks_then_expire() {
        let reg = PortRegistry::<4>::new();
        reg.apply_event(3, Event::PlugIn).unwrap();
        reg.set_remaining_ticks(3, 1).unwrap();
        assert_eq!(reg.apply_tick(3), Ok(true));
        assert_eq!(reg.status_of(3), Ok(PortStatus::FreeChargeNotAvailable));
    }

    #[test]
    fn apply_tick_reports_expiry_only_once() {
        let reg = PortRegistry::<2>::with_timing(Timing {
            free_ticks: 2,
            charge_ticks: 2,
        });
        reg.apply_event(0, Event::PlugIn).unwrap();
        assert_eq!(reg.apply_tick(0), Ok(false));
        assert_eq!(reg.apply_tick(0), Ok(true));
        assert_eq!(reg.apply_tick(0), Ok(false));
        assert_eq!(reg.remaining_ticks_of(0), Ok(0));
    }

    #[test]
    fn find_available_picks_lowest_index() {
        let reg = PortRegistry::<3>::new();
        assert_eq!(reg.find_available(), Ok(0));
        reg.apply_event(0, Event::PlugIn).unwrap();
        assert_eq!(reg.find_available(), Ok(1));
        reg.apply_event(1, Event::PlugIn).unwrap();
        reg.apply_event(2, Event::PlugIn).unwrap();
        assert_eq!(reg.find_available(), Err(Error::NoAvailablePort));
    }

    #[test]
    fn claim_available_plugs_in_and_exhausts() {
        let reg = PortRegistry::<2>::new();
        reg.apply_event(0, Event::PlugIn).unwrap();

        let t = reg.claim_available().unwrap();
        assert_eq!(t.port, 1);
        assert_eq!(t.to, PortStatus::FreeCharge);
        assert_eq!(reg.remaining_ticks_of(1), Ok(FREE_TIME_TICKS));

        assert_eq!(reg.claim_available(), Err(Error::NoAvailablePort));
    }

    #[test]
    fn not_available_ticks_stay_zero() {
        let reg = PortRegistry::<1>::with_timing(Timing {
            free_ticks: 1,
            charge_ticks: 1,
        });
        reg.apply_event(0, Event::PlugIn).unwrap();
        reg.apply_tick(0).unwrap();
        assert_eq!(reg.get(0).unwrap().not_available_ticks, 0);
    }
}
