//! USB power-line driver.
//!
//! Each charging port has one active-high power enable.  The power task
//! re-reads the registry whenever a state change is signalled and switches
//! every line to match [`chargeport::power_logic::power_enables`].
//!
//! Lines start switched off; a port only gets power while it is in free
//! grace or in a paid session.

use chargeport::power_logic;
use chargeport::PortRegistry;
use defmt::{debug, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::digital::OutputPin;

/// Raised after any transition that may change which ports need power.
static POWER_REFRESH: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Ask the power task to re-apply power enables.
pub fn request_refresh() {
    POWER_REFRESH.signal(());
}

/// The bank of per-port power enables.
pub struct PowerLines<P, const N: usize> {
    pins: [P; N],
}

impl<P: OutputPin, const N: usize> PowerLines<P, N> {
    pub fn new(pins: [P; N]) -> Self {
        let mut lines = Self { pins };
        lines.apply(&[false; N]);
        lines
    }

    pub fn apply(&mut self, enables: &[bool; N]) {
        for (port, (pin, &on)) in self.pins.iter_mut().zip(enables).enumerate() {
            let result = if on { pin.set_high() } else { pin.set_low() };
            if result.is_err() {
                warn!("port {}: power line write failed", port);
            }
        }
    }
}

/// Keep the power lines in sync with the registry. Never returns.
pub async fn run<P: OutputPin, const N: usize>(
    registry: &PortRegistry<N>,
    mut lines: PowerLines<P, N>,
) -> ! {
    loop {
        let enables = power_logic::power_enables(&registry.snapshot());
        lines.apply(&enables);
        debug!("Power: enables={}", enables);

        POWER_REFRESH.wait().await;
    }
}
