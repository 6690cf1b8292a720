//! Periodic tick driver.
//!
//! One sweep per [`crate::config::TICK_PERIOD_SECS`]: every port is ticked
//! in increasing index order and the ports that expired are collected in
//! that same order.  The scheduler keeps no per-port state of its own.

use heapless::Vec;

use crate::machine::Transition;
use crate::registry::PortRegistry;

/// Expiry transitions produced by one sweep, in port order.
pub type Expiries<const N: usize> = Vec<Transition, N>;

/// Apply one tick to every port.
///
/// Each port is locked on its own; an event arriving mid-sweep for a port
/// not yet visited is fully applied before that port is ticked.
pub fn sweep<const N: usize>(registry: &PortRegistry<N>) -> Expiries<N> {
    let mut expired = Vec::new();

    for index in 0..registry.capacity() {
        match registry.tick_port(index) {
            Ok(Some(t)) if t.changed() => {
                // At most one entry per port, so the vector cannot overflow.
                let _ = expired.push(t);
            }
            Ok(_) => {}
            Err(e) => error!("tick sweep: {}", e),
        }
    }

    if !expired.is_empty() {
        debug!("tick sweep: {} port(s) expired", expired.len());
    }
    expired
}
